//! UseCase 層
//!
//! 外部トランスポートが呼び出す調整コアの操作を、1 操作 1 ユースケースで
//! 提供します。各ユースケースは Repository / Registry / 葉コンポーネントを
//! `Arc<dyn Trait>` で注入され、プロセス起動時に明示的に構築されます
//! （テストでは分離されたインスタンスを構築できる）。

pub mod disconnect_cleanup;
pub mod error;
pub mod issue_token;
pub mod join_room;
pub mod leave_room;
pub mod load_history;
pub mod relay_signal;
pub mod send_message;
pub mod update_media;

pub use disconnect_cleanup::{DisconnectCleanupUseCase, RoomDeparture};
pub use error::{IssueTokenError, JoinRoomError, LoadHistoryError, SendMessageError};
pub use issue_token::{IssueRoomTokenUseCase, TOKENS_PER_DAY, TOKENS_PER_MINUTE};
pub use join_room::{JoinRoomUseCase, JoinedRoom};
pub use leave_room::LeaveRoomUseCase;
pub use load_history::{HistoryMessage, LoadHistoryUseCase};
pub use relay_signal::RelaySignalUseCase;
pub use send_message::{MESSAGES_PER_WINDOW, MESSAGE_WINDOW, OutboundMessage, SendMessageUseCase};
pub use update_media::UpdateMediaStateUseCase;

//! ドメイン層
//!
//! ルーム調整コアのドメインモデル（値オブジェクト・エンティティ）と、
//! ドメイン層が必要とするインターフェース（Repository / Pusher trait）を
//! 定義します。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod error;
pub mod id;
pub mod message;
pub mod participant;
pub mod presence;
pub mod pusher;
pub mod repository;
pub mod room;
pub mod signaling;

pub use error::DomainError;
pub use id::{ConnectionId, RoomId, UserId};
pub use message::{MessageContent, StoredMessage, Timestamp, MAX_MESSAGE_CHARS};
pub use participant::{DisplayName, MediaState, Participant, Role};
pub use presence::{JoinOutcome, PresenceRegistry};
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use repository::{DirectoryError, MessageStore, RoomDirectory, StoreError};
#[cfg(test)]
pub use repository::{MockMessageStore, MockRoomDirectory};
pub use room::{RoomKind, RoomMeta};
pub use signaling::{RelayOutcome, RelayRejection, SignalEnvelope, SignalKind, SignalingRelay};

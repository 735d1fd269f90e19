//! Shared application state.

use std::sync::Arc;

use crate::domain::{MessagePusher, PresenceRegistry};
use crate::usecase::{
    DisconnectCleanupUseCase, IssueRoomTokenUseCase, JoinRoomUseCase, LeaveRoomUseCase,
    LoadHistoryUseCase, RelaySignalUseCase, SendMessageUseCase, UpdateMediaStateUseCase,
};

/// Shared application state, injected into every handler.
pub struct AppState {
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub load_history_usecase: Arc<LoadHistoryUseCase>,
    pub disconnect_cleanup_usecase: Arc<DisconnectCleanupUseCase>,
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    pub update_media_usecase: Arc<UpdateMediaStateUseCase>,
    pub issue_token_usecase: Arc<IssueRoomTokenUseCase>,
    pub message_pusher: Arc<dyn MessagePusher>,
    pub presence: Arc<dyn PresenceRegistry>,
}

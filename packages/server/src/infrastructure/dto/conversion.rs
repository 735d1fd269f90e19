//! Conversion logic between domain / usecase types and wire DTOs.

use crate::domain::Participant;
use crate::infrastructure::dto::websocket as dto;
use crate::usecase::{HistoryMessage, OutboundMessage};

/// Shown in place of a stored message that can no longer be decrypted.
pub const UNAVAILABLE_PLACEHOLDER: &str = "[message unavailable]";

// ========================================
// Domain Model → DTO
// ========================================

impl From<&Participant> for dto::ParticipantInfo {
    fn from(participant: &Participant) -> Self {
        Self {
            connection_id: participant.connection_id.as_str().to_string(),
            user_id: participant.user_id.as_str().to_string(),
            display_name: participant.display_name.as_str().to_string(),
            role: participant.role.as_str().to_string(),
            audio_enabled: participant.media_state.audio_enabled,
            video_enabled: participant.media_state.video_enabled,
            connected_at: participant.connected_at.value(),
        }
    }
}

impl From<OutboundMessage> for dto::ChatMessage {
    fn from(outbound: OutboundMessage) -> Self {
        Self {
            r#type: dto::MessageType::Chat,
            message_id: outbound.message_id,
            user_id: outbound.user_id.as_str().to_string(),
            content: outbound.content,
            timestamp: outbound.sent_at.value(),
        }
    }
}

impl From<HistoryMessage> for dto::HistoryEntry {
    /// 復号に失敗した 1 件はプレースホルダへ退避する（履歴全体は落とさない）。
    fn from(message: HistoryMessage) -> Self {
        Self {
            message_id: message.message_id,
            user_id: message.user_id.as_str().to_string(),
            content: message
                .content
                .unwrap_or_else(|_| UNAVAILABLE_PLACEHOLDER.to_string()),
            timestamp: message.sent_at.value(),
        }
    }
}

//! WebSocket frame DTOs.
//!
//! Inbound frames (client → server) are parsed as a single tagged enum so
//! unknown frame types fail at the parse step. Outbound frames
//! (server → client) are individual structs carrying an explicit `type`
//! discriminator.

use serde::{Deserialize, Serialize};

use crate::domain::SignalKind;

/// Outbound frame type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    RoomJoined,
    ParticipantJoined,
    ParticipantLeft,
    Chat,
    History,
    Signal,
    SignalRejected,
    MediaState,
    Error,
}

/// Inbound frame (client → server).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Send a chat message to the room.
    Chat { content: String },
    /// Request recent message history.
    History { count: Option<usize> },
    /// Leave the room explicitly (the socket may stay open).
    Leave,
    /// Relay a signaling payload to a peer connection (call rooms only).
    Signal {
        to: String,
        kind: SignalKind,
        payload: serde_json::Value,
    },
    /// Update own media state (call rooms only).
    MediaState {
        audio_enabled: bool,
        video_enabled: bool,
    },
}

/// Participant info as exposed over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub connection_id: String,
    pub user_id: String,
    pub display_name: String,
    pub role: String,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub connected_at: i64,
}

/// Sent to a client right after a successful join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomJoinedMessage {
    pub r#type: MessageType,
    pub connection_id: String,
    pub participants: Vec<ParticipantInfo>,
    pub recording_in_progress: bool,
}

/// Broadcast to existing members when someone joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantJoinedMessage {
    pub r#type: MessageType,
    pub participant: ParticipantInfo,
}

/// Broadcast to remaining members when someone leaves or disconnects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantLeftMessage {
    pub r#type: MessageType,
    pub connection_id: String,
    pub user_id: String,
    pub left_at: i64,
}

/// A chat message delivered to room members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub message_id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: i64,
}

/// One entry of the message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub message_id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: i64,
}

/// Response to a history request, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub r#type: MessageType,
    pub messages: Vec<HistoryEntry>,
}

/// A signaling payload delivered to the target peer only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    pub r#type: MessageType,
    pub from: String,
    pub kind: SignalKind,
    pub payload: serde_json::Value,
}

/// Sent back to the sender when an offer / answer relay is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRejectedMessage {
    pub r#type: MessageType,
    pub to: String,
    pub kind: SignalKind,
    pub reason: String,
}

/// Broadcast when a participant toggles audio / video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaStateMessage {
    pub r#type: MessageType,
    pub connection_id: String,
    pub user_id: String,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

/// Generic error frame sent to the offending client only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub code: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

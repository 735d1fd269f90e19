//! WebSocket connection handlers.
//!
//! Both room kinds share the same join / chat / history / leave flow.
//! Signaling and media-state frames are only honored on the call endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, DisplayName, MediaState, RelayOutcome, RoomId, RoomKind, SignalEnvelope,
        UserId,
    },
    infrastructure::dto::websocket::{
        ChatMessage, ClientFrame, ErrorMessage, HistoryMessage, MediaStateMessage, MessageType,
        ParticipantInfo, ParticipantJoinedMessage, ParticipantLeftMessage, RoomJoinedMessage,
        SignalMessage, SignalRejectedMessage,
    },
    ui::state::AppState,
    usecase::{JoinRoomError, LoadHistoryError, SendMessageError},
};
use hiroba_shared::time::get_utc_timestamp;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
}

pub async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    websocket_handler(ws, state, room_id, query, RoomKind::Chat).await
}

pub async fn call_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    websocket_handler(ws, state, room_id, query, RoomKind::Call).await
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    state: Arc<AppState>,
    room_id_raw: String,
    query: ConnectQuery,
    kind: RoomKind,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Models
    let room_id = RoomId::try_from(room_id_raw).map_err(|_| StatusCode::BAD_REQUEST)?;
    let user_id = UserId::try_from(query.user_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let display_name =
        DisplayName::new(query.display_name).map_err(|_| StatusCode::BAD_REQUEST)?;

    let connection_id = ConnectionId::generate();

    // Join before upgrading, so rejections surface as HTTP status codes
    let joined = match state
        .join_room_usecase
        .execute(
            &query.token,
            &room_id,
            connection_id.clone(),
            &user_id,
            display_name,
        )
        .await
    {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!("Join rejected for room '{}': {}", room_id.as_str(), e);
            return Err(match e {
                JoinRoomError::InvalidToken
                | JoinRoomError::NotTokenSubject
                | JoinRoomError::TokenRoomMismatch => StatusCode::UNAUTHORIZED,
                JoinRoomError::RoomNotFound => StatusCode::NOT_FOUND,
                JoinRoomError::RoomClosed => StatusCode::FORBIDDEN,
                JoinRoomError::RoomFull => StatusCode::SERVICE_UNAVAILABLE,
                JoinRoomError::AlreadyInAnotherRoom => StatusCode::CONFLICT,
                JoinRoomError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
    };

    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_connection(connection_id.clone(), tx)
        .await;

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state, room_id, connection_id, user_id, joined, rx, kind)
    }))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        use futures_util::sink::SinkExt;
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    connection_id: ConnectionId,
    user_id: UserId,
    joined: crate::usecase::JoinedRoom,
    rx: mpsc::UnboundedReceiver<String>,
    kind: RoomKind,
) {
    let (sender, mut receiver) = socket.split();

    // Send the room snapshot to the newly joined connection
    {
        let room_msg = RoomJoinedMessage {
            r#type: MessageType::RoomJoined,
            connection_id: connection_id.as_str().to_string(),
            participants: joined.others.iter().map(ParticipantInfo::from).collect(),
            recording_in_progress: joined.recording_in_progress,
        };
        let room_json = serde_json::to_string(&room_msg).unwrap();
        if let Err(e) = state.message_pusher.push_to(&connection_id, &room_json).await {
            tracing::error!("Failed to send room snapshot: {}", e);
        }
    }

    // Broadcast participant-joined to the existing members
    {
        let joined_msg = ParticipantJoinedMessage {
            r#type: MessageType::ParticipantJoined,
            participant: ParticipantInfo::from(&joined.participant),
        };
        let joined_json = serde_json::to_string(&joined_msg).unwrap();
        let targets: Vec<ConnectionId> = state
            .presence
            .connections(&room_id)
            .into_iter()
            .filter(|c| c != &connection_id)
            .collect();
        if !targets.is_empty() {
            if let Err(e) = state.message_pusher.broadcast(targets, &joined_json).await {
                tracing::warn!("Failed to broadcast participant-joined: {}", e);
            }
        }
    }

    // Receive frames from this connection until it leaves or disconnects
    let recv_state = state.clone();
    let recv_room_id = room_id.clone();
    let recv_connection_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::debug!("Unparseable frame: {}", e);
                            send_error(
                                &recv_state,
                                &recv_connection_id,
                                "bad_frame",
                                "frame could not be parsed",
                                None,
                            )
                            .await;
                            continue;
                        }
                    };
                    let keep_going = handle_frame(
                        &recv_state,
                        &recv_room_id,
                        &recv_connection_id,
                        &user_id,
                        kind,
                        frame,
                    )
                    .await;
                    if !keep_going {
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::debug!("Connection '{}' requested close", recv_connection_id);
                    break;
                }
                // Ping / pong is handled by the protocol layer
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Cleanup runs exactly once per connection, for every exit path
    state.message_pusher.unregister_connection(&connection_id).await;
    let departures = state.disconnect_cleanup_usecase.execute(&connection_id);
    for departure in departures {
        broadcast_participant_left(&state, &departure.room_id, &departure.participant).await;
    }
}

/// Handles one parsed inbound frame. Returns `false` when the connection
/// should stop reading (explicit leave).
async fn handle_frame(
    state: &Arc<AppState>,
    room_id: &RoomId,
    connection_id: &ConnectionId,
    user_id: &UserId,
    kind: RoomKind,
    frame: ClientFrame,
) -> bool {
    match frame {
        ClientFrame::Chat { content } => {
            match state
                .send_message_usecase
                .execute(room_id, connection_id, user_id, content)
                .await
            {
                Ok(outbound) => {
                    let chat = ChatMessage::from(outbound);
                    let chat_json = serde_json::to_string(&chat).unwrap();
                    let targets = state.presence.connections(room_id);
                    if let Err(e) = state.message_pusher.broadcast(targets, &chat_json).await {
                        tracing::warn!("Failed to broadcast chat message: {}", e);
                    }
                }
                Err(SendMessageError::RateLimited { retry_after }) => {
                    send_error(
                        state,
                        connection_id,
                        "rate_limited",
                        "message rate limit exceeded",
                        Some(retry_after.as_secs()),
                    )
                    .await;
                }
                Err(SendMessageError::Validation(e)) => {
                    send_error(state, connection_id, "validation_failed", &e.to_string(), None)
                        .await;
                }
                Err(SendMessageError::NotMember) => {
                    send_error(state, connection_id, "forbidden", "not a room member", None).await;
                }
                Err(e) => {
                    tracing::error!("Failed to send message: {}", e);
                    send_error(state, connection_id, "internal", "message delivery failed", None)
                        .await;
                }
            }
            true
        }
        ClientFrame::History { count } => {
            match state
                .load_history_usecase
                .execute(room_id, user_id, count.unwrap_or(50))
                .await
            {
                Ok(history) => {
                    let msg = HistoryMessage {
                        r#type: MessageType::History,
                        messages: history.into_iter().map(Into::into).collect(),
                    };
                    let json = serde_json::to_string(&msg).unwrap();
                    if let Err(e) = state.message_pusher.push_to(connection_id, &json).await {
                        tracing::warn!("Failed to send history: {}", e);
                    }
                }
                Err(LoadHistoryError::NotRegistered) => {
                    send_error(state, connection_id, "forbidden", "not registered for room", None)
                        .await;
                }
                Err(e) => {
                    tracing::error!("Failed to load history: {}", e);
                    send_error(state, connection_id, "internal", "history unavailable", None).await;
                }
            }
            true
        }
        ClientFrame::Leave => {
            if let Some(participant) = state.leave_room_usecase.execute(room_id, connection_id) {
                broadcast_participant_left(state, room_id, &participant).await;
            }
            false
        }
        ClientFrame::Signal { to, kind: signal_kind, payload } => {
            if kind != RoomKind::Call {
                send_error(state, connection_id, "unsupported", "signaling requires a call room", None)
                    .await;
                return true;
            }
            let Ok(to) = ConnectionId::new(to) else {
                send_error(state, connection_id, "bad_frame", "invalid target connection", None)
                    .await;
                return true;
            };
            let envelope = SignalEnvelope {
                from: connection_id.clone(),
                to: to.clone(),
                kind: signal_kind,
                payload,
            };
            match state.relay_signal_usecase.execute(connection_id, envelope) {
                RelayOutcome::Delivered(delivered) => {
                    let msg = SignalMessage {
                        r#type: MessageType::Signal,
                        from: delivered.from.as_str().to_string(),
                        kind: delivered.kind,
                        payload: delivered.payload,
                    };
                    let json = serde_json::to_string(&msg).unwrap();
                    // Delivered to the target peer only, never broadcast
                    if let Err(e) = state.message_pusher.push_to(&delivered.to, &json).await {
                        tracing::warn!("Failed to deliver signal: {}", e);
                    }
                }
                RelayOutcome::Rejected(reason) => {
                    let msg = SignalRejectedMessage {
                        r#type: MessageType::SignalRejected,
                        to: to.as_str().to_string(),
                        kind: signal_kind,
                        reason: reason.as_str().to_string(),
                    };
                    let json = serde_json::to_string(&msg).unwrap();
                    if let Err(e) = state.message_pusher.push_to(connection_id, &json).await {
                        tracing::warn!("Failed to notify signal rejection: {}", e);
                    }
                }
                RelayOutcome::Dropped => {}
            }
            true
        }
        ClientFrame::MediaState {
            audio_enabled,
            video_enabled,
        } => {
            if kind != RoomKind::Call {
                send_error(state, connection_id, "unsupported", "media state requires a call room", None)
                    .await;
                return true;
            }
            let media_state = MediaState {
                audio_enabled,
                video_enabled,
            };
            if let Some(updated) =
                state
                    .update_media_usecase
                    .execute(room_id, connection_id, media_state)
            {
                let msg = MediaStateMessage {
                    r#type: MessageType::MediaState,
                    connection_id: updated.connection_id.as_str().to_string(),
                    user_id: updated.user_id.as_str().to_string(),
                    audio_enabled: updated.media_state.audio_enabled,
                    video_enabled: updated.media_state.video_enabled,
                };
                let json = serde_json::to_string(&msg).unwrap();
                let targets = state.presence.connections(room_id);
                if let Err(e) = state.message_pusher.broadcast(targets, &json).await {
                    tracing::warn!("Failed to broadcast media state: {}", e);
                }
            }
            true
        }
    }
}

async fn broadcast_participant_left(
    state: &Arc<AppState>,
    room_id: &RoomId,
    participant: &crate::domain::Participant,
) {
    let msg = ParticipantLeftMessage {
        r#type: MessageType::ParticipantLeft,
        connection_id: participant.connection_id.as_str().to_string(),
        user_id: participant.user_id.as_str().to_string(),
        left_at: get_utc_timestamp(),
    };
    let json = serde_json::to_string(&msg).unwrap();
    let targets = state.presence.connections(room_id);
    if targets.is_empty() {
        return;
    }
    if let Err(e) = state.message_pusher.broadcast(targets, &json).await {
        tracing::warn!("Failed to broadcast participant-left: {}", e);
    }
}

async fn send_error(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    code: &str,
    reason: &str,
    retry_after_seconds: Option<u64>,
) {
    let msg = ErrorMessage {
        r#type: MessageType::Error,
        code: code.to_string(),
        reason: reason.to_string(),
        retry_after_seconds,
    };
    let json = serde_json::to_string(&msg).unwrap();
    if let Err(e) = state.message_pusher.push_to(connection_id, &json).await {
        tracing::debug!("Failed to send error frame: {}", e);
    }
}

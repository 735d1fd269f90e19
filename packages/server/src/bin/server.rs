//! Real-time room coordination server: presence, chat, and call signaling.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! ```
//!
//! Secrets are taken from `HIROBA_MASTER_SECRET` (room message encryption)
//! and `HIROBA_TOKEN_SECRET` (room access token signing). Development
//! fallbacks are used when unset.

use std::sync::Arc;

use clap::Parser;

use hiroba_server::{
    domain::{
        MessagePusher, PresenceRegistry, RoomId, RoomKind, RoomMeta, SignalingRelay, UserId,
    },
    infrastructure::{
        crypto::RoomCipher,
        flood::{FloodGuard, QuotaGuard},
        message_pusher::WebSocketMessagePusher,
        presence::InMemoryPresenceRegistry,
        repository::{InMemoryMessageStore, InMemoryRoomDirectory},
        token::RoomTokenService,
    },
    ui::{AppState, Server},
    usecase::{
        DisconnectCleanupUseCase, IssueRoomTokenUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        LoadHistoryUseCase, RelaySignalUseCase, SendMessageUseCase, UpdateMediaStateUseCase,
    },
};
use hiroba_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Room coordination server: presence, chat, call signaling", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

fn secret_from_env(var: &str, dev_fallback: &str) -> Vec<u8> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => value.into_bytes(),
        _ => {
            tracing::warn!("{} is not set, using a development fallback", var);
            dev_fallback.as_bytes().to_vec()
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let master_secret = secret_from_env("HIROBA_MASTER_SECRET", "hiroba-dev-master-secret");
    let token_secret = secret_from_env("HIROBA_TOKEN_SECRET", "hiroba-dev-token-secret");

    // Initialize dependencies in order:
    // 1. Clock / leaf components
    // 2. Registry, Repository, MessagePusher
    // 3. UseCases
    // 4. AppState
    // 5. Server

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cipher = Arc::new(RoomCipher::new(master_secret));
    let tokens = Arc::new(RoomTokenService::new(&token_secret, clock.clone()));
    let flood = Arc::new(FloodGuard::new(clock.clone()));
    let quota = Arc::new(QuotaGuard::new(clock.clone()));

    let presence: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
    let directory = Arc::new(InMemoryRoomDirectory::new(clock.clone()));
    let store = Arc::new(InMemoryMessageStore::new(clock.clone()));
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
    let relay = Arc::new(SignalingRelay::new(presence.clone()));

    seed_demo_rooms(&directory).await;

    let app_state = Arc::new(AppState {
        join_room_usecase: Arc::new(JoinRoomUseCase::new(
            presence.clone(),
            directory.clone(),
            tokens.clone(),
            clock.clone(),
        )),
        leave_room_usecase: Arc::new(LeaveRoomUseCase::new(presence.clone())),
        send_message_usecase: Arc::new(SendMessageUseCase::new(
            presence.clone(),
            directory.clone(),
            store.clone(),
            flood.clone(),
            cipher.clone(),
        )),
        load_history_usecase: Arc::new(LoadHistoryUseCase::new(
            directory.clone(),
            store.clone(),
            cipher.clone(),
        )),
        disconnect_cleanup_usecase: Arc::new(DisconnectCleanupUseCase::new(
            presence.clone(),
            flood.clone(),
        )),
        relay_signal_usecase: Arc::new(RelaySignalUseCase::new(relay)),
        update_media_usecase: Arc::new(UpdateMediaStateUseCase::new(presence.clone())),
        issue_token_usecase: Arc::new(IssueRoomTokenUseCase::new(
            directory.clone(),
            tokens,
            quota,
        )),
        message_pusher,
        presence,
    });

    let server = Server::new(app_state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Seeds rooms and a participant roster for local development. A deployed
/// instance would populate the directory from the platform database instead.
async fn seed_demo_rooms(directory: &InMemoryRoomDirectory) {
    let chat_room = RoomId::new("demo-chat".to_string()).expect("static room id");
    let call_room = RoomId::new("demo-call".to_string()).expect("static room id");

    directory
        .insert_room(RoomMeta {
            id: chat_room.clone(),
            kind: RoomKind::Chat,
            is_active: true,
            max_participants: 50,
            encryption_enabled: true,
            recording_in_progress: false,
        })
        .await;
    directory
        .insert_room(RoomMeta {
            id: call_room.clone(),
            kind: RoomKind::Call,
            is_active: true,
            max_participants: 10,
            encryption_enabled: false,
            recording_in_progress: false,
        })
        .await;

    for name in ["teacher", "alice", "bob"] {
        let user_id = UserId::new(name.to_string()).expect("static user id");
        directory
            .register_participant(&chat_room, user_id.clone())
            .await;
        directory.register_participant(&call_room, user_id).await;
    }

    tracing::info!("Seeded demo rooms 'demo-chat' and 'demo-call'");
}

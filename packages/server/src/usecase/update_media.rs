//! UseCase: メディア状態更新処理
//!
//! 通話ルームの参加者がマイク・カメラの ON/OFF を切り替えたときに
//! Registry 上の状態を更新する。更新後の参加者をもとに、トランスポート層が
//! 在室者へ状態変更を通知する。

use std::sync::Arc;

use tracing::debug;

use crate::domain::{ConnectionId, MediaState, Participant, PresenceRegistry, RoomId};

/// メディア状態更新のユースケース
pub struct UpdateMediaStateUseCase {
    /// Presence Registry(在室台帳の抽象化)
    presence: Arc<dyn PresenceRegistry>,
}

impl UpdateMediaStateUseCase {
    /// 新しい UpdateMediaStateUseCase を作成
    pub fn new(presence: Arc<dyn PresenceRegistry>) -> Self {
        Self { presence }
    }

    /// メディア状態更新を実行
    ///
    /// 在室していないコネクションに対しては `None` を返す（no-op）。
    pub fn execute(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        media_state: MediaState,
    ) -> Option<Participant> {
        let updated = self
            .presence
            .update_media_state(room_id, connection_id, media_state);
        if let Some(participant) = &updated {
            debug!(
                room_id = room_id.as_str(),
                user_id = participant.user_id.as_str(),
                audio = media_state.audio_enabled,
                video = media_state.video_enabled,
                "media state updated"
            );
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Role, Timestamp, UserId};
    use crate::infrastructure::presence::InMemoryPresenceRegistry;

    #[test]
    fn test_update_media_state_for_member() {
        // テスト項目: 在室中の参加者のメディア状態が更新される
        // given (前提条件): alice がデフォルト状態（マイク ON・カメラ OFF）で在室
        let room_id = RoomId::new("call-1".to_string()).unwrap();
        let presence: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
        let usecase = UpdateMediaStateUseCase::new(presence.clone());
        let connection_id = ConnectionId::generate();
        presence.join(
            &room_id,
            Participant::new(
                connection_id.clone(),
                UserId::new("alice".to_string()).unwrap(),
                DisplayName::new("Alice".to_string()).unwrap(),
                Role::Student,
                Timestamp::new(0),
            ),
            10,
        );

        // when (操作): カメラを ON にする
        let updated = usecase.execute(
            &room_id,
            &connection_id,
            MediaState {
                audio_enabled: true,
                video_enabled: true,
            },
        );

        // then (期待する結果): Registry 上の状態も更新されている
        assert!(updated.unwrap().media_state.video_enabled);
        let listed = presence.list_participants(&room_id);
        assert!(listed[0].media_state.video_enabled);
    }

    #[test]
    fn test_update_media_state_for_non_member_is_noop() {
        // テスト項目: 在室していないコネクションの更新は None を返す
        // given (前提条件):
        let room_id = RoomId::new("call-1".to_string()).unwrap();
        let presence: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
        let usecase = UpdateMediaStateUseCase::new(presence);

        // when (操作):
        let updated = usecase.execute(&room_id, &ConnectionId::generate(), MediaState::default());

        // then (期待する結果):
        assert_eq!(updated, None);
    }
}

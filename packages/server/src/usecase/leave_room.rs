//! UseCase: 退室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - 明示的な退室（leave フレーム受信時）の Registry 更新
//!
//! ### なぜこのテストが必要か
//! - 退室した参加者が即座に在室者リストから消えることを確認する
//! - 未知のコネクションの退室が安全な no-op であることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：在室中の参加者の退室
//! - エッジケース：未入室・退室済みコネクションの退室要求

use std::sync::Arc;

use tracing::info;

use crate::domain::{ConnectionId, Participant, PresenceRegistry, RoomId};

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    /// Presence Registry(在室台帳の抽象化)
    presence: Arc<dyn PresenceRegistry>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(presence: Arc<dyn PresenceRegistry>) -> Self {
        Self { presence }
    }

    /// 退室を実行
    ///
    /// 未知のコネクションに対しては `None` を返す（冪等）。
    /// 退室通知のブロードキャストはトランスポート層が行う。
    pub fn execute(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Participant> {
        let left = self.presence.leave(room_id, connection_id);
        if let Some(participant) = &left {
            info!(
                room_id = room_id.as_str(),
                user_id = participant.user_id.as_str(),
                "participant left room"
            );
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Role, Timestamp, UserId};
    use crate::infrastructure::presence::InMemoryPresenceRegistry;

    fn participant(connection_id: ConnectionId, user: &str) -> Participant {
        Participant::new(
            connection_id,
            UserId::new(user.to_string()).unwrap(),
            DisplayName::new(user.to_string()).unwrap(),
            Role::Student,
            Timestamp::new(0),
        )
    }

    #[test]
    fn test_leave_room_removes_participant() {
        // テスト項目: 退室した参加者が在室者リストから消える
        // given (前提条件): alice が在室
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let presence: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
        let usecase = LeaveRoomUseCase::new(presence.clone());
        let connection_id = ConnectionId::generate();
        presence.join(&room_id, participant(connection_id.clone(), "alice"), 10);

        // when (操作):
        let left = usecase.execute(&room_id, &connection_id);

        // then (期待する結果):
        assert_eq!(left.unwrap().user_id.as_str(), "alice");
        assert!(presence.list_participants(&room_id).is_empty());
    }

    #[test]
    fn test_leave_room_unknown_connection_is_noop() {
        // テスト項目: 未知のコネクションの退室は None を返す
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let presence: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
        let usecase = LeaveRoomUseCase::new(presence);

        // when (操作):
        let left = usecase.execute(&room_id, &ConnectionId::generate());

        // then (期待する結果):
        assert_eq!(left, None);
    }
}

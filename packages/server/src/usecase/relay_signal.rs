//! UseCase: シグナリング中継処理
//!
//! メンバーシップの検査はドメインサービス [`SignalingRelay`] が行う。
//! このユースケースは `from` をサーバー側で確定させる（クライアントの
//! 申告を信用しない）薄いラッパー。

use std::sync::Arc;

use crate::domain::{ConnectionId, RelayOutcome, SignalEnvelope, SignalingRelay};

/// シグナリング中継のユースケース
pub struct RelaySignalUseCase {
    relay: Arc<SignalingRelay>,
}

impl RelaySignalUseCase {
    /// 新しい RelaySignalUseCase を作成
    pub fn new(relay: Arc<SignalingRelay>) -> Self {
        Self { relay }
    }

    /// 中継を実行
    ///
    /// `sender` はトランスポート層が管理するコネクション識別子。
    /// エンベロープの `from` はこの値で上書きされる。
    pub fn execute(&self, sender: &ConnectionId, mut envelope: SignalEnvelope) -> RelayOutcome {
        envelope.from = sender.clone();
        self.relay.relay(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DisplayName, Participant, PresenceRegistry, Role, RoomId, SignalKind, Timestamp, UserId,
    };
    use crate::infrastructure::presence::InMemoryPresenceRegistry;

    fn participant(conn: &str, user: &str) -> Participant {
        Participant::new(
            ConnectionId::new(conn.to_string()).unwrap(),
            UserId::new(user.to_string()).unwrap(),
            DisplayName::new(user.to_string()).unwrap(),
            Role::Student,
            Timestamp::new(0),
        )
    }

    #[test]
    fn test_relay_signal_overwrites_claimed_sender() {
        // テスト項目: エンベロープの from 申告はサーバー側の値で上書きされる
        // given (前提条件): conn-a と conn-b が同一ルームに在室
        let room_id = RoomId::new("call-1".to_string()).unwrap();
        let registry: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
        registry.join(&room_id, participant("conn-a", "alice"), 10);
        registry.join(&room_id, participant("conn-b", "bob"), 10);
        let usecase = RelaySignalUseCase::new(Arc::new(SignalingRelay::new(registry)));

        // when (操作): conn-a が from を偽装した offer を送る
        let envelope = SignalEnvelope {
            from: ConnectionId::new("conn-forged".to_string()).unwrap(),
            to: ConnectionId::new("conn-b".to_string()).unwrap(),
            kind: SignalKind::Offer,
            payload: serde_json::json!({"sdp": "v=0"}),
        };
        let sender = ConnectionId::new("conn-a".to_string()).unwrap();
        let outcome = usecase.execute(&sender, envelope);

        // then (期待する結果): 配送されるエンベロープの from は conn-a
        match outcome {
            RelayOutcome::Delivered(delivered) => assert_eq!(delivered.from, sender),
            other => panic!("expected Delivered, got {other:?}"),
        }
    }
}

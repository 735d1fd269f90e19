//! シグナリング中継（ドメインサービス）
//!
//! 通話ルーム内の 2 コネクション間で交わされるハンドシェイク
//! （offer / answer / ICE candidate）を中継します。転送前に
//! PresenceRegistry で両端のメンバーシップを照会し、
//! どちらかが不在・別ルームの場合は中継を拒否します。
//!
//! - offer / answer: 拒否を送信者へ明示的に返す
//! - ICE candidate: ベストエフォートかつ大量に流れるため、静かに破棄する
//!
//! 成功時はエンベロープを無変更で返し、トランスポートが宛先コネクション
//! 「のみ」へ配送します（ブロードキャストは行わない）。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id::ConnectionId;
use super::presence::PresenceRegistry;

/// シグナリングメッセージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// シグナリングエンベロープ（一時的・永続化しない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    /// 送信元コネクション
    pub from: ConnectionId,
    /// 宛先コネクション
    pub to: ConnectionId,
    /// 種別
    pub kind: SignalKind,
    /// SDP や ICE candidate などのペイロード（コアは中身に関知しない）
    pub payload: serde_json::Value,
}

/// 中継拒否の理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRejection {
    /// 送信元がどのルームにも参加していない
    SenderNotInRoom,
    /// 宛先が接続していない、またはどのルームにも参加していない
    PeerNotConnected,
    /// 送信元と宛先が別々のルームに居る
    CrossRoom,
}

impl RelayRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayRejection::SenderNotInRoom => "sender_not_in_room",
            RelayRejection::PeerNotConnected => "peer_not_connected",
            RelayRejection::CrossRoom => "cross_room",
        }
    }
}

/// 中継の結果
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// 中継可。エンベロープを無変更で宛先へ配送する
    Delivered(SignalEnvelope),
    /// 中継拒否（offer / answer）。送信者へエラーを返す
    Rejected(RelayRejection),
    /// 静かに破棄（ICE candidate）
    Dropped,
}

/// シグナリング中継サービス
pub struct SignalingRelay {
    presence: Arc<dyn PresenceRegistry>,
}

impl SignalingRelay {
    /// 新しい SignalingRelay を作成
    pub fn new(presence: Arc<dyn PresenceRegistry>) -> Self {
        Self { presence }
    }

    /// エンベロープを検査し、中継の可否を判定する
    pub fn relay(&self, envelope: SignalEnvelope) -> RelayOutcome {
        let from_room = self.presence.room_of(&envelope.from);
        let to_room = self.presence.room_of(&envelope.to);

        let rejection = match (&from_room, &to_room) {
            (None, _) => Some(RelayRejection::SenderNotInRoom),
            (Some(_), None) => Some(RelayRejection::PeerNotConnected),
            (Some(a), Some(b)) if a != b => Some(RelayRejection::CrossRoom),
            _ => None,
        };

        match rejection {
            None => RelayOutcome::Delivered(envelope),
            Some(reason) => {
                if envelope.kind == SignalKind::IceCandidate {
                    debug!(
                        from = %envelope.from,
                        to = %envelope.to,
                        ?reason,
                        "dropping ICE candidate"
                    );
                    RelayOutcome::Dropped
                } else {
                    debug!(
                        from = %envelope.from,
                        to = %envelope.to,
                        kind = ?envelope.kind,
                        ?reason,
                        "rejecting signal relay"
                    );
                    RelayOutcome::Rejected(reason)
                }
            }
        }
    }
}

//! UseCase: 切断時の後始末処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectCleanupUseCase::execute() メソッド
//! - コネクション消滅時の Registry 除去とフラッドガード状態の破棄
//!
//! ### なぜこのテストが必要か
//! - WebSocket の切断経路（正常クローズ・異常切断）がどちらもこの 1 箇所に
//!   合流するため、冪等性が壊れると退室通知が重複する
//! - ユーザーのフラッドガード状態が残り続けるとメモリが無制限に成長する
//!
//! ### どのような状況を想定しているか
//! - 正常系：在室中のコネクションの切断
//! - エッジケース：二重切断（2 回目は空の結果）、未入室コネクションの切断

use std::sync::Arc;

use tracing::info;

use crate::domain::{ConnectionId, Participant, PresenceRegistry, RoomId};
use crate::infrastructure::flood::FloodGuard;

/// 切断後始末で判明した退室
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDeparture {
    pub room_id: RoomId,
    pub participant: Participant,
}

/// 切断時後始末のユースケース
pub struct DisconnectCleanupUseCase {
    /// Presence Registry(在室台帳の抽象化)
    presence: Arc<dyn PresenceRegistry>,
    flood: Arc<FloodGuard>,
}

impl DisconnectCleanupUseCase {
    /// 新しい DisconnectCleanupUseCase を作成
    pub fn new(presence: Arc<dyn PresenceRegistry>, flood: Arc<FloodGuard>) -> Self {
        Self { presence, flood }
    }

    /// 後始末を実行
    ///
    /// 冪等であり、同じコネクションに対する 2 回目の呼び出しは空を返す。
    /// 退室通知のブロードキャストは戻り値をもとにトランスポート層が行う。
    pub fn execute(&self, connection_id: &ConnectionId) -> Vec<RoomDeparture> {
        let removed = self.presence.disconnect_cleanup(connection_id);
        let departures: Vec<RoomDeparture> = removed
            .into_iter()
            .map(|(room_id, participant)| RoomDeparture {
                room_id,
                participant,
            })
            .collect();

        for departure in &departures {
            self.flood.clear_for_user(&departure.participant.user_id);
            info!(
                room_id = departure.room_id.as_str(),
                user_id = departure.participant.user_id.as_str(),
                "connection cleaned up"
            );
        }

        departures
    }
}

//! Presence Registry trait 定義
//!
//! 「いまどのコネクションがどのルームに居るか」を管理する
//! インメモリ台帳のインターフェース。具体的な実装（並行安全なコンテナ）は
//! Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 同期に関する契約
//!
//! - 全メソッドは `&self` で並行に呼び出せる（呼び出し側のロック不要）
//! - 入室時の定員チェックは挿入と同一クリティカルセクションで行う
//!   （チェックと挿入の間にレースの窓を作らない）
//! - 逆引きインデックス（コネクション → ルーム）を持ち、切断時の
//!   後始末コストは「そのコネクションが参加していたルーム数」に比例する

use super::id::{ConnectionId, RoomId};
use super::participant::{MediaState, Participant};

/// 入室操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 新規に参加者として登録された
    Joined,
    /// 既に同じルームのメンバーだった（参加者メタデータのみ上書き。
    /// 台帳の重複登録は発生しない）
    Rejoined,
    /// ルームが定員に達している
    RoomFull,
    /// コネクションが別のルームに参加中
    /// （1 コネクションはちょうど 1 ルームにのみ所属できる）
    InAnotherRoom,
}

/// Presence Registry trait
///
/// ルーム → コネクション → 参加者のメンバーシップ表と、
/// コネクション → ルームの逆引きインデックスを管理する。
pub trait PresenceRegistry: Send + Sync {
    /// 参加者を入室させる
    ///
    /// `max_participants` との比較は挿入と同一クリティカルセクションで行う。
    fn join(&self, room_id: &RoomId, participant: Participant, max_participants: usize)
    -> JoinOutcome;

    /// 参加者を退室させる
    ///
    /// 未知のコネクションに対しては `None` を返す（エラーにはしない）。
    fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Participant>;

    /// ルームの参加者リストを取得（表示用・user_id で重複排除）
    fn list_participants(&self, room_id: &RoomId) -> Vec<Participant>;

    /// ルームの全コネクションを取得（配信先の列挙用・重複排除なし）
    fn connections(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// コネクションがルームのメンバーかどうか
    fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// コネクションが参加中のルームを逆引きインデックスから取得
    fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// ルームの接続数（コネクション単位。定員判定はこちらを使う）
    fn member_count(&self, room_id: &RoomId) -> usize;

    /// 参加者のメディア状態を更新し、更新後の参加者を返す
    fn update_media_state(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        media_state: MediaState,
    ) -> Option<Participant>;

    /// コネクションを参加中の全ルームから除去する
    ///
    /// 逆引きインデックスを使うため、コストは参加ルーム数に比例する。
    /// 冪等であり、2 回目の呼び出しは空の結果を返す。
    fn disconnect_cleanup(&self, connection_id: &ConnectionId) -> Vec<(RoomId, Participant)>;
}

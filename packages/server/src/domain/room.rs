//! ルームのメタデータ
//!
//! ルーム本体は外部の永続化層が所有します。調整コアはメタデータを
//! 操作ごとに RoomDirectory 経由で取得し、読み取り専用の参照として扱います。

use super::id::RoomId;

/// ルームの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// チャットルーム
    Chat,
    /// ビデオ通話ルーム
    Call,
}

/// ルームのメタデータ（外部ルックアップの結果）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMeta {
    pub id: RoomId,
    pub kind: RoomKind,
    /// アクティブフラグ（閉室済みルームには入室できない）
    pub is_active: bool,
    /// 最大参加者数
    pub max_participants: usize,
    /// メッセージ暗号化の要否
    pub encryption_enabled: bool,
    /// 録画中フラグ（通話ルームの入室時アドバイザリ）
    pub recording_in_progress: bool,
}

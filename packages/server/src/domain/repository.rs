//! 外部コラボレータの trait 定義
//!
//! 調整コアが消費する外部サービス（ルームメタデータのルックアップ、
//! メッセージ履歴の永続化）へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! これらの呼び出しは await される外部 I/O として扱い、調整コアの
//! 内部ロックを保持したまま実行してはいけません。

use async_trait::async_trait;
use thiserror::Error;

use super::id::{RoomId, UserId};
use super::message::StoredMessage;
use super::room::RoomMeta;

/// RoomDirectory のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// ルックアップ先との通信に失敗
    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

/// ルームメタデータのルックアップと参加記録の照会
///
/// `is_registered_participant` は「現在接続中か」ではなく
/// 「参加者として登録されているか」を永続化層に照会する点に注意。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// ルームのメタデータを取得（存在しなければ `None`）
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomMeta>, DirectoryError>;

    /// ユーザーがルームの登録済み参加者かどうか
    async fn is_registered_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<bool, DirectoryError>;

    /// ルームの最終アクティビティ時刻を更新
    async fn touch_activity(&self, room_id: &RoomId) -> Result<(), DirectoryError>;
}

/// MessageStore のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 永続化に失敗
    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ履歴の永続化シンク
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを保存する
    ///
    /// `content` は暗号化ルームでは暗号文（base64）、それ以外では
    /// サニタイズ済み平文。
    async fn save_message(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        content: &str,
        is_encrypted: bool,
    ) -> Result<StoredMessage, StoreError>;

    /// 直近のメッセージを新しい順で取得する
    async fn load_recent(
        &self,
        room_id: &RoomId,
        count: usize,
    ) -> Result<Vec<StoredMessage>, StoreError>;
}

//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト構築時のバリデーションエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ルーム ID が空
    #[error("room id must not be empty")]
    EmptyRoomId,

    /// ユーザー ID が空
    #[error("user id must not be empty")]
    EmptyUserId,

    /// コネクション ID が空
    #[error("connection id must not be empty")]
    EmptyConnectionId,

    /// 表示名が空
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// 表示名が長すぎる
    #[error("display name exceeds {0} characters")]
    DisplayNameTooLong(usize),

    /// メッセージが空
    #[error("message content must not be empty")]
    EmptyMessage,

    /// メッセージが長すぎる
    #[error("message content exceeds {0} characters")]
    MessageTooLong(usize),
}

//! UseCase 層のエラー型
//!
//! ユースケースごとに専用のエラー enum を定義します。トランスポート層は
//! これらの variant を HTTP ステータスや WebSocket エラーフレームに
//! 変換します（Unauthorized / Forbidden / NotFound / RateLimited /
//! ValidationFailed の区別を潰さないこと）。

use std::time::Duration;

use thiserror::Error;

use crate::domain::{DirectoryError, DomainError, StoreError};
use crate::infrastructure::crypto::CryptoError;

/// 入室時のエラー
#[derive(Debug, Error, PartialEq)]
pub enum JoinRoomError {
    /// トークンが検証できない（署名・期限・iss/aud 不一致を区別しない）
    #[error("room access token is invalid")]
    InvalidToken,
    /// トークンの subject と申告された user_id が一致しない
    #[error("token subject does not match the joining user")]
    NotTokenSubject,
    /// トークンが別のルーム向けに発行されている
    #[error("token was issued for a different room")]
    TokenRoomMismatch,
    #[error("room not found")]
    RoomNotFound,
    #[error("room is closed")]
    RoomClosed,
    #[error("room is full")]
    RoomFull,
    /// 同一コネクションが別ルームに在室中
    #[error("connection already belongs to another room")]
    AlreadyInAnotherRoom,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// メッセージ送信時のエラー
#[derive(Debug, Error, PartialEq)]
pub enum SendMessageError {
    /// 送信者がルームの在室者ではない
    #[error("sender is not a member of the room")]
    NotMember,
    /// レート制限超過。`retry_after` 経過後に再試行できる
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("room not found")]
    RoomNotFound,
    #[error(transparent)]
    Encryption(#[from] CryptoError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// 履歴取得時のエラー
#[derive(Debug, Error, PartialEq)]
pub enum LoadHistoryError {
    /// 要求者がルームの登録参加者ではない
    #[error("requester is not registered for the room")]
    NotRegistered,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// トークン発行時のエラー
#[derive(Debug, Error, PartialEq)]
pub enum IssueTokenError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room is closed")]
    RoomClosed,
    /// ユーザーがルームの登録参加者ではない
    #[error("user is not registered for the room")]
    NotRegistered,
    /// 発行クォータ（毎分・毎日）超過
    #[error("token issuance quota exceeded, retry after {retry_after:?}")]
    QuotaExceeded { retry_after: Option<Duration> },
    /// トークンの署名に失敗
    #[error("failed to sign room access token")]
    Signing,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

//! 参加者の値オブジェクト・エンティティ
//!
//! Participant は「あるコネクションがあるユーザーとしてルームに居る」ことを
//! 表す組（connection_id, user_id, display_name, role, media_state）です。
//! 1 コネクションは参加中のルームにつきちょうど 1 つの Participant を持ちます。

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ConnectionId, UserId};
use super::message::Timestamp;

/// 表示名の最大文字数
const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// 参加者の表示名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// 新しい DisplayName を作成
    pub fn new(value: String) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyDisplayName);
        }
        if trimmed.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(DomainError::DisplayNameTooLong(MAX_DISPLAY_NAME_CHARS));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ルーム内でのロール
///
/// 元システムは学校向けプラットフォームのため、ロールは教師と生徒の 2 種。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// 文字列からロールを解決（トークンのクレームなどから復元する用途）
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

/// メディア状態（通話ルームでのみ意味を持つ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl Default for MediaState {
    /// 入室直後はマイク ON・カメラ OFF
    fn default() -> Self {
        Self {
            audio_enabled: true,
            video_enabled: false,
        }
    }
}

/// ルーム参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// 対応するコネクション
    pub connection_id: ConnectionId,
    /// ユーザー識別子
    pub user_id: UserId,
    /// 表示名
    pub display_name: DisplayName,
    /// ルーム内ロール
    pub role: Role,
    /// メディア状態（通話ルーム用）
    pub media_state: MediaState,
    /// 入室時刻
    pub connected_at: Timestamp,
}

impl Participant {
    /// 新しい Participant を作成（メディア状態はデフォルト）
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        role: Role,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            display_name,
            role,
            media_state: MediaState::default(),
            connected_at,
        }
    }
}

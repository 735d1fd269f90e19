//! メッセージ関連の値オブジェクト
//!
//! メッセージ本文はコンストラクタでバリデーションとサニタイズ
//! （マークアップのエスケープ）を行い、以降の層は安全な値として扱います。

use super::error::DomainError;
use super::id::{RoomId, UserId};

/// メッセージ本文の最大文字数
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Unix タイムスタンプ（UTC・ミリ秒）の値オブジェクト
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 新しい Timestamp を作成
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// メッセージ本文の値オブジェクト
///
/// 構築時に以下を保証します:
/// - 前後の空白を除いて空でない
/// - [`MAX_MESSAGE_CHARS`] 文字以内
/// - HTML マークアップがエスケープ済み
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// 生のメッセージ文字列からバリデーション・サニタイズ済みの本文を作成
    pub fn new(raw: String) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(DomainError::MessageTooLong(MAX_MESSAGE_CHARS));
        }
        Ok(Self(escape_markup(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// HTML マークアップをエスケープする
///
/// `&` を最初に置換しないと後続のエスケープ結果を二重に壊すため、順序に意味がある。
fn escape_markup(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 永続化済みメッセージ
///
/// MessageStore（外部コラボレータ）が返すレコード。
/// `is_encrypted` が true のとき `content` はルーム鍵による暗号文（base64）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// レコード ID
    pub id: String,
    /// 所属ルーム
    pub room_id: RoomId,
    /// 送信者
    pub user_id: UserId,
    /// 本文（平文またはルーム鍵による暗号文）
    pub content: String,
    /// 暗号化済みフラグ
    pub is_encrypted: bool,
    /// 送信時刻
    pub sent_at: Timestamp,
}

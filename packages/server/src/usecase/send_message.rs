//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 在室チェック → フラッドガード → バリデーション → 暗号化 → 永続化の順序
//!
//! ### なぜこのテストが必要か
//! - 非メンバーからの送信を確実に拒否する
//! - レート制限超過時に retry_after 付きで拒否され、保存が発生しないことを保証
//! - 暗号化ルームで「保存は暗号文・戻り値は平文」の分離を確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：平文ルーム・暗号化ルームでの送信
//! - 異常系：非メンバー、レート制限超過、バリデーション失敗
//! - エッジケース：ウィンドウ経過後の送信再開

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{
    ConnectionId, MessageContent, MessageStore, PresenceRegistry, RoomDirectory, RoomId, Timestamp,
    UserId,
};
use crate::infrastructure::crypto::RoomCipher;
use crate::infrastructure::flood::{FloodGuard, FloodKey};

use super::error::SendMessageError;

/// ユーザー × ルームあたりのウィンドウ内メッセージ上限
pub const MESSAGES_PER_WINDOW: usize = 30;
/// メッセージレート制限のウィンドウ幅
pub const MESSAGE_WINDOW: Duration = Duration::from_secs(60);

/// フラッドガードのキーに使う用途名
const FLOOD_PURPOSE: &str = "chat_message";

/// 送信確定後にブロードキャストすべきメッセージ
///
/// `content` は常にサニタイズ済みの平文。暗号化ルームでも在室者へは
/// 平文を配信し、暗号文は永続化層にのみ渡る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub message_id: String,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub content: String,
    pub is_encrypted: bool,
    pub sent_at: Timestamp,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Presence Registry(在室台帳の抽象化)
    presence: Arc<dyn PresenceRegistry>,
    /// RoomDirectory(ルームメタデータ照会の抽象化)
    directory: Arc<dyn RoomDirectory>,
    /// MessageStore(メッセージ永続化の抽象化)
    store: Arc<dyn MessageStore>,
    flood: Arc<FloodGuard>,
    cipher: Arc<RoomCipher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        presence: Arc<dyn PresenceRegistry>,
        directory: Arc<dyn RoomDirectory>,
        store: Arc<dyn MessageStore>,
        flood: Arc<FloodGuard>,
        cipher: Arc<RoomCipher>,
    ) -> Self {
        Self {
            presence,
            directory,
            store,
            flood,
            cipher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 送信先ルーム
    /// * `connection_id` - 送信者のコネクション
    /// * `user_id` - 送信者のユーザー
    /// * `raw` - 生のメッセージ文字列（未検証）
    ///
    /// # Returns
    ///
    /// * `Ok(OutboundMessage)` - 保存済み。在室者への配信はトランスポート層が行う
    /// * `Err(SendMessageError)` - 拒否または失敗。保存は発生していない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        user_id: &UserId,
        raw: String,
    ) -> Result<OutboundMessage, SendMessageError> {
        // 1. 在室チェック（Registry はコネクション単位で管理している）
        if !self.presence.is_member(room_id, connection_id) {
            return Err(SendMessageError::NotMember);
        }

        // 2. フラッドガード（purge → count → append をキー単位で原子的に実行）
        let key = FloodKey::room_scoped(user_id.clone(), FLOOD_PURPOSE, room_id.clone());
        let decision = self.flood.check(key, MESSAGES_PER_WINDOW, MESSAGE_WINDOW);
        if !decision.allowed {
            let retry_after = decision.retry_after.unwrap_or(MESSAGE_WINDOW);
            debug!(
                room_id = room_id.as_str(),
                user_id = user_id.as_str(),
                retry_after_millis = retry_after.as_millis() as u64,
                "message rejected by flood guard"
            );
            return Err(SendMessageError::RateLimited { retry_after });
        }

        // 3. バリデーションとサニタイズ
        let content = MessageContent::new(raw)?;

        // 4. ルームメタデータを参照し、暗号化の要否を決める
        let room = self
            .directory
            .get_room(room_id)
            .await?
            .ok_or(SendMessageError::RoomNotFound)?;
        let stored_content = if room.encryption_enabled {
            self.cipher.encrypt(content.as_str(), room_id)?
        } else {
            content.as_str().to_string()
        };

        // 5. 永続化してアクティビティを更新
        let stored = self
            .store
            .save_message(room_id, user_id, &stored_content, room.encryption_enabled)
            .await?;
        self.directory.touch_activity(room_id).await?;

        info!(
            room_id = room_id.as_str(),
            user_id = user_id.as_str(),
            encrypted = room.encryption_enabled,
            "message stored"
        );

        Ok(OutboundMessage {
            message_id: stored.id,
            room_id: stored.room_id,
            user_id: stored.user_id,
            content: content.into_string(),
            is_encrypted: stored.is_encrypted,
            sent_at: stored.sent_at,
        })
    }
}

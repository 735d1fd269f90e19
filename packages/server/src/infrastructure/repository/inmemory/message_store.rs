//! インメモリ MessageStore 実装

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use hiroba_shared::time::Clock;

use crate::domain::{MessageStore, RoomId, StoreError, StoredMessage, Timestamp, UserId};

/// インメモリ MessageStore 実装
///
/// ルームごとのメッセージ列を送信順（古い順）で保持する。
pub struct InMemoryMessageStore {
    messages: Mutex<HashMap<RoomId, Vec<StoredMessage>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save_message(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        content: &str,
        is_encrypted: bool,
    ) -> Result<StoredMessage, StoreError> {
        let message = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.clone(),
            user_id: user_id.clone(),
            content: content.to_string(),
            is_encrypted,
            sent_at: Timestamp::new(self.clock.now_millis()),
        };
        let mut messages = self.messages.lock().await;
        messages
            .entry(room_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn load_recent(
        &self,
        room_id: &RoomId,
        count: usize,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let messages = self.messages.lock().await;
        // 新しい順で返す（表示用の並べ替えはユースケース側の責務）
        Ok(messages
            .get(room_id)
            .map(|room_messages| {
                room_messages
                    .iter()
                    .rev()
                    .take(count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

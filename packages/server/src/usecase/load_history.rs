//! UseCase: メッセージ履歴取得処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LoadHistoryUseCase::execute() メソッド
//! - 登録参加者チェックと、暗号化メッセージの 1 件単位の復号
//!
//! ### なぜこのテストが必要か
//! - 在室中でなくても「登録参加者」であれば履歴を読めることを確認する
//!   （is_registered_participant は在室チェックとは別物）
//! - 復号に失敗したメッセージが履歴全体を壊さないことを保証する
//! - 返却順序（古い順）を保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：平文と暗号文が混在する履歴の取得
//! - 異常系：未登録ユーザーからの要求、破損した暗号文を含む履歴
//! - エッジケース：履歴が空のルーム

use std::sync::Arc;

use tracing::warn;

use crate::domain::{MessageStore, RoomDirectory, RoomId, Timestamp, UserId};
use crate::infrastructure::crypto::{DecryptError, RoomCipher};

use super::error::LoadHistoryError;

/// 履歴 1 件分の取得結果
///
/// 復号に失敗した場合は `content` が `Err` になる。呼び出し側（DTO 層）は
/// 1 件単位でプレースホルダに退避し、残りの履歴は通常どおり返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub message_id: String,
    pub user_id: UserId,
    pub content: Result<String, DecryptError>,
    pub sent_at: Timestamp,
}

/// メッセージ履歴取得のユースケース
pub struct LoadHistoryUseCase {
    /// RoomDirectory(参加登録照会の抽象化)
    directory: Arc<dyn RoomDirectory>,
    /// MessageStore(メッセージ永続化の抽象化)
    store: Arc<dyn MessageStore>,
    cipher: Arc<RoomCipher>,
}

impl LoadHistoryUseCase {
    /// 新しい LoadHistoryUseCase を作成
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        store: Arc<dyn MessageStore>,
        cipher: Arc<RoomCipher>,
    ) -> Self {
        Self {
            directory,
            store,
            cipher,
        }
    }

    /// 履歴取得を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象ルーム
    /// * `user_id` - 要求者（ルームの登録参加者であること。在室は問わない）
    /// * `count` - 取得する最大件数
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<HistoryMessage>)` - 古い順。復号失敗は 1 件単位の `Err`
    /// * `Err(LoadHistoryError)` - 要求自体の拒否または失敗
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        count: usize,
    ) -> Result<Vec<HistoryMessage>, LoadHistoryError> {
        // 1. 登録参加者チェック（在室チェックではない）
        if !self
            .directory
            .is_registered_participant(room_id, user_id)
            .await?
        {
            return Err(LoadHistoryError::NotRegistered);
        }

        // 2. 新しい順で読み出し、1 件単位で復号
        let recent = self.store.load_recent(room_id, count).await?;
        let mut history: Vec<HistoryMessage> = recent
            .into_iter()
            .map(|stored| {
                let content = if stored.is_encrypted {
                    self.cipher.decrypt(&stored.content, room_id)
                } else {
                    Ok(stored.content)
                };
                if let Err(reason) = &content {
                    warn!(
                        room_id = room_id.as_str(),
                        message_id = stored.id,
                        %reason,
                        "failed to decrypt stored message"
                    );
                }
                HistoryMessage {
                    message_id: stored.id,
                    user_id: stored.user_id,
                    content,
                    sent_at: stored.sent_at,
                }
            })
            .collect();

        // 3. 表示用に古い順へ並べ替える
        history.reverse();
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockRoomDirectory;
    use crate::infrastructure::repository::InMemoryMessageStore;
    use hiroba_shared::time::{Clock, ManualClock};

    fn build_fixture(
        registered: bool,
    ) -> (
        LoadHistoryUseCase,
        Arc<InMemoryMessageStore>,
        Arc<RoomCipher>,
        Arc<ManualClock>,
    ) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let store = Arc::new(InMemoryMessageStore::new(clock_dyn));
        let cipher = Arc::new(RoomCipher::new(b"master-secret-for-tests".to_vec()));
        let mut directory = MockRoomDirectory::new();
        directory
            .expect_is_registered_participant()
            .returning(move |_, _| Ok(registered));
        let usecase =
            LoadHistoryUseCase::new(Arc::new(directory), store.clone(), cipher.clone());
        (usecase, store, cipher, clock)
    }

    #[tokio::test]
    async fn test_load_history_returns_oldest_first() {
        // テスト項目: 履歴が古い順で返る
        // given (前提条件): 3 件のメッセージを時刻をずらして保存
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        let (usecase, store, _cipher, clock) = build_fixture(true);
        for text in ["first", "second", "third"] {
            store.save_message(&room_id, &alice, text, false).await.unwrap();
            clock.advance(1_000);
        }

        // when (操作):
        let history = usecase.execute(&room_id, &alice, 10).await.unwrap();

        // then (期待する結果):
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, Ok("first".to_string()));
        assert_eq!(history[2].content, Ok("third".to_string()));
        assert!(history[0].sent_at < history[2].sent_at);
    }

    #[tokio::test]
    async fn test_load_history_respects_count() {
        // テスト項目: count 件を超える履歴は直近分のみ返る
        // given (前提条件): 5 件保存済み
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        let (usecase, store, _cipher, clock) = build_fixture(true);
        for i in 0..5 {
            store
                .save_message(&room_id, &alice, &format!("msg {i}"), false)
                .await
                .unwrap();
            clock.advance(1_000);
        }

        // when (操作): 直近 2 件を要求
        let history = usecase.execute(&room_id, &alice, 2).await.unwrap();

        // then (期待する結果): 新しい 2 件が古い順で返る
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, Ok("msg 3".to_string()));
        assert_eq!(history[1].content, Ok("msg 4".to_string()));
    }

    #[tokio::test]
    async fn test_load_history_decrypts_encrypted_messages() {
        // テスト項目: 暗号化済みメッセージが復号されて返る
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        let (usecase, store, cipher, _clock) = build_fixture(true);
        let blob = cipher.encrypt("secret plan", &room_id).unwrap();
        store.save_message(&room_id, &alice, &blob, true).await.unwrap();

        // when (操作):
        let history = usecase.execute(&room_id, &alice, 10).await.unwrap();

        // then (期待する結果):
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, Ok("secret plan".to_string()));
    }

    #[tokio::test]
    async fn test_load_history_corrupt_message_does_not_break_history() {
        // テスト項目: 復号に失敗した 1 件が Err となり、残りは取得できる
        // given (前提条件): 正常 1 件と破損 1 件を保存
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        let (usecase, store, cipher, clock) = build_fixture(true);
        let blob = cipher.encrypt("readable", &room_id).unwrap();
        store.save_message(&room_id, &alice, &blob, true).await.unwrap();
        clock.advance(1_000);
        store
            .save_message(&room_id, &alice, "%%% not base64 %%%", true)
            .await
            .unwrap();

        // when (操作):
        let history = usecase.execute(&room_id, &alice, 10).await.unwrap();

        // then (期待する結果):
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, Ok("readable".to_string()));
        assert_eq!(history[1].content, Err(DecryptError::InvalidEncoding));
    }

    #[tokio::test]
    async fn test_load_history_rejects_unregistered_user() {
        // テスト項目: 未登録ユーザーからの履歴要求は拒否される
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let mallory = UserId::new("mallory".to_string()).unwrap();
        let (usecase, _store, _cipher, _clock) = build_fixture(false);

        // when (操作):
        let result = usecase.execute(&room_id, &mallory, 10).await;

        // then (期待する結果):
        assert_eq!(result, Err(LoadHistoryError::NotRegistered));
    }

    #[tokio::test]
    async fn test_load_history_empty_room() {
        // テスト項目: 履歴のないルームでは空のリストが返る
        // given (前提条件):
        let room_id = RoomId::new("room-empty".to_string()).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        let (usecase, _store, _cipher, _clock) = build_fixture(true);

        // when (操作):
        let history = usecase.execute(&room_id, &alice, 10).await.unwrap();

        // then (期待する結果):
        assert!(history.is_empty());
    }
}

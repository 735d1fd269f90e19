//! UseCase: ルームアクセストークン発行処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - IssueRoomTokenUseCase::execute() メソッド
//! - 発行前提（ルームが開室中・ユーザーが登録参加者）の検証
//!
//! ### なぜこのテストが必要か
//! - トークンは WebSocket 入室の唯一の認可手段であり、未登録ユーザーへの
//!   発行はアクセス制御の崩壊につながる
//! - 発行されたトークンが同じサービスで検証可能であることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録参加者へのトークン発行
//! - 異常系：ルーム不在、ルーム閉鎖、未登録ユーザー、クォータ超過

use std::sync::Arc;

use tracing::info;

use crate::domain::{Role, RoomDirectory, RoomId, UserId};
use crate::infrastructure::flood::{FloodKey, QuotaGuard};
use crate::infrastructure::token::RoomTokenService;

use super::error::IssueTokenError;

/// トークン発行の毎分上限（ユーザー単位）
pub const TOKENS_PER_MINUTE: usize = 10;
/// トークン発行の毎日上限（ユーザー単位）
pub const TOKENS_PER_DAY: usize = 120;

/// ルームアクセストークン発行のユースケース
pub struct IssueRoomTokenUseCase {
    /// RoomDirectory(参加登録照会の抽象化)
    directory: Arc<dyn RoomDirectory>,
    /// トークンの署名サービス
    tokens: Arc<RoomTokenService>,
    /// 発行クォータ（毎分＋毎日）
    quota: Arc<QuotaGuard>,
}

impl IssueRoomTokenUseCase {
    /// 新しい IssueRoomTokenUseCase を作成
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        tokens: Arc<RoomTokenService>,
        quota: Arc<QuotaGuard>,
    ) -> Self {
        Self {
            directory,
            tokens,
            quota,
        }
    }

    /// トークン発行を実行
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - 署名済みトークン（JWT コンパクト形式）
    /// * `Err(IssueTokenError)` - 発行拒否
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        role: Role,
    ) -> Result<String, IssueTokenError> {
        let room = self
            .directory
            .get_room(room_id)
            .await?
            .ok_or(IssueTokenError::RoomNotFound)?;
        if !room.is_active {
            return Err(IssueTokenError::RoomClosed);
        }
        if !self
            .directory
            .is_registered_participant(room_id, user_id)
            .await?
        {
            return Err(IssueTokenError::NotRegistered);
        }

        // クォータは発行成功の直前に消費する（拒否されたリクエストは枠を使わない）
        let decision = self.quota.check(
            FloodKey::user_scoped(user_id.clone(), "token_issue"),
            TOKENS_PER_MINUTE,
            TOKENS_PER_DAY,
        );
        if !decision.allowed {
            return Err(IssueTokenError::QuotaExceeded {
                retry_after: decision.retry_after,
            });
        }

        let token = self
            .tokens
            .mint(user_id, room_id, role)
            .map_err(|_| IssueTokenError::Signing)?;

        info!(
            room_id = room_id.as_str(),
            user_id = user_id.as_str(),
            role = role.as_str(),
            "room access token issued"
        );

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockRoomDirectory, RoomKind, RoomMeta};
    use hiroba_shared::time::{Clock, FixedClock};

    const SECRET: &[u8] = b"test-secret-for-issue-token-usecase";

    fn room_meta(room_id: &RoomId, is_active: bool) -> RoomMeta {
        RoomMeta {
            id: room_id.clone(),
            kind: RoomKind::Call,
            is_active,
            max_participants: 10,
            encryption_enabled: false,
            recording_in_progress: false,
        }
    }

    fn build_usecase(
        directory: MockRoomDirectory,
    ) -> (IssueRoomTokenUseCase, Arc<RoomTokenService>) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1_700_000_000_000));
        let tokens = Arc::new(RoomTokenService::new(SECRET, clock.clone()));
        let quota = Arc::new(QuotaGuard::new(clock));
        let usecase = IssueRoomTokenUseCase::new(Arc::new(directory), tokens.clone(), quota);
        (usecase, tokens)
    }

    #[tokio::test]
    async fn test_issue_token_for_registered_user() {
        // テスト項目: 登録参加者に検証可能なトークンが発行される
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let mut directory = MockRoomDirectory::new();
        let meta = room_meta(&room_id, true);
        directory
            .expect_get_room()
            .returning(move |_| Ok(Some(meta.clone())));
        directory
            .expect_is_registered_participant()
            .returning(|_, _| Ok(true));
        let (usecase, tokens) = build_usecase(directory);
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let token = usecase.execute(&room_id, &alice, Role::Teacher).await.unwrap();

        // then (期待する結果): 同じサービスで検証でき、クレームが一致する
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.subject(), Some(alice));
        assert_eq!(claims.room_id(), Some(room_id));
        assert_eq!(claims.role(), Some(Role::Teacher));
    }

    #[tokio::test]
    async fn test_issue_token_rejects_unknown_room() {
        // テスト項目: 存在しないルームにはトークンを発行しない
        // given (前提条件):
        let room_id = RoomId::new("room-ghost".to_string()).unwrap();
        let mut directory = MockRoomDirectory::new();
        directory.expect_get_room().returning(|_| Ok(None));
        let (usecase, _tokens) = build_usecase(directory);
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&room_id, &alice, Role::Student).await;

        // then (期待する結果):
        assert_eq!(result, Err(IssueTokenError::RoomNotFound));
    }

    #[tokio::test]
    async fn test_issue_token_rejects_closed_room() {
        // テスト項目: 閉鎖済みルームにはトークンを発行しない
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let mut directory = MockRoomDirectory::new();
        let meta = room_meta(&room_id, false);
        directory
            .expect_get_room()
            .returning(move |_| Ok(Some(meta.clone())));
        let (usecase, _tokens) = build_usecase(directory);
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&room_id, &alice, Role::Student).await;

        // then (期待する結果):
        assert_eq!(result, Err(IssueTokenError::RoomClosed));
    }

    #[tokio::test]
    async fn test_issue_token_rejects_unregistered_user() {
        // テスト項目: 未登録ユーザーにはトークンを発行しない
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let mut directory = MockRoomDirectory::new();
        let meta = room_meta(&room_id, true);
        directory
            .expect_get_room()
            .returning(move |_| Ok(Some(meta.clone())));
        directory
            .expect_is_registered_participant()
            .returning(|_, _| Ok(false));
        let (usecase, _tokens) = build_usecase(directory);
        let mallory = UserId::new("mallory".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&room_id, &mallory, Role::Student).await;

        // then (期待する結果):
        assert_eq!(result, Err(IssueTokenError::NotRegistered));
    }

    #[tokio::test]
    async fn test_issue_token_enforces_per_minute_quota() {
        // テスト項目: 毎分上限を超える発行要求が拒否される
        // given (前提条件): 上限いっぱいまで発行済み
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let mut directory = MockRoomDirectory::new();
        let meta = room_meta(&room_id, true);
        directory
            .expect_get_room()
            .returning(move |_| Ok(Some(meta.clone())));
        directory
            .expect_is_registered_participant()
            .returning(|_, _| Ok(true));
        let (usecase, _tokens) = build_usecase(directory);
        let alice = UserId::new("alice".to_string()).unwrap();
        for _ in 0..TOKENS_PER_MINUTE {
            assert!(usecase.execute(&room_id, &alice, Role::Student).await.is_ok());
        }

        // when (操作): 上限超過の発行要求
        let result = usecase.execute(&room_id, &alice, Role::Student).await;

        // then (期待する結果): retry-after 付きで拒否される
        assert_eq!(
            result,
            Err(IssueTokenError::QuotaExceeded {
                retry_after: Some(std::time::Duration::from_secs(60)),
            })
        );
    }
}

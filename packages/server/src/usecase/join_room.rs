//! UseCase: 入室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 入室の前提検証（トークン・ルーム状態・定員）と Registry への登録
//!
//! ### なぜこのテストが必要か
//! - トークンの subject / room とリクエストの不一致を確実に拒否する
//! - 閉鎖ルーム・満員ルームへの入室を防ぐ
//! - 入室成功時に既存参加者リストと録画アドバイザリが返ることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なトークンでの入室、同一コネクションの再入室
//! - 異常系：トークン不正、ルーム不在、ルーム閉鎖、満員、別ルーム在室中
//! - エッジケース：1 人目の入室（既存参加者リストが空）

use std::sync::Arc;

use hiroba_shared::time::Clock;
use tracing::info;

use crate::domain::{
    ConnectionId, DisplayName, JoinOutcome, Participant, PresenceRegistry, Role, RoomDirectory,
    RoomId, Timestamp, UserId,
};
use crate::infrastructure::token::RoomTokenService;

use super::error::JoinRoomError;

/// 入室成功時の結果
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    /// 入室した参加者（トークンのロールを反映済み）
    pub participant: Participant,
    /// 入室時点の既存参加者（入室者自身を除く）
    pub others: Vec<Participant>,
    /// 録画進行中アドバイザリ（通話ルーム用）
    pub recording_in_progress: bool,
    /// メッセージ暗号化が有効なルームかどうか
    pub encryption_enabled: bool,
}

/// 入室のユースケース
///
/// チャットルームと通話ルームで入室の手順は同一のため、ユースケースは
/// 1 つに統合している（ルーム種別による差はメタデータ側が持つ）。
pub struct JoinRoomUseCase {
    /// Presence Registry（在室台帳の抽象化）
    presence: Arc<dyn PresenceRegistry>,
    /// RoomDirectory（ルームメタデータ照会の抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// ルームアクセストークンの検証サービス
    tokens: Arc<RoomTokenService>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        presence: Arc<dyn PresenceRegistry>,
        directory: Arc<dyn RoomDirectory>,
        tokens: Arc<RoomTokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            presence,
            directory,
            tokens,
            clock,
        }
    }

    /// 入室を実行
    ///
    /// # Arguments
    ///
    /// * `token` - ルームアクセストークン（HTTP 側で発行されたもの）
    /// * `room_id` - 入室先ルーム
    /// * `connection_id` - このコネクションの識別子
    /// * `user_id` - 申告されたユーザー（トークンの subject と一致すること）
    /// * `display_name` - 表示名
    ///
    /// # Returns
    ///
    /// * `Ok(JoinedRoom)` - 入室成功。既存参加者リストとアドバイザリを含む
    /// * `Err(JoinRoomError)` - 入室拒否
    pub async fn execute(
        &self,
        token: &str,
        room_id: &RoomId,
        connection_id: ConnectionId,
        user_id: &UserId,
        display_name: DisplayName,
    ) -> Result<JoinedRoom, JoinRoomError> {
        // 1. トークンを検証し、subject とルームの一致を確認
        let claims = self
            .tokens
            .verify(token)
            .ok_or(JoinRoomError::InvalidToken)?;
        if claims.subject().as_ref() != Some(user_id) {
            return Err(JoinRoomError::NotTokenSubject);
        }
        if claims.room_id().as_ref() != Some(room_id) {
            return Err(JoinRoomError::TokenRoomMismatch);
        }
        let role = claims.role().ok_or(JoinRoomError::InvalidToken)?;

        // 2. ルームの存在と開室状態を確認
        let room = self
            .directory
            .get_room(room_id)
            .await?
            .ok_or(JoinRoomError::RoomNotFound)?;
        if !room.is_active {
            return Err(JoinRoomError::RoomClosed);
        }

        // 3. Registry に登録（定員チェックは Registry 内部で原子的に行う）
        let participant = Participant::new(
            connection_id,
            user_id.clone(),
            display_name,
            role,
            Timestamp::new(self.clock.now_millis()),
        );
        match self
            .presence
            .join(room_id, participant.clone(), room.max_participants)
        {
            JoinOutcome::Joined | JoinOutcome::Rejoined => {}
            JoinOutcome::RoomFull => return Err(JoinRoomError::RoomFull),
            JoinOutcome::InAnotherRoom => return Err(JoinRoomError::AlreadyInAnotherRoom),
        }

        // 4. 既存参加者リスト（入室者自身を除く）を取得
        let others: Vec<Participant> = self
            .presence
            .list_participants(room_id)
            .into_iter()
            .filter(|p| &p.user_id != user_id)
            .collect();

        // 5. 最終アクティビティを更新
        self.directory.touch_activity(room_id).await?;

        info!(
            room_id = room_id.as_str(),
            user_id = user_id.as_str(),
            role = role.as_str(),
            "participant joined room"
        );

        Ok(JoinedRoom {
            participant,
            others,
            recording_in_progress: room.recording_in_progress,
            encryption_enabled: room.encryption_enabled,
        })
    }
}

//! インメモリ RoomDirectory 実装

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use hiroba_shared::time::Clock;

use crate::domain::{DirectoryError, RoomDirectory, RoomId, RoomMeta, UserId};

/// 1 ルーム分のレコード
struct RoomRecord {
    meta: RoomMeta,
    /// 参加者として登録済みのユーザー（「現在接続中」とは別の概念）
    registered: HashSet<UserId>,
    last_activity: i64,
}

/// インメモリ RoomDirectory 実装
pub struct InMemoryRoomDirectory {
    rooms: Mutex<HashMap<RoomId, RoomRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomDirectory {
    /// 新しい InMemoryRoomDirectory を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// ルームを登録する（開発サーバー・テストのセットアップ用）
    pub async fn insert_room(&self, meta: RoomMeta) {
        let mut rooms = self.rooms.lock().await;
        let last_activity = self.clock.now_millis();
        rooms.insert(
            meta.id.clone(),
            RoomRecord {
                meta,
                registered: HashSet::new(),
                last_activity,
            },
        );
    }

    /// ユーザーをルームの参加者として登録する
    pub async fn register_participant(&self, room_id: &RoomId, user_id: UserId) {
        let mut rooms = self.rooms.lock().await;
        if let Some(record) = rooms.get_mut(room_id) {
            record.registered.insert(user_id);
        }
    }

    /// ルームの最終アクティビティ時刻を取得（テスト用）
    pub async fn last_activity(&self, room_id: &RoomId) -> Option<i64> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|record| record.last_activity)
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomMeta>, DirectoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(room_id).map(|record| record.meta.clone()))
    }

    async fn is_registered_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<bool, DirectoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .get(room_id)
            .is_some_and(|record| record.registered.contains(user_id)))
    }

    async fn touch_activity(&self, room_id: &RoomId) -> Result<(), DirectoryError> {
        let mut rooms = self.rooms.lock().await;
        if let Some(record) = rooms.get_mut(room_id) {
            record.last_activity = self.clock.now_millis();
        }
        Ok(())
    }
}

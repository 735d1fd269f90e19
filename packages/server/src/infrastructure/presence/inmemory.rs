//! DashMap によるインメモリ Presence Registry 実装
//!
//! ドメイン層が定義する PresenceRegistry trait の具体的な実装。
//! ルーム → コネクション → 参加者のメンバーシップ表を `DashMap` で持ち、
//! 切断時の後始末用にコネクション → ルームの逆引きインデックスを併設します。
//!
//! ## ロック順序
//!
//! 逆引きインデックス → メンバーシップ表の順でのみネストして取得する。
//! 逆順のネストは存在しないため、シャードロック間のデッドロックは起きない。
//! 除去系の操作は先に逆引きインデックスから外すので、除去されたコネクションは
//! 新規のルックアップから即座に不可視になる（除去は last-writer-wins）。

use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::domain::{
    ConnectionId, JoinOutcome, MediaState, Participant, PresenceRegistry, RoomId,
};

/// インメモリ Presence Registry
///
/// 全メソッドが `&self` で並行に呼び出せる（呼び出し側のロック不要）。
#[derive(Default)]
pub struct InMemoryPresenceRegistry {
    /// ルームごとのメンバーシップ表（コネクション単位でキーイング）
    rooms: DashMap<RoomId, HashMap<ConnectionId, Participant>>,
    /// 逆引きインデックス: コネクション → 参加中のルーム
    index: DashMap<ConnectionId, RoomId>,
}

impl InMemoryPresenceRegistry {
    /// 新しい InMemoryPresenceRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 空になったルームのエントリを破棄する（メモリリーク対策）
    fn drop_room_if_empty(&self, room_id: &RoomId) {
        self.rooms.remove_if(room_id, |_, members| members.is_empty());
    }
}

impl PresenceRegistry for InMemoryPresenceRegistry {
    fn join(
        &self,
        room_id: &RoomId,
        participant: Participant,
        max_participants: usize,
    ) -> JoinOutcome {
        let connection_id = participant.connection_id.clone();
        match self.index.entry(connection_id.clone()) {
            Entry::Occupied(current) => {
                if current.get() != room_id {
                    return JoinOutcome::InAnotherRoom;
                }
                // 再入室: 参加者メタデータのみ上書きし、台帳の重複登録はしない
                if let Some(mut members) = self.rooms.get_mut(room_id) {
                    members.insert(connection_id, participant);
                }
                JoinOutcome::Rejoined
            }
            Entry::Vacant(slot) => {
                // 定員チェックは挿入と同一クリティカルセクションで行う
                let mut members = self.rooms.entry(room_id.clone()).or_default();
                if members.len() >= max_participants {
                    return JoinOutcome::RoomFull;
                }
                members.insert(connection_id, participant);
                slot.insert(room_id.clone());
                JoinOutcome::Joined
            }
        }
    }

    fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Participant> {
        match self.index.entry(connection_id.clone()) {
            Entry::Occupied(current) if current.get() == room_id => {
                current.remove();
            }
            _ => return None,
        }
        let removed = self
            .rooms
            .get_mut(room_id)
            .and_then(|mut members| members.remove(connection_id));
        self.drop_room_if_empty(room_id);
        removed
    }

    fn list_participants(&self, room_id: &RoomId) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self
            .rooms
            .get(room_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default();

        // 表示用: user_id でソートし、同一ユーザーの複数コネクションを 1 件に畳む
        participants.sort_by(|a, b| {
            a.user_id
                .as_str()
                .cmp(b.user_id.as_str())
                .then(a.connected_at.cmp(&b.connected_at))
        });
        participants.dedup_by(|a, b| a.user_id == b.user_id);
        participants
    }

    fn connections(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        self.index
            .get(connection_id)
            .is_some_and(|room| room.value() == room_id)
    }

    fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.index
            .get(connection_id)
            .map(|room| room.value().clone())
    }

    fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    fn update_media_state(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        media_state: MediaState,
    ) -> Option<Participant> {
        let mut members = self.rooms.get_mut(room_id)?;
        let participant = members.get_mut(connection_id)?;
        participant.media_state = media_state;
        Some(participant.clone())
    }

    fn disconnect_cleanup(&self, connection_id: &ConnectionId) -> Vec<(RoomId, Participant)> {
        // 先に逆引きインデックスから外し、以降のルックアップから不可視にする
        let Some((_, room_id)) = self.index.remove(connection_id) else {
            return Vec::new();
        };
        let removed = self
            .rooms
            .get_mut(&room_id)
            .and_then(|mut members| members.remove(connection_id));
        self.drop_room_if_empty(&room_id);
        match removed {
            Some(participant) => vec![(room_id, participant)],
            None => Vec::new(),
        }
    }
}

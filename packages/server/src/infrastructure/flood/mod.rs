//! スライディングウィンドウ方式のフラッドガード
//!
//! キー（ユーザー × 用途 × 任意でルーム）ごとにタイムスタンプ列を保持し、
//! 「ウィンドウ外のエントリを purge → 件数チェック → 現在時刻を append」を
//! キー単位で原子的に実行します。キー間は独立しており、混雑しているユーザーや
//! ルームが他のキーをブロックすることはありません。
//!
//! 用途は 2 つ:
//! - [`FloodGuard`]: 単一ウィンドウの可否判定（チャットの毎分上限など）
//! - [`QuotaGuard`]: 同じタイムスタンプ列に対する毎分＋毎日の二段上限。
//!   厳しい方（既に超過している方）が勝ち、残量と retry-after を報告する

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use hiroba_shared::time::Clock;
use tracing::debug;

use crate::domain::{RoomId, UserId};

/// レート制限のキー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FloodKey {
    /// 対象ユーザー
    pub user_id: UserId,
    /// 用途（"chat_message" など）。用途ごとに独立したウィンドウを持つ
    pub purpose: &'static str,
    /// ルームスコープの制限の場合のみ設定
    pub room_id: Option<RoomId>,
}

impl FloodKey {
    /// ルームスコープのキーを作成
    pub fn room_scoped(user_id: UserId, purpose: &'static str, room_id: RoomId) -> Self {
        Self {
            user_id,
            purpose,
            room_id: Some(room_id),
        }
    }

    /// ユーザースコープのキーを作成
    pub fn user_scoped(user_id: UserId, purpose: &'static str) -> Self {
        Self {
            user_id,
            purpose,
            room_id: None,
        }
    }
}

/// 直近のイベントのタイムスタンプ列（1 キー分のスライディングウィンドウ）
#[derive(Debug, Default)]
struct RateWindow {
    timestamps: VecDeque<i64>,
}

impl RateWindow {
    /// `cutoff` より古いエントリを取り除く
    fn purge_older_than(&mut self, cutoff: i64) {
        while self
            .timestamps
            .front()
            .is_some_and(|&oldest| oldest <= cutoff)
        {
            self.timestamps.pop_front();
        }
    }

    /// `cutoff` より新しいエントリ数を数える（末尾からの走査）
    fn count_since(&self, cutoff: i64) -> usize {
        self.timestamps
            .iter()
            .rev()
            .take_while(|&&t| t > cutoff)
            .count()
    }

    fn len(&self) -> usize {
        self.timestamps.len()
    }

    fn oldest(&self) -> Option<i64> {
        self.timestamps.front().copied()
    }

    /// `cutoff` より新しい最古のエントリ
    fn oldest_since(&self, cutoff: i64) -> Option<i64> {
        self.timestamps.iter().find(|&&t| t > cutoff).copied()
    }

    fn push(&mut self, timestamp: i64) {
        self.timestamps.push_back(timestamp);
    }
}

/// フラッドガードの判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodDecision {
    /// 許可されたかどうか
    pub allowed: bool,
    /// 拒否時、最古のウィンドウ内エントリが失効するまでの待ち時間
    pub retry_after: Option<Duration>,
}

/// キー単位のスライディングウィンドウ・フラッドガード
///
/// キーは遅延生成され、未知のキーでもエラーにならない。
pub struct FloodGuard {
    windows: DashMap<FloodKey, RateWindow>,
    clock: Arc<dyn Clock>,
}

impl FloodGuard {
    /// 新しい FloodGuard を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// purge → 件数チェック → append をキー単位で原子的に実行する
    ///
    /// 件数が `limit` 未満なら現在時刻を追加して許可。
    /// 既に `limit` 件が窓内にあれば拒否し、retry-after を報告する。
    pub fn check(&self, key: FloodKey, limit: usize, window: Duration) -> FloodDecision {
        let now = self.clock.now_millis();
        let window_millis = window.as_millis() as i64;
        let cutoff = now - window_millis;

        // DashMap の entry ガードがキー単位のクリティカルセクションになる
        let mut rate_window = self.windows.entry(key.clone()).or_default();
        rate_window.purge_older_than(cutoff);

        if rate_window.len() >= limit {
            let retry_after = rate_window
                .oldest()
                .map(|oldest| Duration::from_millis((oldest + window_millis - now).max(0) as u64));
            debug!(
                user_id = %key.user_id,
                purpose = key.purpose,
                limit,
                "flood guard rejected event"
            );
            return FloodDecision {
                allowed: false,
                retry_after,
            };
        }

        rate_window.push(now);
        FloodDecision {
            allowed: true,
            retry_after: None,
        }
    }

    /// 可否のみを返す簡易版
    pub fn allow(&self, key: FloodKey, limit: usize, window: Duration) -> bool {
        self.check(key, limit, window).allowed
    }

    /// ユーザーに紐づく全ウィンドウを破棄する
    ///
    /// コネクション切断時の後始末用。使い捨てコネクションの累積による
    /// メモリの無制限な成長を防ぐ。
    pub fn clear_for_user(&self, user_id: &UserId) {
        self.windows.retain(|key, _| &key.user_id != user_id);
    }
}

/// 二段クォータの判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaDecision {
    /// 許可されたかどうか
    pub allowed: bool,
    /// 毎分枠の残量（今回の消費を含む）
    pub remaining_minute: usize,
    /// 毎日枠の残量（今回の消費を含む）
    pub remaining_day: usize,
    /// 拒否時、超過している枠が空くまでの待ち時間
    pub retry_after: Option<Duration>,
}

/// 汎用の二段クォータガード（毎分＋毎日）
///
/// 同じタイムスタンプ列に対して 2 つの上限を検査する。
/// 両方を同じ purge → count → append の流れで検査し、
/// 既に超過している厳しい方の枠が判定を決める。
pub struct QuotaGuard {
    windows: DashMap<FloodKey, RateWindow>,
    clock: Arc<dyn Clock>,
}

const MINUTE_MILLIS: i64 = 60 * 1000;
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

impl QuotaGuard {
    /// 新しい QuotaGuard を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// 毎分・毎日の二段上限を検査する
    pub fn check(&self, key: FloodKey, per_minute: usize, per_day: usize) -> QuotaDecision {
        let now = self.clock.now_millis();
        let day_cutoff = now - DAY_MILLIS;
        let minute_cutoff = now - MINUTE_MILLIS;

        let mut window = self.windows.entry(key.clone()).or_default();
        // 保持するのは 1 日分だけで良い
        window.purge_older_than(day_cutoff);

        let day_count = window.len();
        let minute_count = window.count_since(minute_cutoff);

        let minute_exceeded = minute_count >= per_minute;
        let day_exceeded = day_count >= per_day;

        if minute_exceeded || day_exceeded {
            // 厳しい方（超過している方）の最古エントリから retry-after を計算する。
            // 両方超過している場合は長く待たされる方を報告する
            let minute_wait = minute_exceeded
                .then(|| window.oldest_since(minute_cutoff))
                .flatten()
                .map(|oldest| (oldest + MINUTE_MILLIS - now).max(0));
            let day_wait = day_exceeded
                .then(|| window.oldest())
                .flatten()
                .map(|oldest| (oldest + DAY_MILLIS - now).max(0));
            let retry_after = minute_wait
                .into_iter()
                .chain(day_wait)
                .max()
                .map(|millis| Duration::from_millis(millis as u64));

            debug!(
                user_id = %key.user_id,
                purpose = key.purpose,
                minute_count,
                day_count,
                "quota guard rejected event"
            );
            return QuotaDecision {
                allowed: false,
                remaining_minute: per_minute.saturating_sub(minute_count),
                remaining_day: per_day.saturating_sub(day_count),
                retry_after,
            };
        }

        window.push(now);
        QuotaDecision {
            allowed: true,
            remaining_minute: per_minute.saturating_sub(minute_count + 1),
            remaining_day: per_day.saturating_sub(day_count + 1),
            retry_after: None,
        }
    }
}

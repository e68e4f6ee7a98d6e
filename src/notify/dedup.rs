//! 通知去重缓存 - 抑制短时间内的重复通知
//!
//! 以「整组清空」的纪元语义实现 ~60 秒去重窗口：缓存记录一个纪元起点，
//! 每次访问时若发现纪元已满，就无条件清空全部键并把起点推进到最近的
//! 纪元边界。和逐键 TTL 相比语义更粗：紧随原消息 1 秒后到达的重复
//! 一定被抑制，而落在 59–60 秒附近的重复取决于纪元对齐，可能放行。

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// 默认纪元长度
const DEFAULT_EPOCH: Duration = Duration::from_secs(60);

/// 一个纪元内见过的通知键集合
#[derive(Debug)]
pub struct RecentKeys {
    keys: HashSet<String>,
    epoch: Duration,
    epoch_started: Instant,
}

impl RecentKeys {
    /// 创建缓存，使用默认 60 秒纪元
    pub fn new() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }

    /// 自定义纪元长度（测试用短窗口）
    pub fn with_epoch(epoch: Duration) -> Self {
        Self {
            keys: HashSet::new(),
            epoch,
            epoch_started: Instant::now(),
        }
    }

    /// 记录一个键；本纪元内首次出现返回 `true`，重复返回 `false`
    pub fn check_and_insert(&mut self, key: &str) -> bool {
        self.check_and_insert_at(key, Instant::now())
    }

    fn check_and_insert_at(&mut self, key: &str, now: Instant) -> bool {
        self.roll_epoch(now);

        if self.keys.contains(key) {
            debug!(key, "duplicate suppressed");
            return false;
        }
        self.keys.insert(key.to_string());
        true
    }

    /// 跨过纪元边界时整组清空，起点对齐到边界而不是 `now`，
    /// 保持与固定周期定时器一致的节奏
    fn roll_epoch(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.epoch_started);
        if elapsed < self.epoch {
            return;
        }

        self.keys.clear();
        let periods = (elapsed.as_nanos() / self.epoch.as_nanos()) as u32;
        self.epoch_started += self.epoch * periods;
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for RecentKeys {
    fn default() -> Self {
        Self::new()
    }
}

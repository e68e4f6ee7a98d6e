//! 本地投递历史
//!
//! 每次成功投递追加一行 JSON 到 `history.jsonl`，`status` 命令展示
//! 最近若干条。写入带文件锁（同一台机器可能跑多个实例）；
//! 历史写失败只记日志，绝不影响分发。

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// 单条投递记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub sent_at: DateTime<Utc>,
    pub network: String,
    pub channel: String,
    pub service: String,
    pub title: String,
}

/// JSONL 投递日志
#[derive(Debug, Clone)]
pub struct DeliveryLog {
    path: PathBuf,
}

impl DeliveryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 追加一条记录（带文件锁）
    pub fn append(&self, record: &DeliveryRecord) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        file.unlock()?;

        Ok(())
    }

    /// 最近 n 条；文件缺失视为空，坏行跳过
    pub fn read_recent(&self, n: usize) -> Vec<DeliveryRecord> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let reader = BufReader::new(file);
        let records: Vec<DeliveryRecord> = reader
            .lines()
            .filter_map(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(service: &str, title: &str) -> DeliveryRecord {
        DeliveryRecord {
            sent_at: Utc::now(),
            network: "libera".to_string(),
            channel: "#dev".to_string(),
            service: service.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_append_and_read_recent() {
        let dir = TempDir::new().unwrap();
        let log = DeliveryLog::new(dir.path().join("history.jsonl"));

        for i in 0..5 {
            log.append(&record("pushover", &format!("title-{}", i))).unwrap();
        }

        let recent = log.read_recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].title, "title-2");
        assert_eq!(recent[2].title, "title-4");
    }

    #[test]
    fn test_read_recent_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = DeliveryLog::new(dir.path().join("nope.jsonl"));
        assert!(log.read_recent(5).is_empty());
    }

    #[test]
    fn test_read_recent_skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        let log = DeliveryLog::new(&path);

        log.append(&record("pushover", "good")).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ broken json").unwrap();
        log.append(&record("webhook", "also good")).unwrap();

        let recent = log.read_recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].service, "webhook");
    }

    #[test]
    fn test_append_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let log = DeliveryLog::new(dir.path().join("nested").join("history.jsonl"));
        log.append(&record("pushover", "t")).unwrap();
        assert_eq!(log.read_recent(1).len(), 1);
    }
}

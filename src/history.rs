//! 最近识别结果的有界历史记录。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub recognized_token: String,
    pub timestamp: DateTime<Utc>,
}

/// 定长 FIFO：超出容量时先淘汰最旧记录，读取返回快照
pub struct HistoryLedger {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl HistoryLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&self, token: impl Into<String>) {
        let entry = HistoryEntry {
            recognized_token: token.into(),
            timestamp: Utc::now(),
        };

        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// 最近的 `limit` 条（默认全部），最旧在前、最新在后
    pub fn recent(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let entries = self.entries.lock();
        let take = limit.unwrap_or(entries.len()).min(entries.len());
        entries.iter().skip(entries.len() - take).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        tracing::info!("Recognition history cleared");
    }
}

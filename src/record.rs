//! 保存用のセッション記録と、保存済みセッションの集計

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub attempts: u32,
    /// 1 秒ごとの平滑化スコア (丸め済み)
    #[serde(default)]
    pub scores: Vec<u8>,
    /// 秒
    #[serde(default)]
    pub total_time: u64,
    #[serde(default)]
    pub best_score: u8,
}

/// 保存済みセッション。`{"sessions": [...]}` の形式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

impl SessionHistory {
    pub fn push(&mut self, record: SessionRecord) {
        self.sessions.push(record);
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_records(&self.sessions)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub total_time: u64,
    pub best_score: u8,
    /// 各セッションのベストスコアの平均
    pub avg_score: f32,
}

impl HistoryStats {
    pub fn from_records(records: &[SessionRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let total_time = records.iter().map(|r| r.total_time).sum();
        let best_score = records.iter().map(|r| r.best_score).max().unwrap_or(0);
        let best_sum: u64 = records.iter().map(|r| u64::from(r.best_score)).sum();
        Self {
            total_sessions: records.len(),
            total_time,
            best_score,
            avg_score: best_sum as f32 / records.len() as f32,
        }
    }
}

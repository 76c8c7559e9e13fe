use serde::Serialize;

use crate::record::SessionRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub best_score: u8,
    pub average_score: f32,
    /// 閾値以上を連続で保った秒数
    pub held_seconds: u32,
    pub elapsed_seconds: u32,
    /// ホールドタイマーが 0 から始まった回数
    pub attempts: u32,
}

/// セッションの集計 (ベストスコア、平均、ホールドタイマー)
#[derive(Debug, Default)]
pub struct SessionAggregator {
    metrics: SessionMetrics,
    scores: Vec<u8>,
    sum: u64,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// フレームごとの平滑化スコア。ベストスコアを引き上げるだけ
    pub fn observe(&mut self, smoothed: u8) {
        let best = &mut self.metrics.best_score;
        *best = (*best).max(smoothed.min(100));
    }

    /// 1 秒ごとに丸める前の平滑化スコアで呼ぶ
    pub fn record(&mut self, smoothed: f32, held_threshold: f32) -> &SessionMetrics {
        let rounded = smoothed.round().clamp(0.0, 100.0) as u8;
        self.scores.push(rounded);
        self.sum += u64::from(rounded);

        let m = &mut self.metrics;
        m.elapsed_seconds += 1;
        m.best_score = m.best_score.max(rounded);
        m.average_score = self.sum as f32 / self.scores.len() as f32;

        if smoothed >= held_threshold {
            if m.held_seconds == 0 {
                m.attempts += 1;
            }
            m.held_seconds += 1;
        } else {
            m.held_seconds = 0;
        }

        &self.metrics
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn scores(&self) -> &[u8] {
        &self.scores
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            attempts: self.metrics.attempts,
            scores: self.scores.clone(),
            total_time: u64::from(self.metrics.elapsed_seconds),
            best_score: self.metrics.best_score,
        }
    }
}

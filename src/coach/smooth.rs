use std::collections::VecDeque;

use crate::config::SmoothingConfig;

/// 直近 `capacity` フレームのスコアの移動平均
pub struct ScoreSmoother {
    capacity: usize,
    history: VecDeque<u8>,
    sum: u32,
}

impl ScoreSmoother {
    /// `capacity` が 0 なら 1 として扱う
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            history: VecDeque::with_capacity(capacity),
            sum: 0,
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(config.window)
    }

    /// フレームスコアを追加し、丸めた平均を返す
    pub fn push(&mut self, score: u8) -> u8 {
        if self.history.len() == self.capacity {
            if let Some(oldest) = self.history.pop_front() {
                self.sum -= u32::from(oldest);
            }
        }
        self.history.push_back(score);
        self.sum += u32::from(score);
        self.current()
    }

    /// 丸める前の平均。最初の push 前は 0
    pub fn mean(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.sum as f32 / self.history.len() as f32
    }

    /// 表示用に丸めた平均
    pub fn current(&self) -> u8 {
        self.mean().round() as u8
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.sum = 0;
    }
}

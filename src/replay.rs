//! オフライン再生用のキーポイント記録
//!
//! 1 行に 1 つの JSON 値。人物が検出されなかったフレームは `null`、
//! それ以外は `{"t_ms": 33, "keypoints": [[x, y, confidence], ...]}`
//! (MoveNet 順に 17 個)。`t_ms` は省略可能。

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::BufRead;

use crate::pose::{KeypointIndex, Pose};

#[derive(Debug, Clone, Deserialize)]
struct RawFrame {
    #[serde(default)]
    t_ms: Option<u64>,
    keypoints: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFrame {
    pub t_ms: Option<u64>,
    pub pose: Option<Pose>,
}

/// 1 行をパースする。空行は `Ok(None)`
pub fn parse_line(line: &str) -> Result<Option<ReplayFrame>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let raw: Option<RawFrame> = serde_json::from_str(line)?;
    let Some(raw) = raw else {
        return Ok(Some(ReplayFrame { t_ms: None, pose: None }));
    };
    let Some(pose) = Pose::from_triples(&raw.keypoints) else {
        bail!(
            "expected {} keypoints, got {}",
            KeypointIndex::COUNT,
            raw.keypoints.len()
        );
    };
    Ok(Some(ReplayFrame {
        t_ms: raw.t_ms,
        pose: Some(pose),
    }))
}

/// JSON Lines ストリームの全フレームを読む
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<ReplayFrame>> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(frame) = parse_line(&line).with_context(|| format!("line {}", i + 1))? {
            frames.push(frame);
        }
    }
    Ok(frames)
}

/// 各フレームの時刻 (ミリ秒) を決める
///
/// 時刻のないフレームは直前の時刻に `frame_ms` ずつ足して埋める。
/// 先頭の時刻なしフレームは最初の時刻から逆算する。
/// ストリーム全体に時刻がなければフレーム番号 × `frame_ms` を使う。
pub fn frame_times(frames: &[ReplayFrame], frame_ms: f32) -> Vec<u64> {
    let step = |n: usize| (n as f32 * frame_ms) as u64;

    let Some(first) = frames.iter().position(|f| f.t_ms.is_some()) else {
        return (0..frames.len()).map(step).collect();
    };
    let first_ms = frames[first].t_ms.unwrap_or_default();

    let mut times = Vec::with_capacity(frames.len());
    for i in 0..first {
        times.push(first_ms.saturating_sub(step(first - i)));
    }

    let mut last_ms = first_ms;
    let mut untimed = 0;
    for frame in &frames[first..] {
        match frame.t_ms {
            Some(t_ms) => {
                last_ms = t_ms;
                untimed = 0;
                times.push(t_ms);
            }
            None => {
                untimed += 1;
                times.push(last_ms.saturating_add(step(untimed)));
            }
        }
    }
    times
}

/// フレーム時刻を 1 秒単位のセッションティックに変換する
pub struct SecondClock {
    origin_ms: Option<u64>,
    emitted: u64,
}

impl SecondClock {
    pub fn new() -> Self {
        Self {
            origin_ms: None,
            emitted: 0,
        }
    }

    /// `t_ms` の時点で新たに発生した 1 秒ティックの数
    pub fn advance(&mut self, t_ms: u64) -> u64 {
        let origin = *self.origin_ms.get_or_insert(t_ms);
        let due = t_ms.saturating_sub(origin) / 1000;
        let ticks = due.saturating_sub(self.emitted);
        self.emitted += ticks;
        ticks
    }
}

impl Default for SecondClock {
    fn default() -> Self {
        Self::new()
    }
}

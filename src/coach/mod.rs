pub mod analyzer;
pub mod rules;
pub mod session;
pub mod smooth;
pub mod stabilizer;

pub use analyzer::{FrameAnalysis, FrameAnalyzer, Status};
pub use rules::{CorrectionCandidate, Rule, RuleSet, Severity, Side};
pub use session::{SessionAggregator, SessionMetrics};
pub use smooth::ScoreSmoother;
pub use stabilizer::{StabilizedSuggestion, Suggestion, SuggestionStabilizer};

use serde::Serialize;

use crate::config::Config;
use crate::pose::Pose;
use crate::record::SessionRecord;

/// 表示スコアの大まかな区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            85..=u8::MAX => ScoreBand::Good,
            60..=84 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

/// 1 フレーム処理後に表示側が必要とする結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub analysis: FrameAnalysis,
    /// フレームスコアの移動平均 (丸め済み)
    pub smoothed: u8,
    pub band: ScoreBand,
    pub suggestion: StabilizedSuggestion,
    /// 読み上げるメッセージ。提案が変わり、音声が有効なときのみ
    pub speech: Option<&'static str>,
}

/// 1 セッション分の状態。セッションごとに作り直す
pub struct CoachSession {
    analyzer: FrameAnalyzer,
    smoother: ScoreSmoother,
    stabilizer: SuggestionStabilizer,
    aggregator: SessionAggregator,
    config: Config,
    speech_enabled: bool,
}

impl CoachSession {
    pub fn new(config: &Config) -> Self {
        Self {
            analyzer: FrameAnalyzer::from_config(config),
            smoother: ScoreSmoother::from_config(&config.smoothing),
            stabilizer: SuggestionStabilizer::from_config(&config.stabilizer),
            aggregator: SessionAggregator::new(),
            config: config.clone(),
            speech_enabled: config.speech.enabled,
        }
    }

    /// 1 フレーム分のポーズ (または未検出) を処理する
    pub fn process(&mut self, pose: Option<&Pose>) -> TickReport {
        let analysis = self.analyzer.analyze(pose);
        let smoothed = self.smoother.push(analysis.score);
        self.aggregator.observe(smoothed);

        // ルールが評価できたフレームだけが提案を進める
        let suggestion = if analysis.status.is_tracked() {
            self.stabilizer.tick(analysis.top())
        } else {
            self.stabilizer.unchanged()
        };

        let speech = (suggestion.changed && self.speech_enabled)
            .then(|| suggestion.suggestion.message());

        TickReport {
            smoothed,
            band: ScoreBand::from_score(smoothed),
            analysis,
            suggestion,
            speech,
        }
    }

    /// セッション時計の 1 秒ティック
    pub fn tick_second(&mut self) -> &SessionMetrics {
        let smoothed = self.smoother.mean();
        let metrics = self.aggregator.record(smoothed, self.config.session.held_threshold);
        if metrics.held_seconds > 0 && metrics.held_seconds % 10 == 0 {
            tracing::info!(held_seconds = metrics.held_seconds, "pose held");
        }
        metrics
    }

    pub fn smoothed_score(&self) -> f32 {
        self.smoother.mean()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        self.aggregator.metrics()
    }

    pub fn record(&self) -> SessionRecord {
        self.aggregator.to_record()
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled
    }

    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.speech_enabled = enabled;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 設定と音声設定は残して履歴を空にする
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.stabilizer.reset();
        self.aggregator = SessionAggregator::new();
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::pose::{Keypoint, KeypointIndex, Pose};

    /// カメラに正対してまっすぐ立ち、腕を下ろした姿勢
    pub fn upright_pose() -> Pose {
        use KeypointIndex::*;
        let mut pose = Pose::default();
        let points = [
            (Nose, 320.0, 80.0),
            (LeftEye, 310.0, 70.0),
            (RightEye, 330.0, 70.0),
            (LeftEar, 300.0, 75.0),
            (RightEar, 340.0, 75.0),
            (LeftShoulder, 280.0, 150.0),
            (RightShoulder, 360.0, 150.0),
            (LeftElbow, 270.0, 230.0),
            (RightElbow, 370.0, 230.0),
            (LeftWrist, 260.0, 310.0),
            (RightWrist, 380.0, 310.0),
            (LeftHip, 290.0, 300.0),
            (RightHip, 350.0, 300.0),
            (LeftKnee, 290.0, 400.0),
            (RightKnee, 350.0, 400.0),
            (LeftAnkle, 290.0, 500.0),
            (RightAnkle, 350.0, 500.0),
        ];
        for (idx, x, y) in points {
            *pose.get_mut(idx) = Keypoint::new(x, y, 0.9);
        }
        pose
    }
}

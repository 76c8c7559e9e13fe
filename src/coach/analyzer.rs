use std::collections::BTreeSet;

use serde::Serialize;

use super::rules::{CorrectionCandidate, RuleSet, Severity, CORE_LANDMARKS};
use crate::config::{Config, PenaltyConfig};
use crate::pose::{KeypointIndex, Pose};

const FULL_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    PerfectAlignment,
    Adjusting,
    BodyNotVisible,
    PersonNotDetected,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::PerfectAlignment => "Perfect Alignment",
            Status::Adjusting => "Adjusting...",
            Status::BodyNotVisible => "Body out of frame",
            Status::PersonNotDetected => "Person not detected",
        }
    }

    /// このフレームでルールが評価されたか
    pub fn is_tracked(self) -> bool {
        matches!(self, Status::PerfectAlignment | Status::Adjusting)
    }
}

/// 1 ポーズをルールセットで評価した結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAnalysis {
    pub score: u8,
    pub status: Status,
    /// 緊急度の高い順、最大 `max_corrections` 件
    pub corrections: Vec<CorrectionCandidate>,
    /// 違反したルールの数 (`corrections` から切り捨てた分も含む)
    pub triggered: usize,
    pub affected: BTreeSet<KeypointIndex>,
    pub stability: u8,
    pub symmetry: u8,
}

impl FrameAnalysis {
    fn degraded(status: Status) -> Self {
        Self {
            score: 0,
            status,
            corrections: Vec::new(),
            triggered: 0,
            affected: BTreeSet::new(),
            stability: 0,
            symmetry: 0,
        }
    }

    pub fn not_detected() -> Self {
        Self::degraded(Status::PersonNotDetected)
    }

    pub fn body_not_visible() -> Self {
        Self::degraded(Status::BodyNotVisible)
    }

    pub fn top(&self) -> Option<&CorrectionCandidate> {
        self.corrections.first()
    }
}

impl PenaltyConfig {
    pub fn for_severity(&self, severity: Severity) -> u8 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Major => self.major,
            Severity::Minor => self.minor,
        }
    }
}

/// 100 から各コストを引く (0 で止まる)
fn deduct(costs: impl Iterator<Item = u8>) -> u8 {
    let total: u32 = costs.map(u32::from).sum();
    u32::from(FULL_SCORE).saturating_sub(total) as u8
}

pub struct FrameAnalyzer {
    rules: RuleSet,
    penalties: PenaltyConfig,
    min_confidence: f32,
    max_corrections: usize,
}

impl FrameAnalyzer {
    pub fn new(rules: RuleSet, penalties: PenaltyConfig, min_confidence: f32, max_corrections: usize) -> Self {
        Self {
            rules,
            penalties,
            min_confidence,
            max_corrections,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RuleSet::from_config(config),
            config.penalties,
            config.engine.min_confidence,
            config.engine.max_corrections,
        )
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// `None` はこのティックで人物が検出されなかったことを表す
    pub fn analyze(&self, pose: Option<&Pose>) -> FrameAnalysis {
        let Some(pose) = pose else {
            return FrameAnalysis::not_detected();
        };

        let view = pose.visible(self.min_confidence);
        if !view.all_visible(&CORE_LANDMARKS) {
            tracing::trace!("core landmarks hidden, skipping rules");
            return FrameAnalysis::body_not_visible();
        }

        let mut candidates = self.rules.evaluate(&view);
        // 安定ソート: 同順位はカタログ順のまま
        candidates.sort_by_key(|c| c.priority);

        let score = deduct(candidates.iter().map(|c| self.penalties.for_severity(c.severity)));
        let stability = deduct(candidates.iter().map(|c| c.rule.impact().stability));
        let symmetry = deduct(candidates.iter().map(|c| c.rule.impact().symmetry));
        let affected: BTreeSet<KeypointIndex> = candidates
            .iter()
            .flat_map(|c| c.affected.iter().copied())
            .collect();

        let triggered = candidates.len();
        let status = if triggered == 0 {
            Status::PerfectAlignment
        } else {
            Status::Adjusting
        };
        candidates.truncate(self.max_corrections);

        tracing::trace!(score, triggered, stability, symmetry, "frame analyzed");

        FrameAnalysis {
            score,
            status,
            corrections: candidates,
            triggered,
            affected,
            stability,
            symmetry,
        }
    }
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

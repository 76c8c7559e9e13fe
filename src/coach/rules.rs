//! 山のポーズのルールカタログ
//!
//! 各 [`Rule`] は [`VisiblePose`] から必要なキーポイントだけを読み、
//! どれかが見えなければ判定しない。ルール同士は互いを参照しないので
//! 評価順は任意。

use serde::{Serialize, Serializer};

use crate::config::{Config, ThresholdConfig};
use crate::pose::{angle_at, midpoint, KeypointIndex, VisiblePose};

use KeypointIndex::*;

/// ルール評価の前に見えている必要があるキーポイント
pub const CORE_LANDMARKS: [KeypointIndex; 4] = [LeftHip, RightHip, LeftShoulder, RightShoulder];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn leg(self) -> [KeypointIndex; 3] {
        match self {
            Side::Left => [LeftHip, LeftKnee, LeftAnkle],
            Side::Right => [RightHip, RightKnee, RightAnkle],
        }
    }

    fn arm(self) -> [KeypointIndex; 3] {
        match self {
            Side::Left => [LeftShoulder, LeftElbow, LeftWrist],
            Side::Right => [RightShoulder, RightElbow, RightWrist],
        }
    }
}

/// 違反時に安定性・対称性スコアから引く量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Impact {
    pub stability: u8,
    pub symmetry: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    KneeStraightness(Side),
    HipLevel,
    SpinalAlignment,
    StanceWidth,
    WeightBalance,
    ShoulderLevel,
    HeadCentering,
    ArmStraightness(Side),
}

/// 1 フレームに対する 1 ルールの判定結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionCandidate {
    pub rule: Rule,
    pub message: &'static str,
    pub severity: Severity,
    pub priority: u8,
    pub affected: &'static [KeypointIndex],
}

impl Rule {
    /// 固定の識別子 (シリアライズにも使う)
    pub fn id(self) -> &'static str {
        match self {
            Rule::KneeStraightness(Side::Left) => "knee_left",
            Rule::KneeStraightness(Side::Right) => "knee_right",
            Rule::HipLevel => "hip_level",
            Rule::SpinalAlignment => "spinal_alignment",
            Rule::StanceWidth => "stance_width",
            Rule::WeightBalance => "weight_balance",
            Rule::ShoulderLevel => "shoulder_level",
            Rule::HeadCentering => "head_centering",
            Rule::ArmStraightness(Side::Left) => "arm_left",
            Rule::ArmStraightness(Side::Right) => "arm_right",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Rule::KneeStraightness(_) | Rule::HipLevel | Rule::SpinalAlignment => Severity::Critical,
            Rule::StanceWidth | Rule::WeightBalance => Severity::Major,
            Rule::ShoulderLevel | Rule::HeadCentering | Rule::ArmStraightness(_) => Severity::Minor,
        }
    }

    /// 小さいほど緊急
    pub fn priority(self) -> u8 {
        match self {
            Rule::KneeStraightness(_) => 1,
            Rule::HipLevel => 2,
            Rule::SpinalAlignment => 3,
            Rule::StanceWidth => 4,
            Rule::WeightBalance => 5,
            Rule::ShoulderLevel => 6,
            Rule::HeadCentering => 7,
            Rule::ArmStraightness(_) => 8,
        }
    }

    pub fn affected(self) -> &'static [KeypointIndex] {
        match self {
            Rule::KneeStraightness(Side::Left) => &[LeftKnee],
            Rule::KneeStraightness(Side::Right) => &[RightKnee],
            Rule::HipLevel => &[LeftHip, RightHip],
            Rule::SpinalAlignment | Rule::ShoulderLevel => &[LeftShoulder, RightShoulder],
            Rule::StanceWidth | Rule::WeightBalance => &[LeftAnkle, RightAnkle],
            Rule::HeadCentering => &[Nose],
            Rule::ArmStraightness(Side::Left) => &[LeftElbow],
            Rule::ArmStraightness(Side::Right) => &[RightElbow],
        }
    }

    pub fn impact(self) -> Impact {
        match self {
            Rule::KneeStraightness(_) => Impact { stability: 15, symmetry: 0 },
            Rule::SpinalAlignment | Rule::StanceWidth | Rule::WeightBalance => {
                Impact { stability: 10, symmetry: 0 }
            }
            Rule::HipLevel => Impact { stability: 0, symmetry: 20 },
            Rule::ShoulderLevel | Rule::HeadCentering => Impact { stability: 0, symmetry: 10 },
            Rule::ArmStraightness(_) => Impact::default(),
        }
    }

    /// 違反していれば候補を返す。問題なし、または入力が見えなければ None
    pub fn evaluate(self, pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<CorrectionCandidate> {
        let message = match self {
            Rule::KneeStraightness(side) => check_knee(side, pose, th),
            Rule::HipLevel => check_hip_level(pose, th),
            Rule::SpinalAlignment => check_spine(pose, th),
            Rule::StanceWidth => check_stance(pose, th),
            Rule::WeightBalance => check_weight_balance(pose, th),
            Rule::ShoulderLevel => check_shoulder_level(pose, th),
            Rule::HeadCentering => check_head(pose, th),
            Rule::ArmStraightness(side) => check_arm(side, pose, th),
        }?;
        Some(CorrectionCandidate {
            rule: self,
            message,
            severity: self.severity(),
            priority: self.priority(),
            affected: self.affected(),
        })
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

fn vertical_offset(pose: &VisiblePose<'_>, a: KeypointIndex, b: KeypointIndex) -> Option<f32> {
    Some((pose.get(a)?.y - pose.get(b)?.y).abs())
}

fn check_knee(side: Side, pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let [hip, knee, ankle] = side.leg();
    let angle = angle_at(pose.get(hip)?, pose.get(knee)?, pose.get(ankle)?);
    let message = match side {
        Side::Left => "Straighten left knee",
        Side::Right => "Straighten right knee",
    };
    (angle < th.knee_min_angle).then_some(message)
}

fn check_hip_level(pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let diff = vertical_offset(pose, LeftHip, RightHip)?;
    (diff > th.hip_level_px).then_some("Level your hips")
}

fn check_spine(pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let (hip_x, _) = midpoint(pose.get(LeftHip)?, pose.get(RightHip)?);
    let (shoulder_x, _) = midpoint(pose.get(LeftShoulder)?, pose.get(RightShoulder)?);
    ((shoulder_x - hip_x).abs() > th.spine_offset_px).then_some("Align shoulders over hips")
}

fn check_stance(pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let hip_width = (pose.get(LeftHip)?.x - pose.get(RightHip)?.x).abs();
    if hip_width <= f32::EPSILON {
        return None;
    }
    let ankle_width = (pose.get(LeftAnkle)?.x - pose.get(RightAnkle)?.x).abs();
    let ratio = ankle_width / hip_width;
    if ratio < th.stance_min_ratio {
        Some("Widen stance slightly for stability")
    } else if ratio > th.stance_max_ratio {
        Some("Bring your feet closer together")
    } else {
        None
    }
}

fn check_weight_balance(pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let diff = vertical_offset(pose, LeftAnkle, RightAnkle)?;
    (diff > th.ankle_level_px).then_some("Balance weight evenly on both feet")
}

fn check_shoulder_level(pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let diff = vertical_offset(pose, LeftShoulder, RightShoulder)?;
    (diff > th.shoulder_level_px).then_some("Relax and level your shoulders")
}

fn check_head(pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let nose = pose.get(Nose)?;
    let (shoulder_x, _) = midpoint(pose.get(LeftShoulder)?, pose.get(RightShoulder)?);
    ((nose.x - shoulder_x).abs() > th.head_offset_px).then_some("Center your head")
}

fn check_arm(side: Side, pose: &VisiblePose<'_>, th: &ThresholdConfig) -> Option<&'static str> {
    let [shoulder, elbow, wrist] = side.arm();
    let angle = angle_at(pose.get(shoulder)?, pose.get(elbow)?, pose.get(wrist)?);
    let message = match side {
        Side::Left => "Extend your left arm down",
        Side::Right => "Extend your right arm down",
    };
    (angle < th.arm_min_angle).then_some(message)
}

/// ルールの順序付きリストと判定に使う閾値
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    thresholds: ThresholdConfig,
}

impl RuleSet {
    /// 腕のチェックを除いたカタログ
    pub const STANDARD: [Rule; 8] = [
        Rule::KneeStraightness(Side::Left),
        Rule::KneeStraightness(Side::Right),
        Rule::HipLevel,
        Rule::SpinalAlignment,
        Rule::StanceWidth,
        Rule::WeightBalance,
        Rule::ShoulderLevel,
        Rule::HeadCentering,
    ];

    pub fn new(rules: Vec<Rule>, thresholds: ThresholdConfig) -> Self {
        Self { rules, thresholds }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut rules = Self::STANDARD.to_vec();
        if config.engine.check_arms {
            rules.push(Rule::ArmStraightness(Side::Left));
            rules.push(Rule::ArmStraightness(Side::Right));
        }
        Self::new(rules, config.thresholds.clone())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// 違反した全ルールの候補 (カタログ順)
    pub fn evaluate(&self, pose: &VisiblePose<'_>) -> Vec<CorrectionCandidate> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(pose, &self.thresholds))
            .collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::testutil::upright_pose;
    use crate::pose::Keypoint;

    const MIN_CONF: f32 = 0.35;

    fn eval(rule: Rule, pose: &crate::pose::Pose) -> Option<CorrectionCandidate> {
        rule.evaluate(&pose.visible(MIN_CONF), &ThresholdConfig::default())
    }

    #[test]
    fn test_upright_pose_passes_every_rule() {
        let pose = upright_pose();
        let mut all = RuleSet::STANDARD.to_vec();
        all.push(Rule::ArmStraightness(Side::Left));
        all.push(Rule::ArmStraightness(Side::Right));
        for rule in all {
            assert_eq!(eval(rule, &pose), None, "{} fired on upright pose", rule.id());
        }
    }

    #[test]
    fn test_bent_knee() {
        let mut pose = upright_pose();
        // 膝を前に出す: 約 180 - 2*atan(40/100) ≈ 136度
        pose.get_mut(LeftKnee).x += 40.0;
        let c = eval(Rule::KneeStraightness(Side::Left), &pose).unwrap();
        assert_eq!(c.message, "Straighten left knee");
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.affected, &[LeftKnee]);
        assert_eq!(eval(Rule::KneeStraightness(Side::Right), &pose), None);
    }

    #[test]
    fn test_hip_level() {
        let mut pose = upright_pose();
        pose.get_mut(RightHip).y += 40.0;
        let c = eval(Rule::HipLevel, &pose).unwrap();
        assert_eq!(c.message, "Level your hips");
        assert!(c.affected.contains(&LeftHip));
        assert!(c.affected.contains(&RightHip));

        let mut pose = upright_pose();
        pose.get_mut(RightHip).y += 25.0;
        assert_eq!(eval(Rule::HipLevel, &pose), None);
    }

    #[test]
    fn test_spinal_alignment() {
        let mut pose = upright_pose();
        pose.get_mut(LeftShoulder).x += 35.0;
        pose.get_mut(RightShoulder).x += 35.0;
        let c = eval(Rule::SpinalAlignment, &pose).unwrap();
        assert_eq!(c.severity, Severity::Critical);
    }

    #[test]
    fn test_stance_too_narrow_and_too_wide() {
        let mut pose = upright_pose();
        pose.get_mut(LeftAnkle).x = 310.0;
        pose.get_mut(RightAnkle).x = 330.0;
        let c = eval(Rule::StanceWidth, &pose).unwrap();
        assert_eq!(c.message, "Widen stance slightly for stability");
        assert_eq!(c.severity, Severity::Major);

        let mut pose = upright_pose();
        pose.get_mut(LeftAnkle).x = 200.0;
        pose.get_mut(RightAnkle).x = 440.0;
        let c = eval(Rule::StanceWidth, &pose).unwrap();
        assert_eq!(c.message, "Bring your feet closer together");
    }

    #[test]
    fn test_stance_abstains_on_zero_hip_width() {
        let mut pose = upright_pose();
        pose.get_mut(RightHip).x = pose.get(LeftHip).x;
        assert_eq!(eval(Rule::StanceWidth, &pose), None);
    }

    #[test]
    fn test_weight_balance() {
        let mut pose = upright_pose();
        pose.get_mut(LeftAnkle).y -= 20.0;
        let c = eval(Rule::WeightBalance, &pose).unwrap();
        assert_eq!(c.severity, Severity::Major);
        assert_eq!(c.affected, &[LeftAnkle, RightAnkle]);
    }

    #[test]
    fn test_shoulder_level() {
        let mut pose = upright_pose();
        pose.get_mut(LeftShoulder).y -= 21.0;
        let c = eval(Rule::ShoulderLevel, &pose).unwrap();
        assert_eq!(c.severity, Severity::Minor);
    }

    #[test]
    fn test_head_centering_and_abstain() {
        let mut pose = upright_pose();
        pose.get_mut(Nose).x += 30.0;
        let c = eval(Rule::HeadCentering, &pose).unwrap();
        assert_eq!(c.message, "Center your head");

        pose.get_mut(Nose).confidence = 0.1;
        assert_eq!(eval(Rule::HeadCentering, &pose), None);
    }

    #[test]
    fn test_bent_arm() {
        let mut pose = upright_pose();
        *pose.get_mut(RightWrist) = Keypoint::new(430.0, 230.0, 0.9);
        let c = eval(Rule::ArmStraightness(Side::Right), &pose).unwrap();
        assert_eq!(c.affected, &[RightElbow]);
        assert_eq!(c.severity, Severity::Minor);
    }

    #[test]
    fn test_rules_abstain_on_hidden_inputs() {
        let mut pose = upright_pose();
        pose.get_mut(LeftKnee).x += 40.0;
        pose.get_mut(LeftKnee).confidence = 0.2;
        assert_eq!(eval(Rule::KneeStraightness(Side::Left), &pose), None);
    }

    #[test]
    fn test_priority_follows_severity() {
        for a in RuleSet::STANDARD {
            for b in RuleSet::STANDARD {
                if a.severity() < b.severity() {
                    assert!(a.priority() < b.priority(), "{} vs {}", a.id(), b.id());
                }
            }
        }
    }

    #[test]
    fn test_rule_set_from_config() {
        let mut config = Config::default();
        assert_eq!(RuleSet::from_config(&config).rules().len(), 8);
        config.engine.check_arms = true;
        let set = RuleSet::from_config(&config);
        assert_eq!(set.rules().len(), 10);
        assert!(set.rules().contains(&Rule::ArmStraightness(Side::Left)));
    }

    #[test]
    fn test_evaluation_is_order_independent() {
        let mut pose = upright_pose();
        pose.get_mut(RightHip).y += 40.0;
        pose.get_mut(Nose).x += 30.0;
        pose.get_mut(LeftAnkle).y -= 20.0;

        let forward = RuleSet::default();
        let mut reversed_rules = RuleSet::STANDARD.to_vec();
        reversed_rules.reverse();
        let reversed = RuleSet::new(reversed_rules, ThresholdConfig::default());

        let view = pose.visible(MIN_CONF);
        let mut a: Vec<_> = forward.evaluate(&view).into_iter().map(|c| c.rule.id()).collect();
        let mut b: Vec<_> = reversed.evaluate(&view).into_iter().map(|c| c.rule.id()).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_rule_serializes_as_id() {
        let json = serde_json::to_string(&Rule::KneeStraightness(Side::Right)).unwrap();
        assert_eq!(json, "\"knee_right\"");
    }
}

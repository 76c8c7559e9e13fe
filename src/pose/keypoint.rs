use serde::{Deserialize, Serialize};

/// MoveNet の 17 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub const ALL: [KeypointIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// ポーズ検出器と同じ snake_case 名 (例: "left_hip")
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// 単一キーポイント
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    /// X座標 (ピクセル)
    pub x: f32,
    /// Y座標 (ピクセル, 下向きが正)
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値を超えているか (閾値ちょうどは不可視扱い)
    pub fn is_visible(&self, min_confidence: f32) -> bool {
        self.confidence > min_confidence
    }
}

/// 17キーポイントからなる姿勢 (1フレーム分)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// `[x, y, confidence]` の配列から作成。長さが17でなければ None
    pub fn from_triples(triples: &[[f32; 3]]) -> Option<Self> {
        if triples.len() != KeypointIndex::COUNT {
            return None;
        }
        let keypoints = std::array::from_fn(|i| {
            let [x, y, c] = triples[i];
            Keypoint::new(x, y, c)
        });
        Some(Self { keypoints })
    }

    /// インデックスでキーポイントを取得
    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// インデックスでキーポイントを可変取得
    pub fn get_mut(&mut self, index: KeypointIndex) -> &mut Keypoint {
        &mut self.keypoints[index as usize]
    }

    /// 信頼度ゲート付きビュー
    pub fn visible(&self, min_confidence: f32) -> VisiblePose<'_> {
        VisiblePose {
            pose: self,
            min_confidence,
        }
    }
}

/// 信頼度が閾値を超えるキーポイントだけを返すビュー
#[derive(Debug, Clone, Copy)]
pub struct VisiblePose<'a> {
    pose: &'a Pose,
    min_confidence: f32,
}

impl<'a> VisiblePose<'a> {
    pub fn get(&self, index: KeypointIndex) -> Option<&'a Keypoint> {
        let kp = self.pose.get(index);
        kp.is_visible(self.min_confidence).then_some(kp)
    }

    /// 全て可視なら true
    pub fn all_visible(&self, indices: &[KeypointIndex]) -> bool {
        indices.iter().all(|&i| self.get(i).is_some())
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }
}

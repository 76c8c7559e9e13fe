#![allow(dead_code)]

use tadasana_coach::pose::{Keypoint, KeypointIndex, Pose};

/// 640x480 ピクセル空間での正しい山のポーズ
pub fn upright_pose() -> Pose {
    use KeypointIndex::*;
    let mut pose = Pose::default();
    for (idx, x, y) in [
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
        (LeftAnkle, 290.0, 460.0),
        (RightAnkle, 350.0, 460.0),
    ] {
        *pose.get_mut(idx) = Keypoint::new(x, y, 0.9);
    }
    pose
}

pub fn with_dropped_hip(mut pose: Pose) -> Pose {
    pose.get_mut(KeypointIndex::RightHip).y += 40.0;
    pose
}

pub fn with_bent_knee(mut pose: Pose) -> Pose {
    pose.get_mut(KeypointIndex::LeftKnee).x += 40.0;
    pose
}

/// 腰が下がり、両膝が曲がり、頭が中心からずれた姿勢 (スコア 48)
pub fn slouched() -> Pose {
    let mut pose = with_bent_knee(with_dropped_hip(upright_pose()));
    pose.get_mut(KeypointIndex::RightKnee).x -= 40.0;
    pose.get_mut(KeypointIndex::Nose).x += 30.0;
    pose
}

/// 再生形式の JSON 1 行
pub fn frame_line(pose: Option<&Pose>, t_ms: u64) -> String {
    match pose {
        None => "null".to_string(),
        Some(p) => {
            let kps: Vec<[f32; 3]> = p.keypoints.iter().map(|k| [k.x, k.y, k.confidence]).collect();
            serde_json::json!({ "t_ms": t_ms, "keypoints": kps }).to_string()
        }
    }
}

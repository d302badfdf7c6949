use serde::{Deserialize, Serialize};
use std::fmt;

use super::angle::calculate_angle;
use crate::pose::{landmark_at, Landmark, LandmarkIndex};

/// 計測対象の関節
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointName {
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
    LeftAnkle,
    RightAnkle,
}

impl JointName {
    pub const ALL: [JointName; 6] = [
        JointName::LeftKnee,
        JointName::RightKnee,
        JointName::LeftHip,
        JointName::RightHip,
        JointName::LeftAnkle,
        JointName::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JointName::LeftKnee => "left_knee",
            JointName::RightKnee => "right_knee",
            JointName::LeftHip => "left_hip",
            JointName::RightHip => "right_hip",
            JointName::LeftAnkle => "left_ankle",
            JointName::RightAnkle => "right_ankle",
        }
    }

    /// (近位, 頂点, 遠位) のランドマーク
    ///
    /// 膝 = 腰-膝-足首, 股関節 = 肩-腰-膝, 足首 = 膝-足首-踵
    pub fn triple(&self) -> (LandmarkIndex, LandmarkIndex, LandmarkIndex) {
        use LandmarkIndex::*;
        match self {
            JointName::LeftKnee => (LeftHip, LeftKnee, LeftAnkle),
            JointName::RightKnee => (RightHip, RightKnee, RightAnkle),
            JointName::LeftHip => (LeftShoulder, LeftHip, LeftKnee),
            JointName::RightHip => (RightShoulder, RightHip, RightKnee),
            JointName::LeftAnkle => (LeftKnee, LeftAnkle, LeftHeel),
            JointName::RightAnkle => (RightKnee, RightAnkle, RightHeel),
        }
    }

    pub fn is_knee(&self) -> bool {
        matches!(self, JointName::LeftKnee | JointName::RightKnee)
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 関節角度の計測値
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngle {
    #[serde(rename = "joint")]
    pub joint_name: JointName,
    /// 角度（度、0〜180）
    #[serde(rename = "angle")]
    pub angle_degrees: f32,
    /// 頂点ランドマークの可視性
    pub confidence: f32,
}

/// 1関節の角度を計算。ランドマークが足りなければ None
pub fn joint_angle(landmarks: &[Landmark], joint: JointName) -> Option<JointAngle> {
    let (p1, p2, p3) = joint.triple();
    let proximal = landmark_at(landmarks, p1)?;
    let vertex = landmark_at(landmarks, p2)?;
    let distal = landmark_at(landmarks, p3)?;

    Some(JointAngle {
        joint_name: joint,
        angle_degrees: calculate_angle(proximal.planar(), vertex.planar(), distal.planar()),
        confidence: vertex.visibility,
    })
}

/// 6関節すべての角度を計算
///
/// ランドマーク列が短い場合は計算できた関節だけを返す（`JointName::ALL` の順）。
pub fn extract_joint_angles(landmarks: &[Landmark]) -> Vec<JointAngle> {
    let angles: Vec<JointAngle> = JointName::ALL
        .iter()
        .filter_map(|&joint| joint_angle(landmarks, joint))
        .collect();

    if angles.len() < JointName::ALL.len() {
        let missing: Vec<&str> = JointName::ALL
            .iter()
            .filter(|joint| !angles.iter().any(|a| a.joint_name == **joint))
            .map(|joint| joint.as_str())
            .collect();
        tracing::warn!(
            landmarks = landmarks.len(),
            "omitting joint angles with missing landmarks: {}",
            missing.join(", ")
        );
    }

    angles
}

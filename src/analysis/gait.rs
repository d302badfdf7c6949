use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::AnalysisConfig;
use crate::pose::{landmark_at, Landmark, LandmarkIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// 1フレームから推定する歩行相
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaitPhase {
    /// 両足が同じ高さ（両脚支持）
    DoubleSupport,
    /// 左足が浮いている
    LeftSwing,
    /// 右足が浮いている
    RightSwing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitMetrics {
    /// 左右つま先間の距離（正規化座標）
    pub step_length: f32,
    /// 歩/分。歩数が2未満の間は None
    pub cadence: Option<f32>,
    /// 1 - |左膝y - 右膝y| を [0, 1] に制限
    pub symmetry_score: f32,
    pub gait_phase: GaitPhase,
    /// これまでに検出した歩数
    pub step_count: u64,
    pub frame_id: u64,
    pub timestamp: f64,
}

/// フレームごとの歩行サマリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GaitSummary {
    Measured(GaitMetrics),
    InsufficientData { reason: String },
}

impl GaitSummary {
    pub fn metrics(&self) -> Option<&GaitMetrics> {
        match self {
            GaitSummary::Measured(m) => Some(m),
            GaitSummary::InsufficientData { .. } => None,
        }
    }

    pub fn symmetry_score(&self) -> Option<f32> {
        self.metrics().map(|m| m.symmetry_score)
    }
}

/// 左右膝の高さから求める対称性スコア。膝がなければ None
pub fn symmetry_score(landmarks: &[Landmark]) -> Option<f32> {
    let left_knee = landmark_at(landmarks, LandmarkIndex::LeftKnee)?;
    let right_knee = landmark_at(landmarks, LandmarkIndex::RightKnee)?;
    Some((1.0 - (left_knee.y - right_knee.y).abs()).clamp(0.0, 1.0))
}

/// 足の高さから歩行相を判定
///
/// 画像座標は下向きが +y なので、y が小さい方の足が浮いている。
pub fn detect_gait_phase(left_foot: &Landmark, right_foot: &Landmark, contact_tolerance: f32) -> GaitPhase {
    let dy = left_foot.y - right_foot.y;
    if dy.abs() <= contact_tolerance {
        GaitPhase::DoubleSupport
    } else if dy < 0.0 {
        GaitPhase::LeftSwing
    } else {
        GaitPhase::RightSwing
    }
}

/// 歩行解析器
///
/// 先行足（横方向で前にある足）の入れ替わりを1歩として数え、
/// 直近の歩の間隔からケイデンスを求める。カメラは進行方向の側方にある前提。
pub struct GaitAnalyzer {
    contact_tolerance: f32,
    separation_threshold: f32,
    cadence_window: usize,
    leading: Option<Side>,
    step_times: VecDeque<f64>,
    step_count: u64,
}

impl GaitAnalyzer {
    pub fn new(contact_tolerance: f32, separation_threshold: f32, cadence_window: usize) -> Self {
        Self {
            contact_tolerance,
            separation_threshold,
            cadence_window: cadence_window.max(2),
            leading: None,
            step_times: VecDeque::new(),
            step_count: 0,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.foot_contact_tolerance,
            config.step_separation_threshold,
            config.cadence_window,
        )
    }

    /// 1フレーム分のランドマークを解析
    pub fn analyze(&mut self, landmarks: &[Landmark], frame_id: u64, timestamp: f64) -> GaitSummary {
        let feet = (
            landmark_at(landmarks, LandmarkIndex::LeftFootIndex),
            landmark_at(landmarks, LandmarkIndex::RightFootIndex),
        );
        let (left_foot, right_foot) = match feet {
            (Some(l), Some(r)) => (l, r),
            _ => {
                tracing::debug!(frame_id, landmarks = landmarks.len(), "foot landmarks missing");
                return GaitSummary::InsufficientData {
                    reason: "Insufficient landmark data".to_string(),
                };
            }
        };

        self.track_steps(left_foot, right_foot, timestamp);

        GaitSummary::Measured(GaitMetrics {
            step_length: left_foot.planar_distance(right_foot),
            cadence: self.cadence(),
            // 膝 (25, 26) は足先 (31, 32) より前のインデックスなので常に存在する
            symmetry_score: symmetry_score(landmarks).unwrap_or(0.5),
            gait_phase: detect_gait_phase(left_foot, right_foot, self.contact_tolerance),
            step_count: self.step_count,
            frame_id,
            timestamp,
        })
    }

    /// 先行足が入れ替わったら1歩として記録
    fn track_steps(&mut self, left_foot: &Landmark, right_foot: &Landmark, timestamp: f64) {
        let separation = left_foot.x - right_foot.x;
        let side = if separation > self.separation_threshold {
            Some(Side::Left)
        } else if separation < -self.separation_threshold {
            Some(Side::Right)
        } else {
            // ヒステリシス帯の中では判定を保留
            None
        };

        let Some(side) = side else { return };
        match self.leading {
            Some(prev) if prev != side => {
                self.step_count += 1;
                self.step_times.push_back(timestamp);
                while self.step_times.len() > self.cadence_window {
                    self.step_times.pop_front();
                }
            }
            _ => {}
        }
        self.leading = Some(side);
    }

    /// 直近の歩の平均間隔から歩/分を計算
    pub fn cadence(&self) -> Option<f32> {
        let first = *self.step_times.front()?;
        let last = *self.step_times.back()?;
        let intervals = self.step_times.len().checked_sub(1).filter(|&n| n > 0)?;
        let span = last - first;
        if span <= 0.0 {
            return None;
        }
        Some((60.0 * intervals as f64 / span) as f32)
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn reset(&mut self) {
        self.leading = None;
        self.step_times.clear();
        self.step_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{set, standing_pose};

    fn analyzer() -> GaitAnalyzer {
        GaitAnalyzer::from_config(&AnalysisConfig::default())
    }

    /// Standing pose with the feet placed at the given x offsets from 0.5.
    fn stride_pose(left_dx: f32, right_dx: f32) -> Vec<Landmark> {
        let mut lm = standing_pose();
        set(&mut lm, LandmarkIndex::LeftFootIndex, 0.5 + left_dx, 0.93, 0.8);
        set(&mut lm, LandmarkIndex::RightFootIndex, 0.5 + right_dx, 0.93, 0.8);
        lm
    }

    #[test]
    fn test_step_length_is_foot_distance() {
        let mut lm = standing_pose();
        set(&mut lm, LandmarkIndex::LeftFootIndex, 0.4, 0.9, 0.8);
        set(&mut lm, LandmarkIndex::RightFootIndex, 0.7, 0.5, 0.8);
        let summary = analyzer().analyze(&lm, 3, 0.1);
        let m = summary.metrics().unwrap();
        assert!((m.step_length - 0.5).abs() < 1e-5);
        assert_eq!(m.frame_id, 3);
        assert_eq!(m.timestamp, 0.1);
    }

    #[test]
    fn test_symmetry_score() {
        let mut lm = standing_pose();
        assert_eq!(symmetry_score(&lm), Some(1.0));
        set(&mut lm, LandmarkIndex::LeftKnee, 0.45, 0.6, 0.8);
        set(&mut lm, LandmarkIndex::RightKnee, 0.55, 0.85, 0.8);
        assert!((symmetry_score(&lm).unwrap() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_symmetry_score_clamped() {
        let mut lm = standing_pose();
        set(&mut lm, LandmarkIndex::LeftKnee, 0.45, -0.5, 0.8);
        set(&mut lm, LandmarkIndex::RightKnee, 0.55, 1.2, 0.8);
        assert_eq!(symmetry_score(&lm), Some(0.0));
    }

    #[test]
    fn test_missing_feet_is_insufficient_data() {
        let lm = standing_pose();
        let summary = analyzer().analyze(&lm[..32], 0, 0.0);
        assert!(matches!(summary, GaitSummary::InsufficientData { .. }));
        assert_eq!(summary.symmetry_score(), None);
    }

    #[test]
    fn test_gait_phase() {
        let planted = Landmark::new(0.5, 0.9, 0.0, 1.0);
        let lifted = Landmark::new(0.5, 0.8, 0.0, 1.0);
        assert_eq!(detect_gait_phase(&planted, &planted, 0.02), GaitPhase::DoubleSupport);
        assert_eq!(detect_gait_phase(&lifted, &planted, 0.02), GaitPhase::LeftSwing);
        assert_eq!(detect_gait_phase(&planted, &lifted, 0.02), GaitPhase::RightSwing);
    }

    #[test]
    fn test_no_cadence_before_two_steps() {
        let mut gait = analyzer();
        let s = gait.analyze(&stride_pose(0.1, -0.1), 0, 0.0);
        assert_eq!(s.metrics().unwrap().cadence, None);
        // first switch is one step: still no interval
        let s = gait.analyze(&stride_pose(-0.1, 0.1), 1, 0.5);
        assert_eq!(s.metrics().unwrap().step_count, 1);
        assert_eq!(s.metrics().unwrap().cadence, None);
    }

    #[test]
    fn test_cadence_from_alternating_feet() {
        let mut gait = analyzer();
        // leading foot switches every 0.5s -> 120 steps/min
        let mut last = None;
        for i in 0..6u64 {
            let lm = if i % 2 == 0 { stride_pose(0.1, -0.1) } else { stride_pose(-0.1, 0.1) };
            last = Some(gait.analyze(&lm, i, i as f64 * 0.5));
        }
        let summary = last.unwrap();
        let m = summary.metrics().unwrap();
        assert_eq!(m.step_count, 5);
        assert!((m.cadence.unwrap() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_hysteresis_ignores_small_separation() {
        let mut gait = analyzer();
        gait.analyze(&stride_pose(0.1, -0.1), 0, 0.0);
        // feet pass each other but stay inside the band
        gait.analyze(&stride_pose(0.01, -0.01), 1, 0.1);
        gait.analyze(&stride_pose(-0.01, 0.01), 2, 0.2);
        assert_eq!(gait.step_count(), 0);
        gait.analyze(&stride_pose(-0.1, 0.1), 3, 0.3);
        assert_eq!(gait.step_count(), 1);
    }

    #[test]
    fn test_reset() {
        let mut gait = analyzer();
        gait.analyze(&stride_pose(0.1, -0.1), 0, 0.0);
        gait.analyze(&stride_pose(-0.1, 0.1), 1, 0.5);
        gait.reset();
        assert_eq!(gait.step_count(), 0);
        assert_eq!(gait.cadence(), None);
    }

    #[test]
    fn test_serialized_tag() {
        let summary = GaitSummary::InsufficientData {
            reason: "Insufficient landmark data".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "insufficient_data");

        let summary = analyzer().analyze(&standing_pose(), 7, 1.0);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "measured");
        assert_eq!(json["gait_phase"], "double_support");
        assert_eq!(json["frame_id"], 7);
        assert!(json["cadence"].is_null());
    }
}

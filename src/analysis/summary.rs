use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::joints::JointName;
use super::risk::{RiskAssessment, RiskAssessor};
use crate::session::{wall_clock_secs, AnalysisType, FrameResult, History};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomechanicalAssessment {
    #[serde(flatten)]
    pub risk: RiskAssessment,
    /// 評価を行った時刻（UNIX秒）
    pub assessment_timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSummary {
    /// 角度が得られたフレームだけで平均した関節角度（度）
    pub average_joint_angles: BTreeMap<JointName, f32>,
    pub total_poses_detected: usize,
    pub analysis_type: AnalysisType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveAnalysis {
    pub total_frames: usize,
    /// 最初と最後のフレームのタイムスタンプ差（秒）
    pub analysis_duration: f64,
    pub biomechanical_assessment: BiomechanicalAssessment,
    pub motion_summary: MotionSummary,
}

/// 履歴全体の集計結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisSummary {
    NoData { error: String },
    Complete(ComprehensiveAnalysis),
}

impl AnalysisSummary {
    pub fn report(&self) -> Option<&ComprehensiveAnalysis> {
        match self {
            AnalysisSummary::Complete(report) => Some(report),
            AnalysisSummary::NoData { .. } => None,
        }
    }
}

/// 関節ごとの平均角度。その関節の角度を持つフレームのみを使う
pub fn average_joint_angles(frames: &[FrameResult]) -> BTreeMap<JointName, f32> {
    let mut sums: BTreeMap<JointName, (f64, usize)> = BTreeMap::new();
    for angle in frames.iter().flat_map(|f| f.joint_angles.iter()) {
        let entry = sums.entry(angle.joint_name).or_insert((0.0, 0));
        entry.0 += angle.angle_degrees as f64;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(joint, (sum, count))| (joint, (sum / count as f64) as f32))
        .collect()
}

/// 履歴を集計してリスク評価と運動サマリを作る
pub fn summarize(history: &History, risk: &RiskAssessor, analysis_type: AnalysisType) -> AnalysisSummary {
    if history.is_empty() {
        return AnalysisSummary::NoData {
            error: "No motion data available".to_string(),
        };
    }

    let frames = history.frames();
    let assessment = risk.assess(frames);
    tracing::info!(
        frames = frames.len(),
        risk_score = assessment.risk_score,
        "risk factors: {:?}",
        assessment.risk_factors
    );

    AnalysisSummary::Complete(ComprehensiveAnalysis {
        total_frames: frames.len(),
        analysis_duration: history.duration(),
        biomechanical_assessment: BiomechanicalAssessment {
            risk: assessment,
            assessment_timestamp: wall_clock_secs(),
        },
        motion_summary: MotionSummary {
            average_joint_angles: average_joint_angles(frames),
            total_poses_detected: frames.iter().filter(|f| f.has_pose()).count(),
            analysis_type,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::joints::{extract_joint_angles, JointAngle};
    use crate::config::AnalysisConfig;
    use crate::test_support::pose_with_knee_angle;

    fn detected(frame_id: u64, knee_angle: f32) -> FrameResult {
        let landmarks = pose_with_knee_angle(knee_angle);
        FrameResult {
            frame_id,
            timestamp: frame_id as f64,
            joint_angles: extract_joint_angles(&landmarks),
            landmarks: Some(landmarks),
            gait: None,
        }
    }

    fn history(frames: Vec<FrameResult>) -> History {
        let mut h = History::new();
        for f in frames {
            h.push(f);
        }
        h
    }

    fn assessor() -> RiskAssessor {
        RiskAssessor::from_config(&AnalysisConfig::default())
    }

    #[test]
    fn test_empty_history_is_no_data() {
        let summary = summarize(&History::new(), &assessor(), AnalysisType::GaitAnalysis);
        match summary {
            AnalysisSummary::NoData { error } => assert_eq!(error, "No motion data available"),
            other => panic!("expected NoData, got {:?}", other),
        }
    }

    #[test]
    fn test_average_skips_frames_without_joint() {
        let mut partial = detected(1, 100.0);
        partial.joint_angles.retain(|a| a.joint_name != JointName::LeftKnee);
        let frames = vec![detected(0, 170.0), partial, FrameResult::empty(2, 2.0), detected(3, 150.0)];

        let avg = average_joint_angles(&frames);
        assert!((avg[&JointName::LeftKnee] - 160.0).abs() < 0.01);
        // right knee seen in three frames
        assert!((avg[&JointName::RightKnee] - 140.0).abs() < 0.01);
    }

    #[test]
    fn test_average_omits_unseen_joints() {
        let frames = vec![FrameResult {
            frame_id: 0,
            timestamp: 0.0,
            landmarks: None,
            joint_angles: vec![JointAngle {
                joint_name: JointName::LeftHip,
                angle_degrees: 120.0,
                confidence: 1.0,
            }],
            gait: None,
        }];
        let avg = average_joint_angles(&frames);
        assert_eq!(avg.len(), 1);
        assert_eq!(avg[&JointName::LeftHip], 120.0);
    }

    #[test]
    fn test_comprehensive_report() {
        let h = history(vec![detected(0, 175.0), FrameResult::empty(1, 1.0), detected(2, 150.0)]);
        let summary = summarize(&h, &assessor(), AnalysisType::Biomechanical);
        let report = summary.report().unwrap();
        assert_eq!(report.total_frames, 3);
        assert_eq!(report.analysis_duration, 2.0);
        assert_eq!(report.motion_summary.total_poses_detected, 2);
        assert_eq!(report.motion_summary.analysis_type, AnalysisType::Biomechanical);
        let risk = &report.biomechanical_assessment.risk;
        assert_eq!(risk.risk_factors.len(), 2);
        assert!((risk.risk_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_serialized_shape() {
        let h = history(vec![detected(0, 170.0)]);
        let json = serde_json::to_value(summarize(&h, &assessor(), AnalysisType::GaitAnalysis)).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["total_frames"], 1);
        assert!(json["biomechanical_assessment"]["overall_risk_score"].is_number());
        assert!(json["biomechanical_assessment"]["assessment_timestamp"].is_number());
        assert!(json["motion_summary"]["average_joint_angles"]["left_knee"].is_number());
        assert_eq!(json["motion_summary"]["analysis_type"], "gait_analysis");

        let json = serde_json::to_value(summarize(&History::new(), &assessor(), AnalysisType::GaitAnalysis)).unwrap();
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["error"], "No motion data available");
    }
}

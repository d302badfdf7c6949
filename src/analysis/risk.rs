use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::joints::JointName;
use crate::config::AnalysisConfig;
use crate::session::FrameResult;

/// 怪我リスク要因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    ExcessiveKneeValgusLeft,
    ExcessiveKneeValgusRight,
    GaitAsymmetry,
}

impl RiskFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::ExcessiveKneeValgusLeft => "excessive_knee_valgus_left",
            RiskFactor::ExcessiveKneeValgusRight => "excessive_knee_valgus_right",
            RiskFactor::GaitAsymmetry => "gait_asymmetry",
        }
    }

    pub fn is_knee_valgus(&self) -> bool {
        matches!(
            self,
            RiskFactor::ExcessiveKneeValgusLeft | RiskFactor::ExcessiveKneeValgusRight
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0.0〜1.0
    #[serde(rename = "overall_risk_score")]
    pub risk_score: f32,
    pub risk_factors: BTreeSet<RiskFactor>,
    pub recommendations: Vec<String>,
}

const KNEE_VALGUS_RECOMMENDATIONS: [&str; 2] = [
    "Focus on hip strengthening exercises",
    "Practice proper landing mechanics",
];

const ASYMMETRY_RECOMMENDATIONS: [&str; 2] = [
    "Work on balance and proprioception",
    "Consider physical therapy assessment",
];

/// リスク要因の数に比例するスコア（1.0 で飽和）
pub fn risk_score(distinct_factors: usize, per_factor: f32) -> f32 {
    (distinct_factors as f32 * per_factor).clamp(0.0, 1.0)
}

/// 発火したリスク要因に対応する推奨事項
pub fn recommendations(factors: &BTreeSet<RiskFactor>) -> Vec<String> {
    let mut out = Vec::new();
    if factors.iter().any(RiskFactor::is_knee_valgus) {
        out.extend(KNEE_VALGUS_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    }
    if factors.contains(&RiskFactor::GaitAsymmetry) {
        out.extend(ASYMMETRY_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    }
    out
}

/// フレーム履歴から怪我リスクを評価
pub struct RiskAssessor {
    knee_threshold_deg: f32,
    symmetry_threshold: f32,
    per_factor: f32,
}

impl RiskAssessor {
    pub fn new(knee_threshold_deg: f32, symmetry_threshold: f32, per_factor: f32) -> Self {
        Self {
            knee_threshold_deg,
            symmetry_threshold,
            per_factor,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.knee_valgus_threshold_deg,
            config.symmetry_threshold,
            config.risk_per_factor,
        )
    }

    pub fn identify_risk_factors(&self, frames: &[FrameResult]) -> BTreeSet<RiskFactor> {
        let mut factors = BTreeSet::new();
        for frame in frames {
            for angle in &frame.joint_angles {
                if angle.angle_degrees >= self.knee_threshold_deg {
                    continue;
                }
                match angle.joint_name {
                    JointName::LeftKnee => {
                        factors.insert(RiskFactor::ExcessiveKneeValgusLeft);
                    }
                    JointName::RightKnee => {
                        factors.insert(RiskFactor::ExcessiveKneeValgusRight);
                    }
                    _ => {}
                }
            }

            let symmetry = frame.gait.as_ref().and_then(|g| g.symmetry_score());
            if symmetry.is_some_and(|s| s < self.symmetry_threshold) {
                factors.insert(RiskFactor::GaitAsymmetry);
            }
        }
        factors
    }

    pub fn assess(&self, frames: &[FrameResult]) -> RiskAssessment {
        let risk_factors = self.identify_risk_factors(frames);
        RiskAssessment {
            risk_score: risk_score(risk_factors.len(), self.per_factor),
            recommendations: recommendations(&risk_factors),
            risk_factors,
        }
    }
}

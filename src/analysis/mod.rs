pub mod angle;
pub mod gait;
pub mod joints;
pub mod risk;
pub mod summary;

pub use angle::calculate_angle;
pub use gait::{GaitAnalyzer, GaitMetrics, GaitPhase, GaitSummary};
pub use joints::{extract_joint_angles, JointAngle, JointName};
pub use risk::{RiskAssessment, RiskAssessor, RiskFactor};
pub use summary::{AnalysisSummary, ComprehensiveAnalysis};

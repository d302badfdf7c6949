use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analysis::gait::{GaitAnalyzer, GaitSummary};
use crate::analysis::joints::{extract_joint_angles, JointAngle};
use crate::analysis::risk::RiskAssessor;
use crate::analysis::summary::{summarize, AnalysisSummary};
use crate::config::AnalysisConfig;
use crate::pose::{Landmark, LandmarkSource};

/// 解析の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    GaitAnalysis,
    PoseEstimation,
    Biomechanical,
    InjuryRisk,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::GaitAnalysis => "gait_analysis",
            AnalysisType::PoseEstimation => "pose_estimation",
            AnalysisType::Biomechanical => "biomechanical",
            AnalysisType::InjuryRisk => "injury_risk",
        }
    }

    /// 歩行サマリを計算するか（姿勢推定のみの場合は不要）
    pub fn includes_gait(&self) -> bool {
        !matches!(self, AnalysisType::PoseEstimation)
    }
}

/// フレームのタイムスタンプの決め方
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBase {
    /// 壁時計（UNIX秒）。カメラ入力向け
    Wall,
    /// frame_id / fps。動画ファイル向け
    FrameRate(f64),
}

impl TimeBase {
    pub fn timestamp(&self, frame_id: u64) -> f64 {
        match self {
            TimeBase::Wall => wall_clock_secs(),
            TimeBase::FrameRate(fps) if *fps > 0.0 => frame_id as f64 / fps,
            TimeBase::FrameRate(_) => 0.0,
        }
    }
}

pub(crate) fn wall_clock_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// 1フレーム分の解析結果。作成後は変更しない
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub frame_id: u64,
    pub timestamp: f64,
    /// 人物が検出されなければ None
    pub landmarks: Option<Vec<Landmark>>,
    pub joint_angles: Vec<JointAngle>,
    pub gait: Option<GaitSummary>,
}

impl FrameResult {
    /// 人物未検出フレーム
    pub fn empty(frame_id: u64, timestamp: f64) -> Self {
        Self {
            frame_id,
            timestamp,
            landmarks: None,
            joint_angles: Vec::new(),
            gait: None,
        }
    }

    pub fn has_pose(&self) -> bool {
        self.landmarks.is_some()
    }
}

/// 追記のみのフレーム履歴
#[derive(Debug, Clone, Default)]
pub struct History {
    frames: Vec<FrameResult>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: FrameResult) -> &FrameResult {
        self.frames.push(frame);
        &self.frames[self.frames.len() - 1]
    }

    pub fn frames(&self) -> &[FrameResult] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 最初と最後のタイムスタンプの差（秒）
    pub fn duration(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
}

/// フレーム単位の解析セッション
///
/// 検出 → 関節角度 → 歩行サマリ → 履歴追記 を1フレームずつ同期的に行う。
pub struct MotionSession<S: LandmarkSource> {
    source: S,
    analysis_type: AnalysisType,
    time_base: TimeBase,
    gait: GaitAnalyzer,
    risk: RiskAssessor,
    history: History,
}

impl<S: LandmarkSource> MotionSession<S> {
    pub fn new(source: S, analysis_type: AnalysisType, time_base: TimeBase, config: &AnalysisConfig) -> Self {
        Self {
            source,
            analysis_type,
            time_base,
            gait: GaitAnalyzer::from_config(config),
            risk: RiskAssessor::from_config(config),
            history: History::new(),
        }
    }

    /// 1フレームを解析して履歴に追加
    ///
    /// 人物が検出されなかったフレームも空の結果として追加するので、
    /// 入力フレームと履歴は常に1対1に対応する。
    pub fn process(&mut self, frame: &S::Frame, frame_id: u64) -> &FrameResult {
        let timestamp = self.time_base.timestamp(frame_id);

        let landmarks = match self.source.detect(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                tracing::warn!(frame_id, "pose detection failed: {:#}", e);
                None
            }
        };

        let result = match landmarks {
            Some(landmarks) => {
                let joint_angles = extract_joint_angles(&landmarks);
                let gait = self
                    .analysis_type
                    .includes_gait()
                    .then(|| self.gait.analyze(&landmarks, frame_id, timestamp));
                tracing::debug!(frame_id, angles = joint_angles.len(), "pose detected");
                FrameResult {
                    frame_id,
                    timestamp,
                    landmarks: Some(landmarks),
                    joint_angles,
                    gait,
                }
            }
            None => {
                tracing::debug!(frame_id, "no pose detected");
                FrameResult::empty(frame_id, timestamp)
            }
        };

        self.history.push(result)
    }

    /// これまでの履歴を集計
    pub fn summarize(&self) -> AnalysisSummary {
        summarize(&self.history, &self.risk, self.analysis_type)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_history(self) -> History {
        self.history
    }

    pub fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

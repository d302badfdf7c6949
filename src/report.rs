use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::analysis::gait::GaitSummary;
use crate::analysis::joints::JointAngle;
use crate::analysis::summary::AnalysisSummary;
use crate::pose::Landmark;
use crate::session::{FrameResult, History};

// --- 出力JSONの形 ---

#[derive(Serialize)]
pub struct PoseRecord<'a> {
    pub landmarks: &'a [Landmark],
}

#[derive(Serialize)]
pub struct FrameRecord<'a> {
    pub frame_id: u64,
    pub timestamp: f64,
    /// 検出された人物（未検出なら空）
    pub poses: Vec<PoseRecord<'a>>,
    pub joint_angles: &'a [JointAngle],
    pub gait_metrics: Option<&'a GaitSummary>,
}

impl<'a> From<&'a FrameResult> for FrameRecord<'a> {
    fn from(frame: &'a FrameResult) -> Self {
        Self {
            frame_id: frame.frame_id,
            timestamp: frame.timestamp,
            poses: frame
                .landmarks
                .as_deref()
                .map(|landmarks| vec![PoseRecord { landmarks }])
                .unwrap_or_default(),
            joint_angles: &frame.joint_angles,
            gait_metrics: frame.gait.as_ref(),
        }
    }
}

#[derive(Serialize)]
pub struct AnalysisReport<'a> {
    pub frame_results: Vec<FrameRecord<'a>>,
    pub comprehensive_analysis: &'a AnalysisSummary,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(history: &'a History, summary: &'a AnalysisSummary) -> Self {
        Self {
            frame_results: history.frames().iter().map(FrameRecord::from).collect(),
            comprehensive_analysis: summary,
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

// --- Save ---

pub fn save_report(path: &Path, history: &History, summary: &AnalysisSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    AnalysisReport::new(history, summary).write_to(&mut writer)?;
    writer.flush().context("Failed to write analysis report")?;
    Ok(())
}

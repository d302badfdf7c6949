use anyhow::{bail, Context, Result};
use opencv::core::Mat;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::landmark::{Landmark, LandmarkIndex};
use super::preprocess::preprocess_for_blazepose;
use super::source::LandmarkSource;
use crate::config::DetectorConfig;

/// ランドマーク出力の1点あたりの値 (x, y, z, visibility, presence)
const VALUES_PER_LANDMARK: usize = 5;

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// モデルの生出力を正規化座標のランドマーク列に変換
///
/// x, y, z は入力ピクセル単位、visibility はロジット。
/// 先頭 33 点のみ使用（残りは補助ランドマーク）。
pub fn decode_landmarks(raw: &[f32], input_size: i32) -> Vec<Landmark> {
    let scale = input_size as f32;
    raw.chunks_exact(VALUES_PER_LANDMARK)
        .take(LandmarkIndex::COUNT)
        .map(|v| Landmark::new(v[0] / scale, v[1] / scale, v[2] / scale, sigmoid(v[3])))
        .collect()
}

/// BlazePose を使用したランドマーク検出器
pub struct PoseDetector {
    session: Session,
    config: DetectorConfig,
}

impl PoseDetector {
    /// ONNXモデルを読み込んで初期化
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let model_path = Path::new(&config.model_path);
        if !model_path.is_file() {
            bail!("Pose model not found: {}", model_path.display());
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)
            .context("Failed to load ONNX model")?;

        Ok(Self {
            session,
            config: config.clone(),
        })
    }

    /// BGR フレームからランドマークを検出
    pub fn detect_frame(&mut self, frame: &Mat) -> Result<Option<Vec<Landmark>>> {
        let input = preprocess_for_blazepose(frame, self.config.input_size)?;
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![self.config.input_name.as_str() => input_tensor])
            .context("Inference failed")?;

        // 出力 [1, 1] 人物存在スコア
        let presence: ndarray::ArrayViewD<f32> = outputs[self.config.presence_output.as_str()]
            .try_extract_array()
            .context("Failed to extract presence output")?;
        let presence = presence.iter().next().copied().unwrap_or(0.0);
        if presence < self.config.min_detection_confidence {
            return Ok(None);
        }

        // 出力 [1, 195] (39 x 5)
        let raw: ndarray::ArrayViewD<f32> = outputs[self.config.landmarks_output.as_str()]
            .try_extract_array()
            .context("Failed to extract landmark output")?;
        let raw: Vec<f32> = raw.iter().copied().collect();

        Ok(Some(decode_landmarks(&raw, self.config.input_size)))
    }
}

impl LandmarkSource for PoseDetector {
    type Frame = Mat;

    fn detect(&mut self, frame: &Mat) -> Result<Option<Vec<Landmark>>> {
        self.detect_frame(frame)
    }
}

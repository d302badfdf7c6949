use anyhow::{Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};
use std::fmt;

use crate::config::CaptureConfig;

/// 入力ソース: カメラ番号または動画ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoInput {
    Camera(i32),
    File(String),
}

impl VideoInput {
    /// 数字のみならカメラ番号、それ以外はファイルパス
    pub fn parse(input: &str) -> Self {
        if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = input.parse() {
                return VideoInput::Camera(index);
            }
        }
        VideoInput::File(input.to_string())
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, VideoInput::Camera(_))
    }
}

impl fmt::Display for VideoInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoInput::Camera(index) => write!(f, "camera {}", index),
            VideoInput::File(path) => f.write_str(path),
        }
    }
}

/// OpenCVを使用したフレーム読み込み
pub struct VideoSource {
    capture: VideoCapture,
    width: u32,
    height: u32,
    fps: f64,
}

impl VideoSource {
    pub fn open(input: &VideoInput, config: &CaptureConfig) -> Result<Self> {
        let mut capture = match input {
            VideoInput::Camera(index) => {
                VideoCapture::new(*index, VideoCaptureAPIs::CAP_ANY as i32).context("Failed to open camera")?
            }
            VideoInput::File(path) => VideoCapture::from_file(path, VideoCaptureAPIs::CAP_ANY as i32)
                .with_context(|| format!("Failed to open video file: {}", path))?,
        };

        if !capture.is_opened()? {
            anyhow::bail!("Error opening video source: {}", input);
        }

        // 解像度はカメラのみ設定可能
        if input.is_camera() {
            if let Some(w) = config.width {
                capture.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
            }
            if let Some(h) = config.height {
                capture.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
            }
            capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let reported_fps = capture.get(videoio::CAP_PROP_FPS)?;
        let fps = if reported_fps.is_finite() && reported_fps > 0.0 {
            reported_fps
        } else {
            config.fps_fallback
        };
        tracing::info!("Opened {}: {}x{} @ {:.1} FPS", input, width, height, fps);

        Ok(Self {
            capture,
            width,
            height,
            fps,
        })
    }

    /// 解像度を取得
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// 次のフレームを読み込む（BGR形式）。ストリーム終端なら None
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if !ok || frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camera_index() {
        assert_eq!(VideoInput::parse("0"), VideoInput::Camera(0));
        assert_eq!(VideoInput::parse("12"), VideoInput::Camera(12));
    }

    #[test]
    fn test_parse_file_path() {
        assert_eq!(VideoInput::parse("walk.mp4"), VideoInput::File("walk.mp4".to_string()));
        assert_eq!(VideoInput::parse("-1"), VideoInput::File("-1".to_string()));
        assert_eq!(VideoInput::parse(""), VideoInput::File(String::new()));
    }
}

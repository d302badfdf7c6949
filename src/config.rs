use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// BlazePose ランドマークモデル (ONNX)
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// モデル入力の一辺（ピクセル）
    #[serde(default = "default_input_size")]
    pub input_size: i32,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    /// [1, 195] ランドマーク出力 (39点 x (x, y, z, visibility, presence))
    #[serde(default = "default_landmarks_output")]
    pub landmarks_output: String,
    /// [1, 1] 人物存在スコア出力
    #[serde(default = "default_presence_output")]
    pub presence_output: String,
    /// 人物存在スコアの閾値
    #[serde(default = "default_min_detection_confidence")]
    pub min_detection_confidence: f32,
}

fn default_model_path() -> String { "models/pose_landmark_full.onnx".to_string() }
fn default_input_size() -> i32 { 256 }
fn default_input_name() -> String { "input_1".to_string() }
fn default_landmarks_output() -> String { "Identity".to_string() }
fn default_presence_output() -> String { "Identity_1".to_string() }
fn default_min_detection_confidence() -> f32 { 0.7 }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            input_size: default_input_size(),
            input_name: default_input_name(),
            landmarks_output: default_landmarks_output(),
            presence_output: default_presence_output(),
            min_detection_confidence: default_min_detection_confidence(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    /// カメラ解像度（None ならドライバ既定値）
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// 動画ファイルがFPSを報告しない場合に使うFPS
    #[serde(default = "default_fps_fallback")]
    pub fps_fallback: f64,
    /// 処理する最大フレーム数（None なら無制限）
    #[serde(default)]
    pub max_frames: Option<u64>,
}

fn default_fps_fallback() -> f64 { 30.0 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fps_fallback: default_fps_fallback(),
            max_frames: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// 膝角度がこれ未満なら膝外反リスク（度）
    #[serde(default = "default_knee_valgus_threshold")]
    pub knee_valgus_threshold_deg: f32,
    /// 対称性スコアがこれ未満なら歩行非対称リスク
    #[serde(default = "default_symmetry_threshold")]
    pub symmetry_threshold: f32,
    /// リスク要因1つあたりのスコア
    #[serde(default = "default_risk_per_factor")]
    pub risk_per_factor: f32,
    /// 両足の高さの差がこれ以内なら両脚支持（正規化座標）
    #[serde(default = "default_foot_contact_tolerance")]
    pub foot_contact_tolerance: f32,
    /// 先行足の入れ替わり判定のヒステリシス幅（正規化座標）
    #[serde(default = "default_step_separation_threshold")]
    pub step_separation_threshold: f32,
    /// ケイデンス算出に使う直近の歩数
    #[serde(default = "default_cadence_window")]
    pub cadence_window: usize,
}

fn default_knee_valgus_threshold() -> f32 { 160.0 }
fn default_symmetry_threshold() -> f32 { 0.8 }
fn default_risk_per_factor() -> f32 { 0.2 }
fn default_foot_contact_tolerance() -> f32 { 0.02 }
fn default_step_separation_threshold() -> f32 { 0.03 }
fn default_cadence_window() -> usize { 8 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            knee_valgus_threshold_deg: default_knee_valgus_threshold(),
            symmetry_threshold: default_symmetry_threshold(),
            risk_per_factor: default_risk_per_factor(),
            foot_contact_tolerance: default_foot_contact_tolerance(),
            step_separation_threshold: default_step_separation_threshold(),
            cadence_window: default_cadence_window(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// デバッグウィンドウを表示するか
    #[serde(default = "default_view")]
    pub view: bool,
}

fn default_view() -> bool { true }

impl Default for DebugConfig {
    fn default() -> Self {
        Self { view: default_view() }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// 設定ファイルを読み込む。存在しない・壊れている場合は既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("{} not found, using default config", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}, using default config", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.detector.input_size, 256);
        assert_eq!(config.analysis.knee_valgus_threshold_deg, 160.0);
        assert_eq!(config.analysis.symmetry_threshold, 0.8);
        assert_eq!(config.analysis.risk_per_factor, 0.2);
        assert!(config.capture.max_frames.is_none());
        assert!(config.debug.view);
    }

    #[test]
    fn test_partial_section() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            knee_valgus_threshold_deg = 150.0

            [capture]
            max_frames = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.knee_valgus_threshold_deg, 150.0);
        // untouched fields keep defaults
        assert_eq!(config.analysis.symmetry_threshold, 0.8);
        assert_eq!(config.capture.max_frames, Some(100));
        assert_eq!(config.capture.fps_fallback, 30.0);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.detector.model_path, "models/pose_landmark_full.onnx");
    }

    #[test]
    fn test_load_reports_parse_error() {
        let path = std::env::temp_dir().join("motion_analyzer_bad_config.toml");
        fs::write(&path, "[analysis\nbroken").unwrap();
        assert!(Config::load(&path).is_err());
        let config = Config::load_or_default(&path);
        assert_eq!(config.analysis.cadence_window, 8);
        let _ = fs::remove_file(&path);
    }
}

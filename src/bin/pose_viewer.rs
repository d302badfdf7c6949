use anyhow::Result;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use motion_analyzer::analysis::{extract_joint_angles, JointAngle};
use motion_analyzer::camera::{VideoInput, VideoSource};
use motion_analyzer::config::Config;
use motion_analyzer::pose::PoseDetector;
use motion_analyzer::render::MinifbRenderer;

const CONFIG_PATH: &str = "motion_analyzer.toml";

/// 可視性の閾値
const VISIBILITY_THRESHOLD: f32 = 0.5;

fn format_angles(angles: &[JointAngle]) -> String {
    angles
        .iter()
        .map(|a| format!("{}={:.0}", a.joint_name, a.angle_degrees))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = Config::load_or_default(CONFIG_PATH);
    let input = std::env::args()
        .nth(1)
        .map(|arg| VideoInput::parse(&arg))
        .unwrap_or(VideoInput::Camera(0));

    println!("Pose Viewer");
    println!("Press ESC to exit");

    let mut video = VideoSource::open(&input, &config.capture)?;
    let (width, height) = video.resolution();

    let mut detector = PoseDetector::new(&config.detector)?;
    println!("Model loaded");

    let mut renderer = MinifbRenderer::new("Pose Viewer", width as usize, height as usize)?;

    // FPS計測用
    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();
    let mut last_angles: Vec<JointAngle> = Vec::new();

    while renderer.is_open() {
        let frame = match video.read_frame()? {
            Some(f) => f,
            None => break,
        };

        // 推論
        let landmarks = detector.detect_frame(&frame)?;

        // 描画
        renderer.draw_frame(&frame)?;
        if let Some(ref landmarks) = landmarks {
            last_angles = extract_joint_angles(landmarks);
            renderer.draw_landmarks(landmarks, VISIBILITY_THRESHOLD);
            renderer.highlight_knees(landmarks, &last_angles, config.analysis.knee_valgus_threshold_deg);
        }
        renderer.update()?;

        // FPS計算
        frame_count += 1;
        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let fps = frame_count as f32 / elapsed;
            if landmarks.is_some() {
                println!("FPS: {:.1} | {}", fps, format_angles(&last_angles));
            } else {
                println!("FPS: {:.1} | no pose", fps);
            }
            frame_count = 0;
            fps_timer = Instant::now();
        }
    }

    println!("Shutting down...");
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use motion_analyzer::camera::{VideoInput, VideoSource};
use motion_analyzer::config::Config;
use motion_analyzer::pose::PoseDetector;
use motion_analyzer::render::MinifbRenderer;
use motion_analyzer::report::save_report;
use motion_analyzer::session::{AnalysisType, MotionSession, TimeBase};

const CONFIG_PATH: &str = "motion_analyzer.toml";

/// 描画時の可視性の閾値
const VISIBILITY_THRESHOLD: f32 = 0.5;

/// 進捗ログの間隔（フレーム）
const PROGRESS_INTERVAL: u64 = 30;

#[derive(Parser, Debug)]
#[command(
    name = "motion-analyzer",
    version = env!("MOTION_ANALYZER_VERSION"),
    about = "Joint angle, gait and injury-risk analysis from video"
)]
struct Args {
    /// Input video file or camera index
    #[arg(short, long, default_value = "0")]
    input: String,
    /// Output file for results
    #[arg(short, long, default_value = "motion_analysis.json")]
    output: PathBuf,
    /// Type of analysis to perform
    #[arg(short = 't', long, value_enum, default_value_t = AnalysisType::GaitAnalysis)]
    analysis_type: AnalysisType,
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
    /// Do not open the debug window
    #[arg(long)]
    headless: bool,
    /// Stop after this many frames (overrides capture.max_frames)
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let config = Config::load_or_default(&args.config);
    let input = VideoInput::parse(&args.input);
    let max_frames = args.max_frames.or(config.capture.max_frames);

    tracing::info!("Motion Analyzer {}", env!("MOTION_ANALYZER_VERSION"));
    tracing::info!("Input: {}", input);
    tracing::info!("Analysis type: {}", args.analysis_type.as_str());

    let mut video = VideoSource::open(&input, &config.capture)?;
    let (width, height) = video.resolution();

    let detector = PoseDetector::new(&config.detector)?;
    tracing::info!("Model loaded: {}", config.detector.model_path);

    let time_base = if input.is_camera() {
        TimeBase::Wall
    } else {
        TimeBase::FrameRate(video.fps())
    };
    let mut session = MotionSession::new(detector, args.analysis_type, time_base, &config.analysis);

    let mut renderer = if config.debug.view && !args.headless && width > 0 && height > 0 {
        match MinifbRenderer::new("Motion Analysis", width as usize, height as usize) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("Failed to open display window: {:#}. Running headless.", e);
                None
            }
        }
    } else {
        None
    };

    tracing::info!("Starting motion analysis...");
    let start_time = Instant::now();
    let mut frame_id: u64 = 0;

    loop {
        if max_frames.is_some_and(|max| frame_id >= max) {
            tracing::info!("Frame limit reached ({})", frame_id);
            break;
        }
        if renderer.as_ref().is_some_and(|r| !r.is_open()) {
            tracing::info!("Analysis interrupted by user");
            break;
        }

        let frame = match video.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("{:#}", e);
                break;
            }
        };

        let result = session.process(&frame, frame_id);

        if let Some(r) = renderer.as_mut() {
            let drawn = r.draw_frame(&frame).and_then(|_| {
                if let Some(landmarks) = &result.landmarks {
                    r.draw_landmarks(landmarks, VISIBILITY_THRESHOLD);
                    r.highlight_knees(landmarks, &result.joint_angles, config.analysis.knee_valgus_threshold_deg);
                }
                r.update()
            });
            if let Err(e) = drawn {
                tracing::warn!("Display failed: {:#}. Running headless.", e);
                renderer = None;
            }
        }

        frame_id += 1;
        if frame_id % PROGRESS_INTERVAL == 0 {
            let elapsed = start_time.elapsed().as_secs_f64();
            let poses = session.history().frames().iter().filter(|f| f.has_pose()).count();
            tracing::info!(
                "frames={} poses={} FPS={:.1}",
                frame_id,
                poses,
                frame_id as f64 / elapsed.max(f64::EPSILON)
            );
        }
    }

    let summary = session.summarize();
    save_report(&args.output, session.history(), &summary)?;
    tracing::info!("Analysis complete. Results saved to {}", args.output.display());

    Ok(())
}

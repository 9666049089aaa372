// Vantage Command Line Interface
// Live object counting overlay for cameras and video files

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vantage_eye::{
    DisplayWindow, FramePipeline, StreamRunner, VideoSource, VisionConfig, YoloModel,
};

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Live object detection with per-class counts", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(long, short, default_value = "config.json")]
    config: PathBuf,

    /// Video source: camera index or file/stream path (overrides config)
    #[arg(long, short)]
    source: Option<String>,

    /// ONNX model path (overrides config)
    #[arg(long, short)]
    model: Option<PathBuf>,

    /// Class names file, one per line (overrides config)
    #[arg(long)]
    class_names: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    if !VALID_LOG_LEVELS.contains(&log_level) {
        return Err(anyhow::anyhow!("Invalid log level: {}", log_level));
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<VisionConfig> {
    let mut config = VisionConfig::from_file(&cli.config)?;

    if let Some(source) = &cli.source {
        config.source = source.clone();
    }
    if let Some(model) = &cli.model {
        config.model_path = model.clone();
    }
    if let Some(class_names) = &cli.class_names {
        config.class_names_path = Some(class_names.clone());
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    if cli.check {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("Loading detection model...");
    let detector = YoloModel::from_config(&config).context("Failed to load detection model")?;

    let source = VideoSource::from_config(&config).context("Failed to open video source")?;
    let window = DisplayWindow::from_config(&config).context("Failed to open display window")?;
    let pipeline = FramePipeline::from_config(&config);

    info!(
        "Counting {} from {} (press key {} to stop)",
        config.tracked_names().collect::<Vec<_>>().join(", "),
        source.spec(),
        config.stop_key
    );

    let summary = StreamRunner::new(source, detector, pipeline, window)
        .with_failure_limit(config.max_consecutive_failures)
        .run()?;

    info!(
        "Done: {} frames displayed, {} skipped ({:?})",
        summary.frames_displayed, summary.frames_skipped, summary.stop_reason
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    // Resources are released inside `run` before we get here.
    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

//! Head pose monitor: replays recorded detections, records the pose trajectory and exports it.

use anyhow::{Context, Result};
use clap::Parser;
use head_pose_monitor::{
    app::{AppConfig, HeadPoseApp},
    config::{Config, EstimatorMode},
    export::CsvSchema,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines file of recorded detections
    #[arg(short, long, required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Estimation strategy (learned, geometric)
    #[arg(short, long)]
    estimator: Option<String>,

    /// Per-axis recording threshold in degrees
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Export schema (detailed, simple)
    #[arg(short, long)]
    schema: Option<String>,

    /// Directory for exported CSV files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Target ticks per second
    #[arg(long)]
    fps: Option<f64>,

    /// Pace the replay with the wall clock
    #[arg(long)]
    realtime: bool,

    /// Do not write the CSV export
    #[arg(long)]
    no_export: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{}", head_pose_monitor::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    info!("Head Pose Monitor ({})", env!("BUILD_TARGET"));

    // Load configuration if provided
    let mut settings = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Command line flags take precedence over the file
    if let Some(estimator) = &args.estimator {
        settings.pipeline.estimator = estimator.parse::<EstimatorMode>()?;
    }
    if let Some(threshold) = args.threshold {
        settings.pipeline.record_threshold = threshold;
    }
    if let Some(schema) = &args.schema {
        settings.export.schema = schema.parse::<CsvSchema>()?;
    }
    if let Some(dir) = args.output_dir {
        settings.export.directory = dir;
    }
    if let Some(fps) = args.fps {
        settings.scheduler.target_fps = fps;
    }

    let config = AppConfig {
        input: args.input.context("--input is required")?,
        settings,
        realtime: args.realtime,
        no_export: args.no_export,
    };

    // Create and run application
    let mut app = HeadPoseApp::new(config).context("Pose pipeline is not ready")?;
    let summary = app.run()?;

    match &summary.exported {
        Some(path) => info!("History written to {}", path.display()),
        None => info!("No history file written"),
    }

    Ok(())
}

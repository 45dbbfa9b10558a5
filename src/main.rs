//! Head input application: turn head movement into a game direction signal.

use anyhow::Result;
use clap::Parser;
use head_input::{
    app::HeadInputApp,
    capture::VideoSource,
    config::Config,
};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to process instead of the camera
    #[arg(short, long)]
    video: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Horizontal direction threshold
    #[arg(long)]
    x_offset: Option<f64>,

    /// Vertical direction threshold
    #[arg(long)]
    y_offset: Option<f64>,

    /// Number of calibration samples before the neutral pose locks
    #[arg(long)]
    samples: Option<usize>,

    /// Average the calibration window instead of taking the last sample
    #[arg(long)]
    averaging: bool,

    /// Enable translation smoothing
    #[arg(long)]
    smoothing: bool,

    /// Do not mirror the camera image
    #[arg(long)]
    no_mirror: bool,

    /// Run headless, without the camera window
    #[arg(long)]
    no_gui: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Head Input");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Command line flags override the file
    if let Some(x_offset) = args.x_offset {
        config.thresholds.x_offset = x_offset;
    }
    if let Some(y_offset) = args.y_offset {
        config.thresholds.y_offset = y_offset;
    }
    if let Some(samples) = args.samples {
        config.calibration.samples = samples;
    }
    if args.averaging {
        config.calibration.averaging = true;
    }
    if args.smoothing {
        config.smoothing.enabled = true;
    }
    if args.no_mirror {
        config.capture.mirror = false;
    }
    if args.no_gui {
        config.display.gui = false;
    }
    if let Some(cam) = args.cam {
        config.capture.camera_index = cam;
    }

    let video_source = if let Some(video_path) = args.video {
        VideoSource::File(video_path)
    } else {
        VideoSource::Camera(config.capture.camera_index)
    };

    let app = HeadInputApp::new(config, video_source)?;
    app.run()?;

    Ok(())
}

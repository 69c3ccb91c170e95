use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rollcall_core::{gallery, AttendanceLedger, NearestMatcher, OnnxFaceEngine};
use rollcall_hw::Camera;

mod annotate;
mod config;
mod display;
mod font;
mod notifier;
mod session;

use config::Config;
use display::WindowDisplay;
use notifier::{DialogNotifier, LogNotifier, Notifier};
use session::Session;

#[derive(Parser)]
#[command(name = "rollcall", about = "Face recognition attendance for a single webcam")]
struct Cli {
    /// Directory of reference images, one person per file
    #[arg(long)]
    gallery_dir: Option<std::path::PathBuf>,
    /// Attendance record file (reset at startup)
    #[arg(long)]
    ledger: Option<std::path::PathBuf>,
    /// V4L2 camera device
    #[arg(long)]
    device: Option<String>,
    /// Embedding distance accept threshold
    #[arg(long)]
    threshold: Option<f32>,
    /// Log notifications instead of opening dialog boxes
    #[arg(long)]
    quiet: bool,
    /// List detected capture devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        for dev in Camera::list_devices() {
            println!("{}\t{} ({})", dev.path, dev.name, dev.driver);
        }
        return ExitCode::SUCCESS;
    }

    let notifier: Box<dyn Notifier> = if cli.quiet {
        Box::new(LogNotifier)
    } else {
        Box::new(DialogNotifier)
    };

    let mut config = Config::from_env();
    if let Some(dir) = cli.gallery_dir {
        config.gallery_dir = dir;
    }
    if let Some(path) = cli.ledger {
        config.ledger_path = path;
    }
    if let Some(device) = cli.device {
        config.camera_device = device;
    }
    if let Some(threshold) = cli.threshold {
        config.match_threshold = threshold;
    }

    match run(&config, notifier.as_ref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "exiting");
            ExitCode::FAILURE
        }
    }
}

/// Start-up sequence and main loop. Every precondition failure is surfaced
/// through the notifier before the error propagates; once the loop is
/// running, failures end the run with a log only (matching the preview
/// window staying up until then).
fn run(config: &Config, notifier: &dyn Notifier) -> Result<()> {
    let mut engine =
        match OnnxFaceEngine::load(&config.detect_model_path(), &config.embed_model_path()) {
            Ok(engine) => engine,
            Err(err) => {
                notifier.alert("Error", &format!("Could not load face models: {err}"));
                return Err(err.into());
            }
        };

    tracing::info!(dir = %config.gallery_dir.display(), "loading known faces");
    let gallery = match gallery::build(&config.gallery_dir, &mut engine) {
        Ok(gallery) => gallery,
        Err(err) => {
            notifier.alert("Error", &err.to_string());
            return Err(err.into());
        }
    };

    let mut camera = match Camera::open(&config.camera_device) {
        Ok(camera) => camera,
        Err(err) => {
            notifier.alert("Error", &err.to_string());
            return Err(err.into());
        }
    };

    let ledger = AttendanceLedger::new(&config.ledger_path);
    if let Err(err) = ledger.reset() {
        notifier.alert("Error", &err.to_string());
        return Err(err.into());
    }

    let mut display = match WindowDisplay::open(
        "Rollcall",
        camera.width as usize,
        camera.height as usize,
    ) {
        Ok(display) => display,
        Err(err) => {
            notifier.alert("Error", &format!("Could not open preview window: {err}"));
            return Err(err.into());
        }
    };

    tracing::info!("starting capture loop; press Q in the preview window to stop");
    Session {
        source: &mut camera,
        engine: &mut engine,
        matcher: &NearestMatcher,
        gallery: &gallery,
        ledger: &ledger,
        notifier,
        display: &mut display,
        match_threshold: config.match_threshold,
    }
    .run()?;

    Ok(())
}

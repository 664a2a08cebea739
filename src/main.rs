//! AeroView - 3D vehicle viewer with aerodynamic analysis
//!
//! Headless host: uploads one asset, drives the viewer and the analysis
//! cycle frame by frame, then reports what the presentation layer would show.

mod dashboard;
mod settings;
mod upload;

use std::path::PathBuf;
use std::time::Duration;

use aeroview_integration::{AnalysisState, IntegrationClient};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dashboard::{Dashboard, PresentationView, UploadOutcome};
use settings::Settings;

/// Load a vehicle model and request an aerodynamic assessment
#[derive(Parser)]
#[command(name = "aeroview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 3D scene to upload (.glb or .gltf)
    file: Option<PathBuf>,

    /// Light display mode
    #[arg(long)]
    light: bool,

    /// Maximum number of frames to run before reporting
    /// (defaults to enough frames to outlast the inference timeout)
    #[arg(long)]
    frames: Option<u32>,

    /// Inference request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the presentation view as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting AeroView...");

    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    if cli.light {
        settings.display.dark_mode = false;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.inference.timeout_secs = secs;
    }
    if cli.save_settings {
        match &cli.settings {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
    }

    let client = IntegrationClient::new(settings.inference_config()).context("Failed to start inference client")?;
    if client.config().api_key().is_none() {
        warn!("No API key configured; set {} or inference.api_key", settings::API_KEY_ENV);
    }
    let mut dashboard = Dashboard::new(&settings, client);

    if let Some(path) = &cli.file {
        match dashboard.upload(path)? {
            UploadOutcome::Accepted => {}
            UploadOutcome::Ignored => warn!("{:?} is not a .glb or .gltf file; ignored", path),
            UploadOutcome::Rejected => warn!("{:?} rejected: analysis in progress", path),
        }
    }

    let interval = settings.viewer.frame_interval();
    let budget = cli.frames.unwrap_or_else(|| settings.frame_budget());
    for _ in 0..budget.max(1) {
        dashboard.tick(interval);
        if dashboard.is_settled() {
            break;
        }
        std::thread::sleep(Duration::from_secs_f32(interval));
    }

    let view = dashboard.presentation();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_report(&view);
    }
    Ok(())
}

fn print_report(view: &PresentationView) {
    println!("Theme:    {}", if view.is_dark_mode { "dark" } else { "light" });
    println!("Asset:    {}", view.asset.as_deref().unwrap_or("(none)"));
    print!("Viewer:   {:?}", view.viewer);
    if let Some(frame) = &view.frame {
        print!(" | frame {} {:?}, {} triangles", frame.index, frame.kind, frame.triangles);
        if let Some(n) = &frame.normalization {
            print!(", scale {:.4}", n.scale);
        }
    }
    println!();
    if let Some(err) = &view.viewer_error {
        println!("          {}", err);
    }

    match &view.analysis {
        AnalysisState::Idle => println!("Analysis: idle"),
        AnalysisState::Analyzing => println!("Analysis: still analyzing"),
        AnalysisState::Complete { result, source, completed_at } => {
            println!(
                "Analysis: Cd {:.3} {} ({:?}, {})",
                result.drag_coefficient(),
                result.rating(),
                source,
                completed_at.format("%H:%M:%S")
            );
            for item in result.improvements() {
                println!("  [{}] {}: {} (-{})", item.impact, item.area, item.description, item.reduction);
            }
        }
        AnalysisState::Failed(failure) => {
            println!("Analysis: {}", failure.user_message);
            match failure.status {
                Some(status) => println!("          HTTP {}: {}", status, failure.detail),
                None => println!("          {}", failure.detail),
            }
        }
    }
}

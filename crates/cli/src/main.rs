use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use framegate_core::config::pipeline_settings::{parse_categories, PipelineSettings};
use framegate_core::detection::domain::detection_unit::DetectionUnit;
use framegate_core::detection::infrastructure::simulated_unit::SimulatedDetectionUnit;
use framegate_core::pipeline::pipeline_controller::PipelineController;
use framegate_core::presentation::log_sink::LogPresentationSink;
use framegate_core::presentation::overlay::fit_overlay;
use framegate_core::source::source_lifecycle::SourceLifecycleManager;

/// Feeds frames from a source through the single-flight detection pipeline.
#[derive(Parser)]
#[command(name = "framegate")]
struct Cli {
    /// Frame source: none, pattern:<W>x<H>@<FPS>, image:<path> or an image path.
    #[arg(long)]
    source: Option<String>,

    /// Index of the execution device (see --list-devices).
    #[arg(long)]
    device: Option<usize>,

    /// Print the available execution devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Comma-separated object categories to display, or "all".
    #[arg(long)]
    categories: Option<String>,

    /// How long to run before stopping, in seconds.
    #[arg(long, default_value = "5")]
    duration_secs: f64,

    /// Simulated bind latency per frame, in milliseconds.
    #[arg(long, default_value = "0")]
    bind_latency_ms: u64,

    /// Simulated evaluation latency per frame, in milliseconds.
    #[arg(long, default_value = "50")]
    eval_latency_ms: u64,

    /// Preview area size as <W>x<H>; logs the fitted overlay size.
    #[arg(long)]
    preview_size: Option<String>,

    /// JSON settings file; command-line flags take precedence.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let unit: Arc<dyn DetectionUnit> = Arc::new(SimulatedDetectionUnit::new().with_latencies(
        Duration::from_millis(cli.bind_latency_ms),
        Duration::from_millis(cli.eval_latency_ms),
    ));

    if cli.list_devices {
        for (index, device) in unit.supported_devices()?.iter().enumerate() {
            println!("{index}: {device}");
        }
        return Ok(());
    }

    let settings = merged_settings(&cli)?;
    let sink = Arc::new(LogPresentationSink::default());
    let controller = Arc::new(PipelineController::new(
        unit,
        sink.clone(),
        settings.controller_config(),
    )?);
    log::info!(
        "Running on device {} ({}), filter {:?}",
        controller.current_device_index().unwrap_or_default(),
        controller.current_device(),
        controller.selection_state()
    );

    let sources = SourceLifecycleManager::new(controller.clone());
    sources.set_source(settings.source.as_deref().unwrap_or("none"))?;

    if let (Some(preview), Some((w, h))) = (&cli.preview_size, sources.frame_size()) {
        let (pw, ph) = parse_size(preview)?;
        let (ow, oh) = fit_overlay(w, h, pw as f32, ph as f32);
        log::info!("Overlay for {w}x{h} frames in {pw}x{ph} preview: {ow:.0}x{oh:.0}");
    }

    if sources.is_active() {
        std::thread::sleep(Duration::from_secs_f64(cli.duration_secs));
    } else {
        log::info!("No source configured, nothing to process");
    }
    sources.clear();

    let stats = controller.stats();
    println!(
        "Frames: {} admitted, {} dropped; runs: {} completed, {} failed, {} cancelled",
        stats.admitted, stats.dropped, stats.completed, stats.failed, stats.cancelled
    );
    if stats.lost > 0 {
        println!("Frames lost after the run worker stopped: {}", stats.lost);
    }
    if let Some(summary) = sink.summary_string() {
        println!("{summary}");
    }
    Ok(())
}

/// Settings file (if any) overridden by explicit flags.
fn merged_settings(cli: &Cli) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };
    if let Some(device) = cli.device {
        settings.device_index = Some(device);
    }
    if let Some(categories) = &cli.categories {
        settings.categories = Some(parse_categories(categories)?);
    }
    if let Some(source) = &cli.source {
        settings.source = Some(source.clone());
    }
    Ok(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cli.settings {
        if !path.exists() {
            return Err(format!("Settings file not found: {}", path.display()).into());
        }
    }
    if !cli.duration_secs.is_finite() || cli.duration_secs < 0.0 {
        return Err(format!(
            "Duration must be a non-negative number of seconds, got {}",
            cli.duration_secs
        )
        .into());
    }
    if let Some(preview) = &cli.preview_size {
        parse_size(preview)?;
    }
    Ok(())
}

fn parse_size(size: &str) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let invalid = || format!("Preview size must look like 800x600, got '{size}'");
    let (w, h) = size.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid().into());
    }
    Ok((width, height))
}

// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Streaming through the processor chain, to the terminal or headless
//! - Processing a single image
//! - Listing processors and capture devices
//! - Inspecting and initializing the config file

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use velvet::backends::{create_source, enumerate_devices};
use velvet::constants::processors::DEFAULT_ACTIVE;
use velvet::pipeline::FramePipeline;
use velvet::render::{TerminalDriver, TerminalSurface, TerminalUi};
use velvet::{
    Canvas, CaptureConstraints, CaptureSession, Config, IntervalDriver, LoopScheduler,
    PipelineContext, RetainingCanvas, SourceSpec, VelvetError, VelvetResult, storage,
};

/// Where a live run renders
pub enum RunMode {
    Terminal,
    Headless {
        frames: Option<u64>,
        output: Option<PathBuf>,
    },
}

impl RunMode {
    pub fn from_flags(headless: bool, frames: Option<u64>, output: Option<PathBuf>) -> Self {
        if headless {
            RunMode::Headless { frames, output }
        } else {
            RunMode::Terminal
        }
    }
}

/// Build a context with `names` loaded and enabled in order
fn build_context(names: &[String]) -> VelvetResult<PipelineContext> {
    let mut ctx = PipelineContext::new();
    if names.is_empty() {
        for name in DEFAULT_ACTIVE {
            ctx.use_processor(name)?;
        }
    } else {
        for name in names {
            if !ctx.registry().contains(name) {
                warn!(name = %name, "Processor is not registered and will be skipped");
            }
            ctx.use_processor(name)?;
        }
    }
    Ok(ctx)
}

fn constraints(config: &Config) -> CaptureConstraints {
    CaptureConstraints {
        width: config.capture.width,
        height: config.capture.height,
    }
}

/// Stream `spec` through the processors until stopped
pub fn run(
    config: &Config,
    spec: &SourceSpec,
    processors: &[String],
    mode: RunMode,
) -> VelvetResult<()> {
    let mut ctx = build_context(processors)?;

    // Set up Ctrl+C handler
    let switch = ctx.kill_switch().clone();
    ctrlc::set_handler(move || switch.trip())
        .map_err(|e| VelvetError::Io(format!("Failed to install Ctrl+C handler: {}", e)))?;

    info!(source = %spec, processors = ?ctx.active_processors(), "Starting stream");
    let mut session = CaptureSession::new(create_source(spec), constraints(config));
    let mut reader = Canvas::default();
    let mut scheduler = LoopScheduler::new();

    match mode {
        RunMode::Terminal => {
            let ui = TerminalUi::new(config.snapshot_dir()).shared();
            let mut writer = TerminalSurface::new(ui.clone())?;
            let mut driver = TerminalDriver::new(ui, config.refresh_rate_hz);

            let result =
                scheduler.run(&mut ctx, &mut session, &mut reader, &mut writer, &mut driver);
            writer.restore()?;

            let report = result?;
            println!("Rendered {} frames from {}", report.ticks, spec);
        }
        RunMode::Headless { frames, output } => {
            let mut writer = RetainingCanvas::new();
            let mut driver = IntervalDriver::new(config.refresh_rate_hz);
            if let Some(frames) = frames {
                driver = driver.with_limit(frames);
            }

            let report =
                scheduler.run(&mut ctx, &mut session, &mut reader, &mut writer, &mut driver)?;
            println!("Rendered {} frames from {}", report.ticks, spec);

            if let Some(path) = output {
                let frame = writer
                    .into_last_frame()
                    .ok_or_else(|| VelvetError::Render("no frame was rendered".to_string()))?;
                storage::save_frame(frame, &path)?;
                println!("Saved: {}", path.display());
            }
        }
    }

    Ok(())
}

/// One pipeline tick over a still image
pub fn process_image(
    config: &Config,
    input: &Path,
    output: &Path,
    processors: &[String],
) -> VelvetResult<()> {
    let ctx = build_context(processors)?;
    let mut session = CaptureSession::new(
        create_source(&SourceSpec::Image(input.to_path_buf())),
        constraints(config),
    );
    session.activate(ctx.kill_switch())?;

    let mut reader = Canvas::default();
    let mut writer = Canvas::default();
    FramePipeline::new().tick(&ctx, &mut session, &mut reader, &mut writer)?;
    session.stop();

    storage::save_frame(writer.snapshot()?, output)?;
    println!(
        "Processed {} with [{}] -> {}",
        input.display(),
        ctx.active_processors().join(", "),
        output.display()
    );
    Ok(())
}

/// List registered processors
pub fn list_processors() -> VelvetResult<()> {
    let ctx = PipelineContext::new();
    println!("Available processors:");
    for name in ctx.registry().names() {
        let marker = if DEFAULT_ACTIVE.contains(&name) {
            " (default)"
        } else {
            ""
        };
        println!("  {}{}", name, marker);
    }
    Ok(())
}

/// List all capture devices
pub fn list_devices() -> VelvetResult<()> {
    let devices = enumerate_devices();
    if devices.is_empty() {
        println!("No capture devices found.");
        return Ok(());
    }

    println!("Available capture devices:");
    for device in devices {
        println!("  [{}] {} ({})", device.index, device.name, device.path.display());
    }
    Ok(())
}

/// Print the resolved config, or write a default one with `init`
pub fn show_config(config: &Config, explicit: Option<&Path>, init: bool) -> VelvetResult<()> {
    if !init {
        let json = serde_json::to_string_pretty(config)?;
        println!("{}", json);
        return Ok(());
    }

    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()
            .ok_or_else(|| VelvetError::Config("no config directory on this system".to_string()))?,
    };
    if path.exists() {
        return Err(VelvetError::Config(format!(
            "{} already exists",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

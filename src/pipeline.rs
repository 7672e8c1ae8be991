// SPDX-License-Identifier: GPL-3.0-only

//! Frame pipeline
//!
//! One tick draws the current stream frame into the reader surface, reads the
//! bytes back, threads every pixel through the active processors and puts the
//! result on the writer surface.
//!
//! Within a tick pixels are processed in increasing index order and, for each
//! pixel, processors run in active-list order. The active list is read once at
//! the start of the transform step, so chain changes apply from the next tick.

use crate::constants::timing::FRAME_LOG_INTERVAL;
use crate::context::PipelineContext;
use crate::errors::VelvetResult;
use crate::frame::{self, Frame};
use crate::render::RenderTarget;
use crate::scheduler::LoopAction;
use crate::stream::CaptureSession;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Apply `active` processors to every pixel of `frame`
///
/// An empty list returns the frame untouched. Unknown names are skipped. Fails
/// with `Disabled` before touching the frame when the kill switch is tripped,
/// or partway through when it trips mid-frame.
pub fn process_frame(
    ctx: &PipelineContext,
    mut frame: Frame,
    active: &[String],
) -> VelvetResult<Frame> {
    let switch = ctx.kill_switch();
    switch.ensure_enabled()?;

    if active.is_empty() {
        return Ok(frame);
    }

    let registry = ctx.registry();
    let pixel_count = frame.pixel_count();
    let buffer = frame.as_bytes_mut();

    for index in 0..pixel_count {
        let mut pixel = frame::decode_pixel(buffer, index);
        for name in active {
            pixel = registry.apply(name, switch, pixel)?;
        }
        frame::encode(&pixel, buffer);
    }

    Ok(frame)
}

/// Stop the stream and clear both surfaces
///
/// Clearing failures are logged, teardown always runs to the end.
pub fn teardown(
    session: &mut CaptureSession,
    reader: &mut dyn RenderTarget,
    writer: &mut dyn RenderTarget,
) {
    session.stop();
    if let Err(e) = reader.clear_all() {
        warn!(error = %e, "Failed to clear reader surface during teardown");
    }
    if let Err(e) = writer.clear_all() {
        warn!(error = %e, "Failed to clear writer surface during teardown");
    }
    debug!("Pipeline torn down");
}

/// Per-stream tick state
#[derive(Debug, Default)]
pub struct FramePipeline {
    ticks: u64,
    started: Option<Instant>,
}

impl FramePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick
    ///
    /// Returns `Stop` after tearing down when the kill switch is tripped,
    /// whether before the tick starts or while pixels are being processed.
    pub fn tick(
        &mut self,
        ctx: &PipelineContext,
        session: &mut CaptureSession,
        reader: &mut dyn RenderTarget,
        writer: &mut dyn RenderTarget,
    ) -> VelvetResult<LoopAction> {
        if !ctx.is_enabled() {
            teardown(session, reader, writer);
            return Ok(LoopAction::Stop);
        }

        let Some(current) = session.current_frame()? else {
            return Ok(LoopAction::Continue);
        };

        let (width, height) = current.dimensions();
        if reader.size() != (width, height) {
            debug!(width, height, "Resizing render targets to stream");
            reader.resize(width, height);
        }
        if writer.size() != (width, height) {
            writer.resize(width, height);
        }

        reader.draw_frame(current, 0, 0, width, height)?;
        let bytes = reader.get_pixel_bytes(0, 0, width, height)?;
        let input = Frame::new(width, height, bytes)?;

        let output = match process_frame(ctx, input, ctx.active_processors()) {
            Ok(output) => output,
            Err(e) if e.is_disabled() => {
                teardown(session, reader, writer);
                return Ok(LoopAction::Stop);
            }
            Err(e) => return Err(e),
        };

        writer.put_pixel_bytes(output.as_bytes(), 0, 0, width, height)?;

        self.ticks += 1;
        let started = *self.started.get_or_insert_with(Instant::now);
        if self.ticks % FRAME_LOG_INTERVAL == 0 {
            let elapsed = started.elapsed().as_secs_f64();
            let fps = if elapsed > 0.0 {
                self.ticks as f64 / elapsed
            } else {
                0.0
            };
            info!(
                ticks = self.ticks,
                width,
                height,
                processors = ?ctx.active_processors(),
                fps = format!("{:.1}", fps),
                "Pipeline running"
            );
        }

        Ok(LoopAction::Continue)
    }
}

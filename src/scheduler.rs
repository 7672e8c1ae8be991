// SPDX-License-Identifier: GPL-3.0-only

//! Loop scheduler
//!
//! ```text
//!   Idle ──first frame──▶ Streaming ──kill switch──▶ Stopped
//! ```
//!
//! The scheduler runs one pipeline tick per display refresh. The next tick
//! starts only after the previous one has rendered, and nothing runs between
//! them except the refresh driver, which is where UI events mutate the
//! context. Stopped is terminal; a new scheduler and session are needed to
//! stream again.

use crate::constants::timing::refresh_interval;
use crate::context::PipelineContext;
use crate::errors::VelvetResult;
use crate::pipeline::{FramePipeline, teardown};
use crate::render::RenderTarget;
use crate::stream::CaptureSession;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of one iteration of a loop body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop
    Stop,
}

/// Lifecycle of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Waiting for the first frame
    #[default]
    Idle,
    /// One pipeline tick per refresh
    Streaming,
    /// Torn down, terminal
    Stopped,
}

/// Paces the loop to the display refresh
pub trait RefreshDriver {
    /// Block until the next refresh, applying any UI events that arrive
    /// meanwhile to `ctx`
    fn next_refresh(&mut self, ctx: &mut PipelineContext) -> VelvetResult<()>;

    /// Wait while no frame has arrived yet
    fn wait_idle(&mut self, ctx: &mut PipelineContext) -> VelvetResult<()> {
        self.next_refresh(ctx)
    }
}

/// Fixed-rate driver for headless runs
///
/// With a refresh limit, the kill switch is tripped once that many refreshes
/// have elapsed, so exactly `limit` frames are rendered. The first frame is
/// drawn before any refresh, so a limit of zero still renders one.
#[derive(Debug)]
pub struct IntervalDriver {
    interval: Duration,
    limit: Option<u64>,
    refreshes: u64,
    last: Option<Instant>,
}

impl IntervalDriver {
    pub fn new(rate_hz: u32) -> Self {
        Self::with_interval(refresh_interval(rate_hz))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            limit: None,
            refreshes: 0,
            last: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    fn sleep_remaining(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

impl RefreshDriver for IntervalDriver {
    fn next_refresh(&mut self, ctx: &mut PipelineContext) -> VelvetResult<()> {
        self.sleep_remaining();
        self.refreshes += 1;
        if let Some(limit) = self.limit
            && self.refreshes >= limit
        {
            debug!(limit, "Refresh limit reached");
            ctx.kill_switch().trip();
        }
        Ok(())
    }

    /// Idle waits do not count toward the limit
    fn wait_idle(&mut self, _ctx: &mut PipelineContext) -> VelvetResult<()> {
        self.sleep_remaining();
        Ok(())
    }
}

/// Summary of a finished stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    /// Frames rendered
    pub ticks: u64,
    pub final_state: StreamState,
}

/// Drives a [`FramePipeline`] through the stream states
#[derive(Debug, Default)]
pub struct LoopScheduler {
    state: StreamState,
    pipeline: FramePipeline,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.pipeline.ticks()
    }

    /// Advance the state machine by one step
    ///
    /// Returns the state reached. The caller waits for the next refresh
    /// between steps.
    pub fn step(
        &mut self,
        ctx: &PipelineContext,
        session: &mut CaptureSession,
        reader: &mut dyn RenderTarget,
        writer: &mut dyn RenderTarget,
    ) -> VelvetResult<StreamState> {
        match self.state {
            StreamState::Idle => {
                if !ctx.is_enabled() {
                    teardown(session, reader, writer);
                    self.transition(StreamState::Stopped);
                } else if session.poll_playback()? {
                    self.transition(StreamState::Streaming);
                }
            }
            StreamState::Streaming => {
                if self.pipeline.tick(ctx, session, reader, writer)? == LoopAction::Stop {
                    self.transition(StreamState::Stopped);
                }
            }
            StreamState::Stopped => {}
        }
        Ok(self.state)
    }

    /// Run the stream until it stops
    ///
    /// Activates the session if needed. Any error tears the stream down
    /// before it is returned.
    pub fn run(
        &mut self,
        ctx: &mut PipelineContext,
        session: &mut CaptureSession,
        reader: &mut dyn RenderTarget,
        writer: &mut dyn RenderTarget,
        driver: &mut dyn RefreshDriver,
    ) -> VelvetResult<StreamReport> {
        if self.state == StreamState::Stopped {
            warn!("Scheduler already stopped, start a new stream to continue");
            return Ok(self.report());
        }

        if let Err(e) = self.drive(ctx, session, reader, writer, driver) {
            error!(error = %e, state = ?self.state, "Stream failed");
            teardown(session, reader, writer);
            self.transition(StreamState::Stopped);
            return Err(e);
        }

        info!(ticks = self.ticks(), "Stream finished");
        Ok(self.report())
    }

    fn drive(
        &mut self,
        ctx: &mut PipelineContext,
        session: &mut CaptureSession,
        reader: &mut dyn RenderTarget,
        writer: &mut dyn RenderTarget,
        driver: &mut dyn RefreshDriver,
    ) -> VelvetResult<()> {
        if !session.is_active() && ctx.is_enabled() {
            session.activate(ctx.kill_switch())?;
        }

        loop {
            let previous = self.state;
            match self.step(ctx, session, reader, writer)? {
                StreamState::Stopped => return Ok(()),
                // Render the first frame right away
                StreamState::Streaming if previous == StreamState::Idle => {}
                StreamState::Streaming => driver.next_refresh(ctx)?,
                StreamState::Idle => driver.wait_idle(ctx)?,
            }
        }
    }

    fn transition(&mut self, next: StreamState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Stream state transition");
            self.state = next;
        }
    }

    fn report(&self) -> StreamReport {
        StreamReport {
            ticks: self.ticks(),
            final_state: self.state,
        }
    }
}

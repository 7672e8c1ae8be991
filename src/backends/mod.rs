// SPDX-License-Identifier: GPL-3.0-only

//! Capture backends
//!
//! A [`CaptureSource`] is the live frame provider behind a stream: a webcam,
//! a still image played as a stream, or a synthetic pattern.
//!
//! ```text
//! ┌──────────────────┐
//! │  CaptureSession  │  ← readiness, teardown, last frame
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ CaptureSource    │  ← common interface
//! └────────┬─────────┘
//!          │
//!    ┌─────┼──────────┐
//!    ▼     ▼          ▼
//!  V4L2  Image     Pattern
//! ```

pub mod file_source;
pub mod format_converters;
pub mod frame_loop;
pub mod pattern;
pub mod v4l2;

pub use file_source::ImageSource;
pub use frame_loop::CaptureLoop;
pub use pattern::PatternSource;
pub use v4l2::{V4l2Source, enumerate_devices};

use crate::constants::capture::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::errors::VelvetResult;
use crate::frame::Frame;
use std::path::PathBuf;

/// Resolution the stream asks the device for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// What an opened source actually delivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Native pixel format before conversion to RGBA (e.g. "YUYV", "MJPG")
    pub pixel_format: String,
}

impl std::fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
    }
}

/// Live frame provider
pub trait CaptureSource: Send {
    /// Human readable description for logs and status lines
    fn describe(&self) -> String;

    /// Acquire the device and start delivering frames
    fn open(&mut self, constraints: &CaptureConstraints) -> VelvetResult<StreamInfo>;

    /// Most recent frame produced since the last call, if any
    fn next_frame(&mut self) -> VelvetResult<Option<Frame>>;

    /// Stop every track and release the device. Safe to call repeatedly.
    fn stop(&mut self);

    fn is_open(&self) -> bool;
}

/// Which kind of source to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Device(PathBuf),
    Image(PathBuf),
    Pattern,
}

impl std::fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSpec::Device(path) => write!(f, "device {}", path.display()),
            SourceSpec::Image(path) => write!(f, "image {}", path.display()),
            SourceSpec::Pattern => write!(f, "test pattern"),
        }
    }
}

/// Build the source described by `spec`
pub fn create_source(spec: &SourceSpec) -> Box<dyn CaptureSource> {
    match spec {
        SourceSpec::Device(path) => Box::new(V4l2Source::new(path.clone())),
        SourceSpec::Image(path) => Box::new(ImageSource::new(path.clone())),
        SourceSpec::Pattern => Box::new(PatternSource::new()),
    }
}

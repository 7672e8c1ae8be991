// SPDX-License-Identifier: GPL-3.0-only

//! Velvet - real-time per-pixel processing of live camera video
//!
//! Frames are captured from a webcam (or a still image, or a test pattern),
//! every pixel is threaded through an ordered chain of named processors, and
//! the result is rendered once per display refresh.
//!
//! # Architecture
//!
//! - [`frame`]: RGBA frames and the pixel codec
//! - [`processors`]: processor registry and the built-in transforms
//! - [`chain`]: loaded and active processor chains
//! - [`context`]: per-session state and the kill switch
//! - [`pipeline`]: one frame tick
//! - [`scheduler`]: the Idle/Streaming/Stopped loop and refresh drivers
//! - [`stream`]: capture session lifecycle
//! - [`backends`]: capture sources (V4L2, image, pattern)
//! - [`render`]: render targets (in-memory canvas, terminal)
//! - [`config`]: user configuration handling
//! - [`storage`]: snapshot files
//!
//! # Example
//!
//! ```
//! use velvet::{Frame, PipelineContext, process_frame};
//!
//! let mut ctx = PipelineContext::new();
//! ctx.enable_processor("grayscale").unwrap();
//!
//! let white = Frame::filled(1, 1, [255, 255, 255, 255]);
//! let out = process_frame(&ctx, white, ctx.active_processors()).unwrap();
//! assert_eq!(out.as_bytes(), &[255, 255, 255, 255]);
//! ```

pub mod backends;
pub mod chain;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod frame;
pub mod pipeline;
pub mod processors;
pub mod render;
pub mod scheduler;
pub mod storage;
pub mod stream;

// Re-export commonly used types
pub use backends::{CaptureConstraints, CaptureSource, SourceSpec, StreamInfo};
pub use chain::{ChainKind, ProcessorChain};
pub use config::Config;
pub use context::{KillSwitch, PipelineContext};
pub use errors::{VelvetError, VelvetResult};
pub use frame::{Frame, Pixel};
pub use pipeline::{FramePipeline, process_frame};
pub use processors::ProcessorRegistry;
pub use render::{Canvas, RenderTarget, RetainingCanvas};
pub use scheduler::{
    IntervalDriver, LoopAction, LoopScheduler, RefreshDriver, StreamReport, StreamState,
};
pub use stream::{CaptureSession, StreamEvent};

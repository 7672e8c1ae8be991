// SPDX-License-Identifier: GPL-3.0-only

//! Still image played as a stream
//!
//! Useful without a webcam: the same picture is delivered on every refresh,
//! so processors can be compared on a known input.

use super::{CaptureConstraints, CaptureSource, StreamInfo};
use crate::constants::file_formats;
use crate::errors::{VelvetError, VelvetResult};
use crate::frame::Frame;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> VelvetResult<Frame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(VelvetError::UnrecognizedMediaStream(format!(
            "unsupported file format: {}",
            path.display()
        )));
    }

    if !path.exists() {
        return Err(VelvetError::DeviceAcquisition(format!(
            "{} does not exist",
            path.display()
        )));
    }

    let img = image::open(path).map_err(|e| {
        VelvetError::UnrecognizedMediaStream(format!("Failed to load {}: {}", path.display(), e))
    })?;
    let frame = Frame::from_rgba_image(img.to_rgba8());

    debug!(path = %path.display(), width = frame.width(), height = frame.height(), "Loaded image");
    Ok(frame)
}

/// Source that repeats one decoded image
pub struct ImageSource {
    path: PathBuf,
    frame: Option<Frame>,
}

impl ImageSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path, frame: None }
    }
}

impl CaptureSource for ImageSource {
    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }

    /// The image keeps its own size, constraints only apply to devices
    fn open(&mut self, _constraints: &CaptureConstraints) -> VelvetResult<StreamInfo> {
        let frame = load_image_as_frame(&self.path)?;
        let info = StreamInfo {
            width: frame.width(),
            height: frame.height(),
            pixel_format: "RGBA".to_string(),
        };
        info!(path = %self.path.display(), stream = %info, "Image source opened");
        self.frame = Some(frame);
        Ok(info)
    }

    fn next_frame(&mut self) -> VelvetResult<Option<Frame>> {
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        self.frame = None;
    }

    fn is_open(&self) -> bool {
        self.frame.is_some()
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic moving test pattern

use super::{CaptureConstraints, CaptureSource, StreamInfo};
use crate::errors::{VelvetError, VelvetResult};
use crate::frame::Frame;
use tracing::info;

/// Diagonal color gradient that scrolls by one pixel per frame
pub struct PatternSource {
    size: Option<(u32, u32)>,
    phase: u32,
}

impl PatternSource {
    pub fn new() -> Self {
        Self {
            size: None,
            phase: 0,
        }
    }

    /// Render the pattern at a given phase
    pub fn render(width: u32, height: u32, phase: u32) -> Frame {
        let mut frame = Frame::blank(width, height);
        let w = width as usize;
        for (i, px) in frame.as_bytes_mut().chunks_exact_mut(4).enumerate() {
            let x = (i % w) as u32;
            let y = (i / w) as u32;
            px[0] = (x.wrapping_add(phase) % 256) as u8;
            px[1] = (y.wrapping_add(phase) % 256) as u8;
            px[2] = ((x + y) / 2 % 256) as u8;
            px[3] = 255;
        }
        frame
    }
}

impl Default for PatternSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for PatternSource {
    fn describe(&self) -> String {
        "test pattern".to_string()
    }

    fn open(&mut self, constraints: &CaptureConstraints) -> VelvetResult<StreamInfo> {
        if constraints.width == 0 || constraints.height == 0 {
            return Err(VelvetError::DeviceAcquisition(format!(
                "cannot generate a {}x{} pattern",
                constraints.width, constraints.height
            )));
        }
        self.size = Some((constraints.width, constraints.height));
        self.phase = 0;
        let info = StreamInfo {
            width: constraints.width,
            height: constraints.height,
            pixel_format: "RGBA".to_string(),
        };
        info!(stream = %info, "Test pattern opened");
        Ok(info)
    }

    fn next_frame(&mut self) -> VelvetResult<Option<Frame>> {
        let Some((width, height)) = self.size else {
            return Ok(None);
        };
        let frame = Self::render(width, height, self.phase);
        self.phase = self.phase.wrapping_add(1);
        Ok(Some(frame))
    }

    fn stop(&mut self) {
        self.size = None;
    }

    fn is_open(&self) -> bool {
        self.size.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_scrolls() {
        let mut source = PatternSource::new();
        source
            .open(&CaptureConstraints { width: 4, height: 2 })
            .unwrap();

        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(first.dimensions(), (4, 2));
        assert_eq!(first.pixel(1).unwrap().red, 1);
        assert_eq!(second.pixel(1).unwrap().red, 2);
        assert_eq!(second.pixel(4).unwrap().green, 2);
    }

    #[test]
    fn test_closed_pattern_yields_nothing() {
        let mut source = PatternSource::new();
        assert_eq!(source.next_frame().unwrap(), None);
        source
            .open(&CaptureConstraints { width: 1, height: 1 })
            .unwrap();
        source.stop();
        assert!(!source.is_open());
        assert_eq!(source.next_frame().unwrap(), None);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut source = PatternSource::new();
        let err = source
            .open(&CaptureConstraints { width: 0, height: 10 })
            .unwrap_err();
        assert!(matches!(err, VelvetError::DeviceAcquisition(_)));
    }
}

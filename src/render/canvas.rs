// SPDX-License-Identifier: GPL-3.0-only

//! In-memory RGBA surface

use super::RenderTarget;
use crate::constants::CHANNELS;
use crate::errors::{VelvetError, VelvetResult};
use crate::frame::{Frame, byte_len};

/// Plain RGBA pixel surface
///
/// Used as the reader surface of every stream and as the writer surface of
/// headless runs. Rectangles reaching outside the surface are clipped.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy of the surface contents as a frame
    pub fn snapshot(&self) -> VelvetResult<Frame> {
        Frame::new(self.width, self.height, self.data.clone())
    }

    /// RGB triple at (`x`, `y`), clamped to the surface
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = (y * self.width as usize + x) * CHANNELS;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    fn row_offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Visible columns of a `w`-wide span starting at `x`
    fn clip_span(&self, x: u32, w: u32) -> u32 {
        if x >= self.width {
            0
        } else {
            w.min(self.width - x)
        }
    }

    fn clip_rows(&self, y: u32, h: u32) -> u32 {
        if y >= self.height {
            0
        } else {
            h.min(self.height - y)
        }
    }
}

impl RenderTarget for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data = vec![0; byte_len(width, height)];
    }

    fn draw_frame(&mut self, frame: &Frame, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()> {
        if w == 0 || h == 0 || frame.pixel_count() == 0 {
            return Ok(());
        }

        // Same size: plain row copies
        if (w, h) == frame.dimensions() {
            return self.put_pixel_bytes(frame.as_bytes(), x, y, w, h);
        }

        // Nearest-neighbour scaling into the destination rectangle
        let src = frame.as_bytes();
        let x_scale = frame.width() as f64 / w as f64;
        let y_scale = frame.height() as f64 / h as f64;
        let cols = self.clip_span(x, w);
        let rows = self.clip_rows(y, h);

        for dy in 0..rows {
            let sy = ((dy as f64 * y_scale) as u32).min(frame.height() - 1);
            for dx in 0..cols {
                let sx = ((dx as f64 * x_scale) as u32).min(frame.width() - 1);
                let s = (sy as usize * frame.width() as usize + sx as usize) * CHANNELS;
                let d = self.row_offset(x + dx, y + dy);
                self.data[d..d + CHANNELS].copy_from_slice(&src[s..s + CHANNELS]);
            }
        }
        Ok(())
    }

    fn get_pixel_bytes(&self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<Vec<u8>> {
        let mut out = vec![0u8; byte_len(w, h)];
        let cols = self.clip_span(x, w) as usize;
        let rows = self.clip_rows(y, h);
        if cols == 0 {
            return Ok(out);
        }

        for row in 0..rows {
            let s = self.row_offset(x, y + row);
            let d = row as usize * w as usize * CHANNELS;
            out[d..d + cols * CHANNELS].copy_from_slice(&self.data[s..s + cols * CHANNELS]);
        }
        Ok(out)
    }

    fn put_pixel_bytes(
        &mut self,
        bytes: &[u8],
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> VelvetResult<()> {
        if bytes.len() != byte_len(w, h) {
            return Err(VelvetError::Render(format!(
                "expected {} bytes for a {}x{} region, got {}",
                byte_len(w, h),
                w,
                h,
                bytes.len()
            )));
        }

        let cols = self.clip_span(x, w) as usize;
        let rows = self.clip_rows(y, h);
        if cols == 0 {
            return Ok(());
        }

        for row in 0..rows {
            let s = row as usize * w as usize * CHANNELS;
            let d = self.row_offset(x, y + row);
            self.data[d..d + cols * CHANNELS].copy_from_slice(&bytes[s..s + cols * CHANNELS]);
        }
        Ok(())
    }

    fn clear(&mut self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()> {
        let cols = self.clip_span(x, w) as usize;
        let rows = self.clip_rows(y, h);
        if cols == 0 {
            return Ok(());
        }

        for row in 0..rows {
            let d = self.row_offset(x, y + row);
            self.data[d..d + cols * CHANNELS].fill(0);
        }
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Canvas({}x{})", self.width, self.height)
    }
}

/// Headless output that remembers the last frame put on it
///
/// Teardown clears the surface, the retained frame survives it so the final
/// output can still be written out.
#[derive(Debug, Default)]
pub struct RetainingCanvas {
    canvas: Canvas,
    last: Option<Frame>,
}

impl RetainingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fully rendered frame, if any
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn into_last_frame(self) -> Option<Frame> {
        self.last
    }
}

impl RenderTarget for RetainingCanvas {
    fn size(&self) -> (u32, u32) {
        self.canvas.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
    }

    fn draw_frame(&mut self, frame: &Frame, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()> {
        self.canvas.draw_frame(frame, x, y, w, h)?;
        self.last = Some(self.canvas.snapshot()?);
        Ok(())
    }

    fn get_pixel_bytes(&self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<Vec<u8>> {
        self.canvas.get_pixel_bytes(x, y, w, h)
    }

    fn put_pixel_bytes(
        &mut self,
        bytes: &[u8],
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> VelvetResult<()> {
        self.canvas.put_pixel_bytes(bytes, x, y, w, h)?;
        self.last = Some(self.canvas.snapshot()?);
        Ok(())
    }

    fn clear(&mut self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()> {
        self.canvas.clear(x, y, w, h)
    }
}

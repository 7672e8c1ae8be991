// SPDX-License-Identifier: GPL-3.0-only

//! Drawable render targets
//!
//! The pipeline uses two independent surfaces: a *reader* the captured frame is
//! drawn into and read back from, and a *writer* the processed bytes are put on.

pub mod canvas;
pub mod terminal;

pub use canvas::{Canvas, RetainingCanvas};
pub use terminal::{TerminalDriver, TerminalSurface, TerminalUi};

use crate::errors::VelvetResult;
use crate::frame::Frame;

/// A surface the pipeline can draw to and read from
pub trait RenderTarget {
    /// Current surface size in pixels
    fn size(&self) -> (u32, u32);

    /// Resize the surface, discarding its contents
    fn resize(&mut self, width: u32, height: u32);

    /// Draw `frame` scaled into the `w x h` rectangle at (`x`, `y`)
    fn draw_frame(&mut self, frame: &Frame, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()>;

    /// Copy out the RGBA bytes of a rectangle; pixels outside the surface read as transparent black
    fn get_pixel_bytes(&self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<Vec<u8>>;

    /// Put `w x h` RGBA bytes with their top-left corner at (`x`, `y`)
    fn put_pixel_bytes(&mut self, bytes: &[u8], x: u32, y: u32, w: u32, h: u32)
    -> VelvetResult<()>;

    /// Reset a rectangle to transparent black
    fn clear(&mut self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()>;

    /// Clear the whole surface
    fn clear_all(&mut self) -> VelvetResult<()> {
        let (width, height) = self.size();
        self.clear(0, 0, width, height)
    }
}

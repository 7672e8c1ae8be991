// SPDX-License-Identifier: GPL-3.0-only

//! Grayscale processor
//!
//! Computes linear luminance with the Rec. 709 weights and encodes it with the
//! sRGB transfer function. See <https://en.wikipedia.org/wiki/SRGB>.

use crate::context::KillSwitch;
use crate::errors::VelvetResult;
use crate::frame::Pixel;

pub const RED_WEIGHT: f64 = 0.2126;
pub const GREEN_WEIGHT: f64 = 0.7152;
pub const BLUE_WEIGHT: f64 = 0.0722;

/// At or below this linear value the transfer function is the linear segment
pub const LINEAR_THRESHOLD: f64 = 0.0031308;

const LINEAR_SLOPE: f64 = 12.92;
const GAMMA: f64 = 2.4;
const SCALE: f64 = 1.055;
const OFFSET: f64 = 0.055;

/// Absorbs binary rounding of the constants above so full-scale white floors to 255
const FLOOR_EPSILON: f64 = 1e-9;

/// Linear luminance of an RGB triple, in 0.0..=1.0
pub fn linear_luminance(red: u8, green: u8, blue: u8) -> f64 {
    RED_WEIGHT * (red as f64 / 255.0)
        + GREEN_WEIGHT * (green as f64 / 255.0)
        + BLUE_WEIGHT * (blue as f64 / 255.0)
}

/// sRGB-encoded luma of an RGB triple
pub fn luma(red: u8, green: u8, blue: u8) -> u8 {
    let c_linear = linear_luminance(red, green, blue);
    let encoded = if c_linear <= LINEAR_THRESHOLD {
        LINEAR_SLOPE * c_linear
    } else {
        SCALE * c_linear.powf(1.0 / GAMMA) - OFFSET
    };
    (encoded * 255.0 + FLOOR_EPSILON).floor().clamp(0.0, 255.0) as u8
}

/// Replace the color channels with the pixel's luma and make it opaque
pub fn compute(switch: &KillSwitch, pixel: Pixel) -> VelvetResult<Pixel> {
    switch.ensure_enabled()?;
    Ok(Pixel::gray(
        pixel.index,
        luma(pixel.red, pixel.green, pixel.blue),
    ))
}

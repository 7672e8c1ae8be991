// SPDX-License-Identifier: GPL-3.0-only

//! Modulus processor, a pattern that grows across the frame and wraps every
//! 256 steps of the pixel index.

use crate::context::KillSwitch;
use crate::errors::VelvetResult;
use crate::frame::Pixel;

/// Mean of the three color channels, normalized to 0.0..=1.0
pub fn intensity(pixel: &Pixel) -> f64 {
    (pixel.red as f64 / 255.0 + pixel.green as f64 / 255.0 + pixel.blue as f64 / 255.0) / 3.0
}

/// `floor(intensity * index) mod 256`
pub fn level(pixel: &Pixel) -> u8 {
    let scaled = (intensity(pixel) * pixel.index as f64).floor();
    (scaled as u64 % 256) as u8
}

pub fn compute(switch: &KillSwitch, pixel: Pixel) -> VelvetResult<Pixel> {
    switch.ensure_enabled()?;
    Ok(Pixel::gray(pixel.index, level(&pixel)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pixel: Pixel) -> Pixel {
        compute(&KillSwitch::new(), pixel).unwrap()
    }

    #[test]
    fn test_white_pixel_at_index_five() {
        assert_eq!(
            run(Pixel::new(5, 255, 255, 255, 255)),
            Pixel::new(5, 5, 5, 5, 255)
        );
    }

    #[test]
    fn test_wraps_every_256() {
        let white = |index| Pixel::new(index, 255, 255, 255, 0);
        assert_eq!(run(white(255)).red, 255);
        assert_eq!(run(white(256)).red, 0);
        assert_eq!(run(white(300)).red, 44);
    }

    #[test]
    fn test_black_is_always_zero() {
        for index in [0, 1, 1000, 921_599] {
            assert_eq!(run(Pixel::new(index, 0, 0, 0, 0)), Pixel::gray(index, 0));
        }
    }

    #[test]
    fn test_output_in_range_and_opaque() {
        for index in (0..5000).step_by(37) {
            for v in (0..=255u8).step_by(51) {
                let out = run(Pixel::new(index, v, 255 - v, v / 3, 9));
                assert!(out.is_gray());
                assert_eq!(out.alpha, 255);
                assert_eq!(out.index, index);
            }
        }
    }
}

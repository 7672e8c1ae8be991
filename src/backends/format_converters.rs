// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion from device formats to RGBA
//!
//! Every capture backend hands the pipeline tightly packed RGBA, so whatever
//! the device negotiated is converted here first.

use crate::errors::{VelvetError, VelvetResult};
use crate::frame::Frame;
use image::ImageFormat;

/// Device pixel formats the V4L2 backend can convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePixelFormat {
    /// YUV 4:2:2, Y0 U0 Y1 V0
    Yuyv,
    /// Motion JPEG, one JPEG image per buffer
    Mjpeg,
    /// Packed 24-bit RGB
    Rgb24,
}

impl CapturePixelFormat {
    /// Parse a V4L2 FourCC string
    pub fn from_fourcc(fourcc: &str) -> Option<Self> {
        match fourcc {
            "YUYV" | "YUY2" => Some(Self::Yuyv),
            "MJPG" | "JPEG" => Some(Self::Mjpeg),
            "RGB3" => Some(Self::Rgb24),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> &'static str {
        match self {
            Self::Yuyv => "YUYV",
            Self::Mjpeg => "MJPG",
            Self::Rgb24 => "RGB3",
        }
    }

    /// Convert one captured buffer into an RGBA frame
    ///
    /// `stride` is the length of one row in bytes as reported by the driver,
    /// zero means tightly packed.
    pub fn to_frame(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> VelvetResult<Frame> {
        match self {
            Self::Yuyv => Frame::new(width, height, yuyv_to_rgba(data, width, height, stride)),
            Self::Mjpeg => mjpeg_to_frame(data),
            Self::Rgb24 => Frame::new(width, height, rgb_to_rgba(data, width, height, stride)),
        }
    }
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// Each 4-byte group encodes 2 pixels. Uses BT.601 coefficients.
/// Rows shorter than `stride` padding are skipped, missing data stays black.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let row_bytes = w * 2;
    let stride = if (stride as usize) < row_bytes {
        row_bytes
    } else {
        stride as usize
    };

    let mut rgba = vec![0u8; w * h * 4];
    if w == 0 {
        return rgba;
    }
    for (y, out_row) in rgba.chunks_exact_mut(w * 4).enumerate().take(h) {
        let start = y * stride;
        let Some(row) = data.get(start..start + row_bytes) else {
            break;
        };

        for (pair, chunk) in row.chunks_exact(4).enumerate() {
            let y0 = chunk[0];
            let u = chunk[1];
            let y1 = chunk[2];
            let v = chunk[3];

            for (i, luma) in [y0, y1].into_iter().enumerate() {
                let x = pair * 2 + i;
                if x >= w {
                    break;
                }
                let (r, g, b) = yuv_to_rgb(luma, u, v);
                out_row[x * 4..x * 4 + 4].copy_from_slice(&[r, g, b, 255]);
            }
        }
    }

    rgba
}

/// BT.601 conversion of one YUV sample
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
    (r, g, b)
}

/// Convert packed RGB to RGBA by adding alpha=255
///
/// Same stride handling as [`yuyv_to_rgba`].
pub fn rgb_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let row_bytes = w * 3;
    let stride = (stride as usize).max(row_bytes);

    let mut rgba = vec![0u8; w * h * 4];
    if w == 0 {
        return rgba;
    }
    for (y, out_row) in rgba.chunks_exact_mut(w * 4).enumerate().take(h) {
        let start = y * stride;
        let Some(row) = data.get(start..start + row_bytes) else {
            break;
        };
        for (px, chunk) in out_row.chunks_exact_mut(4).zip(row.chunks_exact(3)) {
            px.copy_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
        }
    }
    rgba
}

/// Decode one MJPEG buffer
///
/// The decoded size wins over the negotiated one, some drivers report stale
/// dimensions after a mode switch.
pub fn mjpeg_to_frame(data: &[u8]) -> VelvetResult<Frame> {
    let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| VelvetError::InvalidFrame(format!("MJPEG decode failed: {}", e)))?;
    Ok(Frame::from_rgba_image(decoded.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_parsing() {
        use CapturePixelFormat::*;
        assert_eq!(CapturePixelFormat::from_fourcc("YUYV"), Some(Yuyv));
        assert_eq!(CapturePixelFormat::from_fourcc("MJPG"), Some(Mjpeg));
        assert_eq!(CapturePixelFormat::from_fourcc("RGB3"), Some(Rgb24));
        assert_eq!(CapturePixelFormat::from_fourcc("H264"), None);
        assert_eq!(CapturePixelFormat::Yuyv.fourcc(), "YUYV");
    }

    #[test]
    fn test_yuv_neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
        assert_eq!(yuv_to_rgb(100, 128, 128), (100, 100, 100));
    }

    #[test]
    fn test_yuyv_to_rgba_packed() {
        // 2x1 image: one YUYV group
        let data = [50u8, 128, 200, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1, 0);
        assert_eq!(rgba, vec![50, 50, 50, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_yuyv_to_rgba_skips_stride_padding() {
        // 2x2 image, rows padded to 8 bytes
        let data = [
            10u8, 128, 20, 128, 0xEE, 0xEE, 0xEE, 0xEE, //
            30, 128, 40, 128, 0xEE, 0xEE, 0xEE, 0xEE,
        ];
        let rgba = yuyv_to_rgba(&data, 2, 2, 8);
        let reds: Vec<u8> = rgba.chunks_exact(4).map(|p| p[0]).collect();
        assert_eq!(reds, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_yuyv_short_buffer_leaves_black() {
        let data = [90u8, 128, 90, 128];
        let rgba = yuyv_to_rgba(&data, 2, 2, 0);
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[8..], &[0; 8]);
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgba = rgb_to_rgba(&[1, 2, 3, 4, 5, 6], 2, 1, 0);
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_rgb24_skips_stride_padding() {
        // 1x2 image, each 3-byte row padded to 4
        let data = [1, 2, 3, 0xEE, 4, 5, 6, 0xEE];
        let frame = CapturePixelFormat::Rgb24.to_frame(&data, 1, 2, 4).unwrap();
        assert_eq!(frame.as_bytes(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_zero_width_converts_to_empty() {
        assert!(yuyv_to_rgba(&[16, 128, 16, 128], 0, 2, 0).is_empty());
        assert!(rgb_to_rgba(&[1, 2, 3], 0, 2, 0).is_empty());
    }

    #[test]
    fn test_to_frame_rgb24() {
        let frame = CapturePixelFormat::Rgb24
            .to_frame(&[9, 8, 7], 1, 1, 0)
            .unwrap();
        assert_eq!(frame.as_bytes(), &[9, 8, 7, 255]);
    }

    #[test]
    fn test_mjpeg_garbage_is_invalid_frame() {
        let err = mjpeg_to_frame(&[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, VelvetError::InvalidFrame(_)));
    }
}

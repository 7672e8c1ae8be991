// SPDX-License-Identifier: GPL-3.0-only

//! Pixel frame codec
//!
//! A [`Frame`] is a plain interleaved RGBA byte buffer of `width * height * 4`
//! bytes. The codec turns the pixel at a given linear index into a [`Pixel`]
//! record and writes a (possibly modified) record back in place. It never keeps
//! any frame around between calls: it is only a view over caller storage.

use crate::constants::CHANNELS;
use crate::errors::{VelvetError, VelvetResult};

/// One RGBA pixel, created fresh for every pixel of every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    /// Linear position of the pixel within its frame (0-based)
    pub index: usize,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Pixel {
    pub fn new(index: usize, red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            index,
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Build a pixel from unbounded channel values, clamping each into 0..=255
    pub fn from_channels(index: usize, red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self::new(
            index,
            clamp_channel(red),
            clamp_channel(green),
            clamp_channel(blue),
            clamp_channel(alpha),
        )
    }

    /// Opaque gray pixel with all three color channels set to `luma`
    pub fn gray(index: usize, luma: u8) -> Self {
        Self::new(index, luma, luma, luma, u8::MAX)
    }

    /// Byte offset of this pixel in an interleaved buffer
    pub fn offset(&self) -> usize {
        self.index * CHANNELS
    }

    pub fn is_gray(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }
}

/// Truncate a channel value into the 8-bit range (NaN maps to 0)
pub fn clamp_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.floor().clamp(0.0, u8::MAX as f64) as u8
}

/// Read the pixel at `index` out of an interleaved buffer
///
/// Panics if the buffer does not contain that pixel, like slice indexing does.
#[inline]
pub fn decode_pixel(buffer: &[u8], index: usize) -> Pixel {
    let start = index * CHANNELS;
    let bytes = &buffer[start..start + CHANNELS];
    Pixel::new(index, bytes[0], bytes[1], bytes[2], bytes[3])
}

/// Write the four channels of `pixel` back at `4 * pixel.index`
#[inline]
pub fn encode(pixel: &Pixel, buffer: &mut [u8]) {
    let start = pixel.offset();
    buffer[start..start + CHANNELS].copy_from_slice(&[
        pixel.red,
        pixel.green,
        pixel.blue,
        pixel.alpha,
    ]);
}

/// Decode the first `pixel_count` pixels of a buffer, in increasing index order
///
/// The count is capped to the number of whole pixels the buffer holds, so a
/// count of zero (zero-area frame) yields nothing.
pub fn decode(buffer: &[u8], pixel_count: usize) -> Pixels<'_> {
    Pixels {
        buffer,
        next: 0,
        count: pixel_count.min(buffer.len() / CHANNELS),
    }
}

/// Iterator returned by [`decode`]
#[derive(Debug, Clone)]
pub struct Pixels<'a> {
    buffer: &'a [u8],
    next: usize,
    count: usize,
}

impl Iterator for Pixels<'_> {
    type Item = Pixel;

    fn next(&mut self) -> Option<Pixel> {
        if self.next >= self.count {
            return None;
        }
        let pixel = decode_pixel(self.buffer, self.next);
        self.next += 1;
        Some(pixel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pixels<'_> {}

/// A captured RGBA frame, owned by the pipeline invocation that produced it
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an interleaved RGBA buffer, checking it matches the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> VelvetResult<Self> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(VelvetError::InvalidFrame(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Fully transparent black frame
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// Frame filled with one color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(byte_len(width, height))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_rgba_image(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn into_rgba_image(self) -> VelvetResult<image::RgbaImage> {
        let (width, height) = (self.width, self.height);
        image::RgbaImage::from_raw(width, height, self.data).ok_or_else(|| {
            VelvetError::InvalidFrame(format!("{}x{} buffer rejected by encoder", width, height))
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels, `width * height`
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, index: usize) -> Option<Pixel> {
        (index < self.pixel_count()).then(|| decode_pixel(&self.data, index))
    }

    pub fn pixels(&self) -> Pixels<'_> {
        decode(&self.data, self.pixel_count())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame({}x{}, {} bytes)",
            self.width,
            self.height,
            self.data.len()
        )
    }
}

/// Buffer length of a `width x height` RGBA frame
pub fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reads_interleaved_channels() {
        let buffer = [1, 2, 3, 4, 5, 6, 7, 8];
        let pixels: Vec<Pixel> = decode(&buffer, 2).collect();
        assert_eq!(
            pixels,
            vec![Pixel::new(0, 1, 2, 3, 4), Pixel::new(1, 5, 6, 7, 8)]
        );
    }

    #[test]
    fn test_encode_writes_at_pixel_offset() {
        let mut buffer = [0u8; 12];
        encode(&Pixel::new(2, 9, 8, 7, 6), &mut buffer);
        assert_eq!(buffer, [0, 0, 0, 0, 0, 0, 0, 0, 9, 8, 7, 6]);
    }

    #[test]
    fn test_zero_pixel_count_is_noop() {
        let buffer = [10u8; 8];
        assert_eq!(decode(&buffer, 0).count(), 0);
        assert_eq!(decode(&[], 5).count(), 0);
    }

    #[test]
    fn test_decode_caps_count_to_buffer() {
        let buffer = [0u8; 10];
        assert_eq!(decode(&buffer, 100).len(), 2);
    }

    #[test]
    fn test_frame_rejects_wrong_length() {
        let err = Frame::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, VelvetError::InvalidFrame(_)));
        assert!(Frame::new(2, 2, vec![0; 16]).is_ok());
        assert!(Frame::new(0, 0, Vec::new()).is_ok());
    }

    #[test]
    fn test_filled_frame() {
        let frame = Frame::filled(3, 1, [255, 0, 0, 255]);
        assert_eq!(frame.pixel_count(), 3);
        assert!(frame.pixels().all(|p| p.red == 255 && p.green == 0));
        assert_eq!(frame.pixel(2).map(|p| p.index), Some(2));
        assert_eq!(frame.pixel(3), None);
    }

    #[test]
    fn test_clamp_channel() {
        assert_eq!(clamp_channel(-3.0), 0);
        assert_eq!(clamp_channel(12.9), 12);
        assert_eq!(clamp_channel(300.0), 255);
        assert_eq!(clamp_channel(f64::NAN), 0);
        let pixel = Pixel::from_channels(0, 256.0, -1.0, 17.5, 255.0);
        assert_eq!((pixel.red, pixel.green, pixel.blue), (255, 0, 17));
    }

    #[test]
    fn test_image_conversion_keeps_bytes() {
        let frame = Frame::filled(2, 3, [1, 2, 3, 4]);
        let image = frame.clone().into_rgba_image().unwrap();
        assert_eq!(image.dimensions(), (2, 3));
        assert_eq!(Frame::from_rgba_image(image), frame);
    }
}

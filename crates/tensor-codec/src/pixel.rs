// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Image values and the pixel layouts models declare for them.

use crate::CodecError;
use std::fmt;

/// Channel order a pixel-buffer layer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    Rgb,
    Bgr,
}

impl PixelFormat {
    /// Parses a format string, case-insensitively.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Some(PixelFormat::Rgb),
            "bgr" => Some(PixelFormat::Bgr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Rgb => "RGB",
            PixelFormat::Bgr => "BGR",
        }
    }

    /// Colour identities (`0` = R, `1` = G, `2` = B) in tensor write order.
    pub fn channel_order(self) -> [usize; 3] {
        match self {
            PixelFormat::Rgb => [0, 1, 2],
            PixelFormat::Bgr => [2, 1, 0],
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width, height and channel count of an image tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageVolume {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl ImageVolume {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Builds a volume from an `[height, width, channels]` shape, ignoring
    /// leading unit (batch) dimensions.
    pub fn from_shape(shape: &crate::Shape) -> Option<Self> {
        let squeezed = shape.squeezed_leading();
        match squeezed.dims() {
            [h, w, c] => Some(Self::new(*w, *h, *c)),
            _ => None,
        }
    }

    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn num_elements(&self) -> usize {
        self.num_pixels() * self.channels
    }
}

impl fmt::Display for ImageVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// A bitmap of packed `0xAARRGGBB` pixels stored in row-major order.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Image {
    /// Wraps a pixel vector; its length must be `width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self, CodecError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image where every pixel has the same colour.
    pub fn filled(width: usize, height: usize, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; width * height],
        }
    }

    /// A deterministic diagonal gradient, handy as a stand-in camera frame.
    pub fn gradient(width: usize, height: usize) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let b = ((x + y) * 255 / (width + height).max(1)) as u8;
                pixels.push(pack_rgb(r, g, b));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns the packed pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Splits a packed pixel into its red, green and blue bytes.
#[inline]
pub fn unpack_rgb(pixel: u32) -> [u8; 3] {
    [
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    ]
}

/// Packs red, green and blue bytes into an opaque `0xFFRRGGBB` pixel.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_pack_unpack() {
        let p = pack_rgb(0x12, 0x34, 0x56);
        assert_eq!(p, 0xFF12_3456);
        assert_eq!(unpack_rgb(p), [0x12, 0x34, 0x56]);
        // Alpha is ignored on the way out.
        assert_eq!(unpack_rgb(0x0012_3456), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_volume_from_shape() {
        let v = ImageVolume::from_shape(&Shape::new(vec![1, 224, 160, 3])).unwrap();
        assert_eq!(v, ImageVolume::new(160, 224, 3));
        assert_eq!(v.num_elements(), 224 * 160 * 3);
        assert!(ImageVolume::from_shape(&Shape::vector(10)).is_none());
    }

    #[test]
    fn test_image_new_checks_length() {
        assert!(Image::new(2, 2, vec![0; 4]).is_ok());
        let err = Image::new(2, 2, vec![0; 3]).unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_pixel_lookup() {
        let img = Image::new(2, 1, vec![1, 2]).unwrap();
        assert_eq!(img.pixel(1, 0), Some(2));
        assert_eq!(img.pixel(2, 0), None);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(PixelFormat::from_str_loose("rgb"), Some(PixelFormat::Rgb));
        assert_eq!(PixelFormat::from_str_loose("BGR"), Some(PixelFormat::Bgr));
        assert_eq!(PixelFormat::from_str_loose("rgba"), None);
        assert_eq!(PixelFormat::Bgr.channel_order(), [2, 1, 0]);
    }
}

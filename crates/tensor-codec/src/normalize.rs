// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pixel normalization: 8-bit colour channels ↔ floating point.
//!
//! Channel indices follow colour identity: `0` = red, `1` = green, anything
//! else = blue. Per-channel biases are selected the same way.

/// Converts an 8-bit pixel channel into the float a model expects.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PixelNormalizer {
    /// `v / 255`, mapping `[0, 255]` onto `[0, 1]`.
    ZeroToOne,
    /// `v * (2 / 255) - 1`, mapping `[0, 255]` onto `[-1, 1]`.
    NegativeOneToOne,
    /// `v * scale + bias` for every channel.
    SingleBias { scale: f32, bias: f32 },
    /// `v * scale + bias[channel]`.
    PerChannelBias { scale: f32, bias: [f32; 3] },
}

impl PixelNormalizer {
    #[inline]
    pub fn normalize(&self, value: u8, channel: usize) -> f32 {
        let v = value as f32;
        match *self {
            PixelNormalizer::ZeroToOne => v / 255.0,
            PixelNormalizer::NegativeOneToOne => v * (2.0 / 255.0) - 1.0,
            PixelNormalizer::SingleBias { scale, bias } => v * scale + bias,
            PixelNormalizer::PerChannelBias { scale, bias } => {
                v * scale + bias[channel_slot(channel)]
            }
        }
    }
}

/// Converts a model's float output back into an 8-bit pixel channel.
///
/// Results are truncated toward zero and saturate at the `u8` bounds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PixelDenormalizer {
    /// `v * 255`.
    ZeroToOne,
    /// `(v + 1) * (255 / 2)`.
    NegativeOneToOne,
    /// `(v + bias) * scale` for every channel.
    SingleBias { scale: f32, bias: f32 },
    /// `(v + bias[channel]) * scale`.
    PerChannelBias { scale: f32, bias: [f32; 3] },
}

impl PixelDenormalizer {
    #[inline]
    pub fn denormalize(&self, value: f32, channel: usize) -> u8 {
        let out = match *self {
            PixelDenormalizer::ZeroToOne => value * 255.0,
            PixelDenormalizer::NegativeOneToOne => (value + 1.0) * (255.0 / 2.0),
            PixelDenormalizer::SingleBias { scale, bias } => (value + bias) * scale,
            PixelDenormalizer::PerChannelBias { scale, bias } => {
                (value + bias[channel_slot(channel)]) * scale
            }
        };
        out as u8
    }
}

#[inline]
fn channel_slot(channel: usize) -> usize {
    match channel {
        0 => 0,
        1 => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 0.01;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= EPS
    }

    #[test]
    fn test_zero_to_one() {
        let n = PixelNormalizer::ZeroToOne;
        for c in 0..3 {
            assert!(close(n.normalize(0, c), 0.0));
            assert!(close(n.normalize(127, c), 0.5));
            assert!(close(n.normalize(255, c), 1.0));
        }
    }

    #[test]
    fn test_negative_one_to_one() {
        let n = PixelNormalizer::NegativeOneToOne;
        for c in 0..3 {
            assert!(close(n.normalize(0, c), -1.0));
            assert!(close(n.normalize(127, c), 0.0));
            assert!(close(n.normalize(255, c), 1.0));
        }
    }

    #[test]
    fn test_single_bias() {
        let n = PixelNormalizer::SingleBias {
            scale: 1.0 / 255.0,
            bias: 0.0,
        };
        assert!(close(n.normalize(127, 1), 0.5));
        assert!(close(n.normalize(255, 2), 1.0));
    }

    #[test]
    fn test_per_channel_bias_selects_by_channel() {
        let n = PixelNormalizer::PerChannelBias {
            scale: 1.0 / 255.0,
            bias: [0.1, 0.2, 0.3],
        };
        assert!(close(n.normalize(0, 0), 0.1));
        assert!(close(n.normalize(0, 1), 0.2));
        assert!(close(n.normalize(0, 2), 0.3));
        assert!(close(n.normalize(127, 0), 0.6));
        assert!(close(n.normalize(255, 2), 1.3));
        // Out-of-range channels fall through to blue.
        assert!(close(n.normalize(0, 7), 0.3));
    }

    #[test]
    fn test_denormalize_inverts_normalize() {
        let pairs = [
            (PixelNormalizer::ZeroToOne, PixelDenormalizer::ZeroToOne),
            (
                PixelNormalizer::NegativeOneToOne,
                PixelDenormalizer::NegativeOneToOne,
            ),
        ];
        for (n, d) in pairs {
            for v in 0..=255u8 {
                for c in 0..3 {
                    let back = d.denormalize(n.normalize(v, c), c);
                    assert!(
                        (back as i32 - v as i32).abs() <= 1,
                        "{n:?}: {v} came back as {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_denormalize_per_channel() {
        let d = PixelDenormalizer::PerChannelBias {
            scale: 255.0,
            bias: [-0.1, -0.2, -0.3],
        };
        assert_eq!(d.denormalize(0.1, 0), 0);
        assert_eq!(d.denormalize(1.25, 1), 255);
        assert!((d.denormalize(0.8, 2) as i32 - 127).abs() <= 1);
    }

    #[test]
    fn test_denormalize_saturates() {
        let d = PixelDenormalizer::ZeroToOne;
        assert_eq!(d.denormalize(2.0, 0), 255);
        assert_eq!(d.denormalize(-1.0, 0), 0);
    }
}

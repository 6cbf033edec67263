// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Vector quantization: floating point ↔ 8-bit elements.

/// Maps a float onto the `[0, 255]` byte range of a quantized tensor.
///
/// Results are truncated toward zero and saturate at the `u8` bounds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DataQuantizer {
    /// `v * 255`, the inverse of [`DataDequantizer::ZeroToOne`].
    ZeroToOne,
    /// `(v + 1) * (255 / 2)`, the inverse of [`DataDequantizer::NegativeOneToOne`].
    NegativeOneToOne,
    /// `v * scale + bias`.
    ScaleBias { scale: f32, bias: f32 },
}

impl DataQuantizer {
    #[inline]
    pub fn quantize(&self, value: f32) -> u8 {
        let out = match *self {
            DataQuantizer::ZeroToOne => value * 255.0,
            DataQuantizer::NegativeOneToOne => (value + 1.0) * (255.0 / 2.0),
            DataQuantizer::ScaleBias { scale, bias } => value * scale + bias,
        };
        out as u8
    }
}

/// Maps a quantized byte back onto the float range the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DataDequantizer {
    /// `v / 255`.
    ZeroToOne,
    /// `v * (2 / 255) - 1`.
    NegativeOneToOne,
    /// `v * scale + bias`.
    ScaleBias { scale: f32, bias: f32 },
}

impl DataDequantizer {
    #[inline]
    pub fn dequantize(&self, value: u8) -> f32 {
        let v = value as f32;
        match *self {
            DataDequantizer::ZeroToOne => v / 255.0,
            DataDequantizer::NegativeOneToOne => v * (2.0 / 255.0) - 1.0,
            DataDequantizer::ScaleBias { scale, bias } => v * scale + bias,
        }
    }
}

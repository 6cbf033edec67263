// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor element types as seen by the executor.

/// Element width of a marshaled tensor buffer.
///
/// Quantized layers travel as one byte per element, everything else as
/// 32-bit floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// Unsigned 8-bit integer (quantized tensors).
    U8,
    /// 32-bit IEEE 754 floating point.
    F32,
}

impl DType {
    /// Picks the element type for a layer's quantization flag.
    pub fn for_quantized(quantized: bool) -> Self {
        if quantized {
            DType::U8
        } else {
            DType::F32
        }
    }

    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::U8 => 1,
            DType::F32 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DType::U8 => "u8",
            DType::F32 => "f32",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Native-endian element packing for tensor buffers.
//!
//! Executors read float tensors in host byte order, so every helper here
//! uses `to_ne_bytes`/`from_ne_bytes`.

use crate::CodecError;

/// Writes `values` as consecutive `f32`s into `dst`.
///
/// `dst` must be exactly `values.len() * 4` bytes long.
pub fn write_f32s(values: &[f32], dst: &mut [u8]) -> Result<(), CodecError> {
    let expected = values.len() * 4;
    if dst.len() != expected {
        return Err(CodecError::BufferSizeMismatch {
            expected,
            actual: dst.len(),
        });
    }
    for (chunk, v) in dst.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&v.to_ne_bytes());
    }
    Ok(())
}

/// Reads every `f32` in `src`.
pub fn read_f32s(src: &[u8]) -> Result<Vec<f32>, CodecError> {
    if src.len() % 4 != 0 {
        return Err(CodecError::BufferSizeMismatch {
            expected: src.len() / 4 * 4,
            actual: src.len(),
        });
    }
    Ok(src
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Writes a single `f32` at element offset `index`.
#[inline]
pub fn put_f32(dst: &mut [u8], index: usize, value: f32) {
    let at = index * 4;
    dst[at..at + 4].copy_from_slice(&value.to_ne_bytes());
}

/// Reads the `f32` at element offset `index`.
#[inline]
pub fn get_f32(src: &[u8], index: usize) -> f32 {
    let at = index * 4;
    f32::from_ne_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]])
}

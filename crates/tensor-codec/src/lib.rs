// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-codec
//!
//! Numeric codecs that sit between application values and the raw byte
//! buffers an inference engine consumes.
//!
//! This crate provides:
//! - [`PixelNormalizer`] / [`PixelDenormalizer`]: 8-bit pixel channel ↔ float.
//! - [`DataQuantizer`] / [`DataDequantizer`]: float ↔ 8-bit vector element.
//! - [`Image`]: a packed `0xAARRGGBB` pixel grid, plus [`PixelFormat`] and
//!   [`ImageVolume`] describing what a model expects.
//! - [`Shape`] and [`DType`]: tensor geometry and element width.
//! - Native-endian `f32` packing helpers in [`bytes`].
//!
//! All codecs are plain `Copy` values with no state beyond their captured
//! scale and bias, so they can be shared freely across threads.

pub mod bytes;
mod dtype;
mod error;
mod normalize;
mod pixel;
mod quantize;
mod shape;

pub use dtype::DType;
pub use error::CodecError;
pub use normalize::{PixelDenormalizer, PixelNormalizer};
pub use pixel::{pack_rgb, unpack_rgb, Image, ImageVolume, PixelFormat};
pub use quantize::{DataDequantizer, DataQuantizer};
pub use shape::{DeclaredShapeError, Shape};

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for codec and marshaling operations.

/// Errors raised while converting application values to or from tensor
/// byte buffers.
///
/// Every variant describes a caller-supplied value that does not fit the
/// layer it was given to. They are checked before any byte is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// A flat value has the wrong number of elements for its layer.
    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// An image does not match the declared layer volume.
    #[error("image size mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    ImageSizeMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    /// The value is of the wrong kind for the layer (e.g. a vector where an
    /// image is required).
    #[error("wrong value kind: expected {expected}, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },

    /// A byte buffer is too short or too long for the layer it is read as.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Pixel layers carry exactly three colour channels.
    #[error("unsupported channel count {0}; pixel layers require 3")]
    UnsupportedChannels(usize),
}

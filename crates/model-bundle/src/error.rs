// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for bundle parsing and discovery.

use std::path::PathBuf;

/// Errors that make a single model bundle unusable.
///
/// A `BundleError` is terminal for the bundle that raised it only; bundle
/// discovery logs it and moves on to the next candidate.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// A bundle resource (manifest, label file) could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest JSON is malformed or missing a required key.
    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// A required manifest field is present but empty.
    #[error("manifest field '{0}' is missing or empty")]
    MissingField(&'static str),

    /// A layer definition cannot be turned into a layer description.
    #[error("invalid layer '{layer}': {detail}")]
    InvalidLayer { layer: String, detail: String },

    /// A labeled vector layer has the wrong number of labels.
    #[error("layer '{layer}' has {expected} elements but {actual} labels")]
    LabelMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    /// The path is not a bundle directory.
    #[error("not a model bundle: {}", .0.display())]
    NotABundle(PathBuf),

    /// The manifest names a model file that does not exist.
    #[error("model file not found: {}", .0.display())]
    ModelFileMissing(PathBuf),

    /// Another bundle with the same id is already registered.
    #[error("duplicate bundle id '{0}'")]
    DuplicateId(String),
}

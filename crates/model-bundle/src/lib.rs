// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-bundle
//!
//! Self-describing model bundles: a model file plus a JSON manifest that
//! declares every input and output tensor.
//!
//! - [`BundleManifest`]: the raw `model.json` document.
//! - [`LayerDescription`]: a tensor's shape, quantization and codec, as a
//!   closed sum of pixel-buffer and vector variants.
//! - [`LayerInterface`]: a named, directed layer.
//! - [`ModelBundle`]: ordered and name-indexed layer interfaces plus
//!   metadata.
//! - [`BundleManager`]: discovers bundles in a directory.
//!
//! # Bundle Layout
//! ```text
//! mobilenet.tfbundle/
//!   model.json
//!   model.tflite
//!   labels.txt
//! ```
//!
//! # Example
//! ```no_run
//! use model_bundle::BundleManager;
//! use std::path::Path;
//!
//! let manager = BundleManager::load(Path::new("./bundles")).unwrap();
//! for bundle in manager.iter() {
//!     println!("{}", bundle.summary());
//!     for layer in bundle.inputs().iter().chain(bundle.outputs()) {
//!         println!("  {}", layer.summary());
//!     }
//! }
//! ```

mod bundle;
mod error;
mod layer;
mod manager;
pub mod manifest;
mod validator;
mod value;

pub use bundle::{ModelBundle, ModelOptions};
pub use error::BundleError;
pub use layer::{
    LayerDescription, LayerInterface, LayerRole, PixelBufferDescription, VectorDescription,
};
pub use manager::BundleManager;
pub use manifest::{BundleManifest, MANIFEST_FILE};
pub use validator::{is_bundle_dir, BundleValidator, BUNDLE_EXTENSIONS};
pub use value::{LayerValue, NamedValues};

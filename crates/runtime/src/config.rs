// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! bundles_dir = "./bundles"
//! default_bundle = "mobilenet-v2-100-224-unquantized"
//!
//! [executor]
//! device = "gpu"
//! num_threads = 4
//! use_fp16 = true
//!
//! [streaming]
//! max_frames = 100
//! top_n = 5
//! smoothing = true
//! ```

use crate::{Device, RuntimeError};
use std::path::{Path, PathBuf};

/// Settings the executor is built with.
///
/// Two configs compare equal exactly when rebuilding the executor would be
/// a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutorConfig {
    /// Requested backend; accelerators fall back to the CPU when unavailable.
    #[serde(default)]
    pub device: Device,
    /// Worker threads for the executor (defaults to available parallelism).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
    /// Allow 16-bit float precision where the backend supports it.
    #[serde(default)]
    pub use_fp16: bool,
}

impl ExecutorConfig {
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    pub fn with_fp16(mut self, use_fp16: bool) -> Self {
        self.use_fp16 = use_fp16;
        self
    }

    /// Resolves the number of executor threads.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "device={} threads={} fp16={}",
            self.device,
            self.resolve_threads(),
            self.use_fp16
        )
    }
}

/// How the streaming front end consumes results.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamingConfig {
    /// Stop after this many frames (`None` streams until stopped).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<usize>,
    /// Number of classification entries to report per frame.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Smooth classifications across frames.
    #[serde(default = "default_true")]
    pub smoothing: bool,
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_frames: None,
            top_n: default_top_n(),
            smoothing: true,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Directory scanned for `.tfbundle` / `.tiobundle` directories.
    pub bundles_dir: PathBuf,
    /// Bundle id selected when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bundle: Option<String>,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bundles_dir: PathBuf::from("./bundles"),
            default_bundle: None,
            executor: ExecutorConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

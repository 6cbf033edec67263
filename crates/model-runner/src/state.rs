// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runner lifecycle state and the per-model cache derived from a bundle.

use model_bundle::ModelBundle;
use runtime::Device;
use std::fmt;
use std::sync::Arc;
use tensor_codec::ImageVolume;

/// Lifecycle of a [`crate::ModelRunner`].
///
/// ```text
/// Idle ──switch──▶ Ready ◀──stop── Streaming
///                    │ ──start──▶     │
///                    └──▶ Switching ◀─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerState {
    /// No model is loaded.
    Idle,
    /// A model is loaded and nothing is streaming.
    Ready,
    /// The capture loop is active.
    Streaming,
    /// A model or configuration change is in progress.
    Switching,
}

impl RunnerState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunnerState::Idle => "idle",
            RunnerState::Ready => "ready",
            RunnerState::Streaming => "streaming",
            RunnerState::Switching => "switching",
        }
    }

    pub fn has_model(self) -> bool {
        !matches!(self, RunnerState::Idle)
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values derived from the active bundle, refreshed on every model switch.
///
/// Data sources read it to size their frames.
#[derive(Debug, Clone)]
pub struct ModelCache {
    bundle: Arc<ModelBundle>,
    labels: Option<Vec<String>>,
    input_volume: Option<ImageVolume>,
}

impl ModelCache {
    pub fn from_bundle(bundle: Arc<ModelBundle>) -> Self {
        let labels = bundle.labels().map(<[String]>::to_vec);
        let input_volume = bundle.input_volume();
        Self {
            bundle,
            labels,
            input_volume,
        }
    }

    pub fn bundle(&self) -> &Arc<ModelBundle> {
        &self.bundle
    }

    pub fn bundle_id(&self) -> &str {
        self.bundle.id()
    }

    /// Labels of the first labeled output.
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Dimensions of the first image input.
    pub fn input_volume(&self) -> Option<ImageVolume> {
        self.input_volume
    }
}

/// A snapshot of the runner, taken on the worker.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RunnerStatus {
    pub state: RunnerState,
    pub bundle_id: Option<String>,
    /// Device requested in the configuration.
    pub requested_device: Device,
    /// Device the executor actually runs on.
    pub active_device: Device,
    /// Present when the requested device was replaced by the CPU.
    pub fallback: Option<String>,
    pub num_threads: Option<usize>,
    pub use_fp16: bool,
    pub label_count: usize,
    pub input_volume: Option<ImageVolume>,
    /// Frames completed since the current stream started.
    pub frames_streamed: u64,
}

impl RunnerStatus {
    pub fn summary(&self) -> String {
        let threads = self
            .num_threads
            .map_or_else(|| "auto".to_string(), |n| n.to_string());
        let volume = self
            .input_volume
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        format!(
            "Runner: {} | model {} | device {} (requested {}) | threads {} | fp16 {} | \
             {} labels | input {} | {} frames",
            self.state,
            self.bundle_id.as_deref().unwrap_or("-"),
            self.active_device,
            self.requested_device,
            threads,
            self.use_fp16,
            self.label_count,
            volume,
            self.frames_streamed,
        )
    }
}

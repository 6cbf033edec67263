// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the model runner.

use runtime::RuntimeError;

/// Errors surfaced by [`crate::ModelRunner`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The adapter rejected the request or failed to (re)load.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The operation needs a loaded model and the runner is idle.
    #[error("no model loaded")]
    NoModel,

    /// The command queue or a reply channel closed unexpectedly.
    #[error("runner channel error: {0}")]
    Channel(String),

    /// The worker thread could not be started.
    #[error("runner worker spawn error: {0}")]
    Spawn(String),

    /// The worker thread panicked.
    #[error("runner worker join error: {0}")]
    Join(String),

    /// A data source failed to produce a frame.
    #[error("data source error: {0}")]
    Source(String),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

impl RunnerError {
    /// Whether this error reports a bad caller-supplied value.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, RunnerError::Runtime(e) if e.is_invalid_argument())
    }
}

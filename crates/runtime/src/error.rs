// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the tensor runtime adapter.

/// Errors that can occur while loading a model or running inference.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Executor construction, model loading or unloading failed.
    #[error("model error: {0}")]
    ModelError(String),

    /// A caller-supplied value has the wrong shape, length or kind.
    ///
    /// Always raised before the executor is invoked.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested accelerator is not available; the adapter fell back to
    /// the CPU.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The executor failed while running an inference.
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// The bundle could not be read or parsed.
    #[error("bundle error: {0}")]
    BundleError(#[from] model_bundle::BundleError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl RuntimeError {
    /// Wraps a codec failure for `layer` as an invalid argument.
    pub fn invalid_value(layer: &str, source: tensor_codec::CodecError) -> Self {
        RuntimeError::InvalidArgument(format!("layer '{layer}': {source}"))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, RuntimeError::InvalidArgument(_))
    }
}

impl From<tensor_codec::CodecError> for RuntimeError {
    fn from(e: tensor_codec::CodecError) -> Self {
        RuntimeError::InvalidArgument(e.to_string())
    }
}

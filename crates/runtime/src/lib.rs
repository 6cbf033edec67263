// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Binds a [`model_bundle::ModelBundle`] to an opaque tensor executor.
//!
//! The runtime takes:
//! - A parsed `ModelBundle` from `model-bundle`.
//! - An [`ExecutorFactory`] that knows how to build the native engine.
//! - An [`ExecutorConfig`] (device, threads, precision).
//!
//! And runs inference by marshaling named values into per-tensor byte
//! buffers, invoking the executor, and demarshaling its outputs.
//!
//! # Device fallback
//! Requesting an accelerator the factory cannot target is not an error:
//! the adapter runs on the CPU and records the reason as
//! [`RuntimeError::UnsupportedConfiguration`].

mod adapter;
mod buffers;
mod config;
mod device;
mod error;
mod executor;
mod metrics;
mod model_file;

pub use adapter::TensorRuntimeAdapter;
pub use buffers::{BufferStats, LayerBuffers};
pub use config::{ExecutorConfig, RuntimeConfig, StreamingConfig};
pub use device::Device;
pub use error::RuntimeError;
pub use executor::{ExecutorFactory, SyntheticExecutor, SyntheticExecutorFactory, TensorExecutor};
pub use metrics::InferenceMetrics;
pub use model_file::ModelFile;

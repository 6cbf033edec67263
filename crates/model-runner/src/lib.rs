// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-runner
//!
//! The single point of concurrency control over a live model.
//!
//! A [`ModelRunner`] owns one [`runtime::TensorRuntimeAdapter`] on a
//! dedicated worker thread and serializes everything that touches it:
//! single-shot requests, the streaming capture loop, and reconfiguration
//! (device, threads, precision, model switch).
//!
//! # Example
//! ```no_run
//! use model_runner::{ModelRunner, SyntheticSource};
//! use runtime::{ExecutorConfig, SyntheticExecutorFactory};
//! use std::sync::Arc;
//!
//! # async fn example(bundle: Arc<model_bundle::ModelBundle>) -> Result<(), model_runner::RunnerError> {
//! let runner = ModelRunner::new(Arc::new(SyntheticExecutorFactory), ExecutorConfig::default())?;
//! runner.load(bundle).await?;
//! let mut results = runner.start_streaming(SyntheticSource::with_limit(10)).await?;
//! while let Some(frame) = results.recv().await {
//!     println!("frame {} in {:.2}ms", frame.request_id, frame.latency_ms);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classification;
mod error;
mod runner;
mod source;
mod state;
mod stream;

pub use error::{RunnerError, RunnerResult};
pub use runner::ModelRunner;
pub use source::{DataSource, SyntheticSource};
pub use state::{ModelCache, RunnerState, RunnerStatus};
pub use stream::{FrameResult, ResultStream};

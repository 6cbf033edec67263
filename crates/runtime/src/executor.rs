// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The executor seam: the opaque engine that turns input buffers into
//! output buffers.

use crate::{Device, ExecutorConfig, ModelFile, RuntimeError};
use model_bundle::ModelBundle;

/// A live inference engine bound to one model.
///
/// Buffers are keyed by tensor index: `inputs[i]` holds the marshaled bytes
/// for the bundle's input `i`, and `outputs[j]` is pre-sized for output `j`.
/// Implementations are driven from a single thread and need not be `Sync`.
pub trait TensorExecutor: Send {
    fn run(&mut self, inputs: &[Vec<u8>], outputs: &mut [Vec<u8>]) -> Result<(), RuntimeError>;

    /// Releases the executor and any accelerator delegate it holds.
    fn close(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Builds executors for a model file and configuration.
pub trait ExecutorFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this factory can target `device` on the current hardware.
    fn supports(&self, device: Device) -> bool;

    fn create(
        &self,
        model: &ModelFile,
        bundle: &ModelBundle,
        config: &ExecutorConfig,
    ) -> Result<Box<dyn TensorExecutor>, RuntimeError>;
}

/// Factory for executors that perform no computation and zero every output.
///
/// Placeholder bundles always run through it; it is also useful for driving
/// the marshaling pipeline without a native engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticExecutorFactory;

impl ExecutorFactory for SyntheticExecutorFactory {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn supports(&self, device: Device) -> bool {
        device == Device::Cpu
    }

    fn create(
        &self,
        _model: &ModelFile,
        bundle: &ModelBundle,
        config: &ExecutorConfig,
    ) -> Result<Box<dyn TensorExecutor>, RuntimeError> {
        tracing::debug!(
            "synthetic executor for '{}' ({})",
            bundle.id(),
            config.summary()
        );
        Ok(Box::new(SyntheticExecutor))
    }
}

/// Zero-filling executor built by [`SyntheticExecutorFactory`].
#[derive(Debug)]
pub struct SyntheticExecutor;

impl TensorExecutor for SyntheticExecutor {
    fn run(&mut self, _inputs: &[Vec<u8>], outputs: &mut [Vec<u8>]) -> Result<(), RuntimeError> {
        for out in outputs.iter_mut() {
            out.fill(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_zeroes_outputs() {
        let mut exec = SyntheticExecutor;
        let mut outputs = vec![vec![7u8; 4], vec![1u8; 2]];
        exec.run(&[vec![1, 2, 3]], &mut outputs).unwrap();
        assert!(outputs.iter().all(|o| o.iter().all(|&b| b == 0)));
        assert_eq!(outputs[0].len(), 4);
    }

    #[test]
    fn test_synthetic_supports_cpu_only() {
        let f = SyntheticExecutorFactory;
        assert!(f.supports(Device::Cpu));
        assert!(!f.supports(Device::Gpu));
        assert!(!f.supports(Device::Nnapi));
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The tensor runtime adapter: one live executor bound to one bundle.
//!
//! ```text
//! NamedValues ──marshal──▶ input buffers ──executor──▶ output buffers
//!                                                          │
//! NamedValues ◀─────────────────demarshal──────────────────┘
//! ```
//!
//! Every input is checked against its layer before any byte is written, so
//! a bad value never reaches the executor. Buffers live in a
//! [`LayerBuffers`] and are reused across runs.

use crate::{
    BufferStats, Device, ExecutorConfig, ExecutorFactory, InferenceMetrics, LayerBuffers,
    ModelFile, RuntimeError, SyntheticExecutorFactory, TensorExecutor,
};
use model_bundle::{LayerValue, ModelBundle, NamedValues};
use std::sync::Arc;
use std::time::Instant;

/// Owns the executor for one [`ModelBundle`] and its configuration.
///
/// Not thread-safe: the model runner drives it from a single worker.
pub struct TensorRuntimeAdapter {
    bundle: Arc<ModelBundle>,
    factory: Arc<dyn ExecutorFactory>,
    config: ExecutorConfig,
    active_device: Device,
    fallback: Option<RuntimeError>,
    model: Option<ModelFile>,
    executor: Option<Box<dyn TensorExecutor>>,
    buffers: LayerBuffers,
    last_metrics: Option<InferenceMetrics>,
}

impl TensorRuntimeAdapter {
    /// Creates an unloaded adapter. Call [`Self::load`] before running.
    pub fn new(
        bundle: Arc<ModelBundle>,
        factory: Arc<dyn ExecutorFactory>,
        config: ExecutorConfig,
    ) -> Self {
        let buffers = LayerBuffers::new(bundle.inputs().len(), bundle.outputs().len());
        Self {
            bundle,
            factory,
            config,
            active_device: Device::Cpu,
            fallback: None,
            model: None,
            executor: None,
            buffers,
            last_metrics: None,
        }
    }

    /// Opens the model resource and builds the executor.
    ///
    /// Placeholder bundles always get a synthetic executor. An accelerator
    /// the factory cannot target is replaced by the CPU; the reason is kept
    /// in [`Self::fallback_reason`].
    pub fn load(&mut self) -> Result<(), RuntimeError> {
        if self.is_loaded() {
            return Ok(());
        }

        let model = if self.bundle.is_placeholder() {
            ModelFile::placeholder()
        } else {
            let path = self.bundle.model_path().ok_or_else(|| {
                RuntimeError::ModelError(format!(
                    "bundle '{}' declares no model file",
                    self.bundle.id()
                ))
            })?;
            ModelFile::open(&path)?
        };

        let executor = self.build_executor(&model)?;
        self.model = Some(model);
        self.executor = Some(executor);
        tracing::info!(
            "loaded '{}' on {} ({})",
            self.bundle.id(),
            self.active_device,
            self.config.summary()
        );
        Ok(())
    }

    /// Releases the executor, its delegate and the model mapping.
    ///
    /// Calling it on an unloaded adapter does nothing.
    pub fn unload(&mut self) -> Result<(), RuntimeError> {
        let executor = self.executor.take();
        self.model = None;
        self.buffers.release();
        if let Some(mut executor) = executor {
            executor.close()?;
            tracing::info!("unloaded '{}'", self.bundle.id());
        }
        Ok(())
    }

    /// Tears down the executor and builds a new one with the current
    /// configuration. Loads the model if it is not loaded yet.
    pub fn recreate_executor(&mut self) -> Result<(), RuntimeError> {
        let Some(model) = self.model.take() else {
            return self.load();
        };
        if let Some(mut old) = self.executor.take() {
            if let Err(e) = old.close() {
                tracing::warn!("closing executor for '{}': {e}", self.bundle.id());
            }
        }
        let built = self.build_executor(&model);
        self.model = Some(model);
        self.executor = Some(built?);
        tracing::info!(
            "rebuilt executor for '{}' ({})",
            self.bundle.id(),
            self.config.summary()
        );
        Ok(())
    }

    /// Replaces the configuration, rebuilding the executor only if it
    /// changed. Returns whether a rebuild happened.
    pub fn apply_config(&mut self, config: ExecutorConfig) -> Result<bool, RuntimeError> {
        if config == self.config {
            return Ok(false);
        }
        self.config = config;
        if self.is_loaded() {
            self.recreate_executor()?;
        }
        Ok(true)
    }

    pub fn set_device(&mut self, device: Device) -> Result<bool, RuntimeError> {
        self.apply_config(self.config.clone().with_device(device))
    }

    pub fn set_num_threads(&mut self, threads: usize) -> Result<bool, RuntimeError> {
        self.apply_config(self.config.clone().with_threads(threads))
    }

    pub fn set_use_fp16(&mut self, use_fp16: bool) -> Result<bool, RuntimeError> {
        self.apply_config(self.config.clone().with_fp16(use_fp16))
    }

    /// Whether this adapter's factory can target `device`.
    pub fn can_run_on(&self, device: Device) -> bool {
        self.factory_for_bundle().supports(device)
    }

    /// Runs one inference over named inputs.
    ///
    /// Every declared input must be present and no undeclared name may be
    /// supplied. The result holds one entry per declared output.
    pub fn run(&mut self, inputs: &NamedValues) -> Result<NamedValues, RuntimeError> {
        let run_start = Instant::now();
        if self.executor.is_none() {
            return Err(RuntimeError::ModelError(format!(
                "model '{}' is not loaded",
                self.bundle.id()
            )));
        }

        self.check_inputs(inputs)?;

        // Marshal.
        let phase = Instant::now();
        let mut input_bytes = 0;
        for (i, layer) in self.bundle.inputs().iter().enumerate() {
            let desc = layer.description();
            let value = inputs.get(layer.name()).ok_or_else(|| {
                RuntimeError::InvalidArgument(format!("missing input '{}'", layer.name()))
            })?;
            let buf = self.buffers.input(i, desc.byte_len());
            desc.marshal(value, buf)
                .map_err(|e| RuntimeError::invalid_value(layer.name(), e))?;
            input_bytes += buf.len();
        }
        for (j, layer) in self.bundle.outputs().iter().enumerate() {
            self.buffers.output(j, layer.description().byte_len());
        }
        let marshal_duration = phase.elapsed();

        // Execute.
        let phase = Instant::now();
        let executor = self
            .executor
            .as_mut()
            .ok_or_else(|| RuntimeError::ModelError("executor released".into()))?;
        let (in_bufs, out_bufs) = self.buffers.split();
        executor.run(in_bufs, out_bufs)?;
        let execute_duration = phase.elapsed();

        // Demarshal.
        let phase = Instant::now();
        let mut outputs = NamedValues::with_capacity(self.bundle.outputs().len());
        let mut output_bytes = 0;
        for (j, layer) in self.bundle.outputs().iter().enumerate() {
            let bytes = self.buffers.output_bytes(j);
            output_bytes += bytes.len();
            let value = layer.description().demarshal(bytes).map_err(|e| {
                RuntimeError::ExecutionError(format!("output '{}': {e}", layer.name()))
            })?;
            outputs.insert(layer.name().to_string(), value);
        }
        let demarshal_duration = phase.elapsed();

        let metrics = InferenceMetrics {
            marshal_duration,
            execute_duration,
            demarshal_duration,
            total_duration: run_start.elapsed(),
            input_bytes,
            output_bytes,
        };
        tracing::debug!("'{}': {}", self.bundle.id(), metrics.summary());
        self.last_metrics = Some(metrics);
        Ok(outputs)
    }

    /// Runs a single-input, single-output bundle on a bare value.
    pub fn run_single(&mut self, value: LayerValue) -> Result<LayerValue, RuntimeError> {
        if !self.bundle.is_single_io() {
            return Err(RuntimeError::InvalidArgument(format!(
                "bundle '{}' has {} inputs and {} outputs; use named inputs",
                self.bundle.id(),
                self.bundle.inputs().len(),
                self.bundle.outputs().len()
            )));
        }
        let (input_name, output_name) = match (self.bundle.input(0), self.bundle.output(0)) {
            (Some(i), Some(o)) => (i.name().to_string(), o.name().to_string()),
            _ => return Err(RuntimeError::InvalidArgument("bundle has no layers".into())),
        };

        let mut inputs = NamedValues::with_capacity(1);
        inputs.insert(input_name, value);
        let mut outputs = self.run(&inputs)?;
        outputs.remove(&output_name).ok_or_else(|| {
            RuntimeError::ExecutionError(format!("output '{output_name}' missing"))
        })
    }

    pub fn bundle(&self) -> &Arc<ModelBundle> {
        &self.bundle
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.executor.is_some()
    }

    /// The device the executor actually runs on.
    pub fn active_device(&self) -> Device {
        self.active_device
    }

    /// Why the requested device was replaced by the CPU, if it was.
    pub fn fallback_reason(&self) -> Option<&RuntimeError> {
        self.fallback.as_ref()
    }

    pub fn buffer_stats(&self) -> &BufferStats {
        self.buffers.stats()
    }

    pub fn last_metrics(&self) -> Option<&InferenceMetrics> {
        self.last_metrics.as_ref()
    }

    // ── Internals ──────────────────────────────────────────────

    fn factory_for_bundle(&self) -> &dyn ExecutorFactory {
        if self.bundle.is_placeholder() {
            &SyntheticExecutorFactory
        } else {
            self.factory.as_ref()
        }
    }

    fn build_executor(&mut self, model: &ModelFile) -> Result<Box<dyn TensorExecutor>, RuntimeError> {
        let requested = self.config.device;
        let (device, fallback) = {
            let factory = self.factory_for_bundle();
            if factory.supports(requested) {
                (requested, None)
            } else if factory.supports(Device::Cpu) {
                let reason = RuntimeError::UnsupportedConfiguration(format!(
                    "{requested} is not available to the '{}' executor",
                    factory.name()
                ));
                tracing::warn!("{reason}; falling back to cpu");
                (Device::Cpu, Some(reason))
            } else {
                return Err(RuntimeError::ModelError(format!(
                    "executor '{}' supports neither {requested} nor cpu",
                    factory.name()
                )));
            }
        };

        let effective = self.config.clone().with_device(device);
        let executor = self
            .factory_for_bundle()
            .create(model, &self.bundle, &effective)?;
        self.active_device = device;
        self.fallback = fallback;
        Ok(executor)
    }

    /// Rejects unknown names, missing inputs and mismatched values.
    fn check_inputs(&self, inputs: &NamedValues) -> Result<(), RuntimeError> {
        if let Some(unknown) = inputs
            .keys()
            .find(|name| self.bundle.input_position(name).is_none())
        {
            return Err(RuntimeError::InvalidArgument(format!(
                "unknown input '{unknown}' for bundle '{}'",
                self.bundle.id()
            )));
        }
        for layer in self.bundle.inputs() {
            let value = inputs.get(layer.name()).ok_or_else(|| {
                RuntimeError::InvalidArgument(format!("missing input '{}'", layer.name()))
            })?;
            layer
                .description()
                .check_value(value)
                .map_err(|e| RuntimeError::invalid_value(layer.name(), e))?;
        }
        Ok(())
    }
}

impl Drop for TensorRuntimeAdapter {
    fn drop(&mut self) {
        if let Err(e) = self.unload() {
            tracing::warn!("unloading '{}' on drop: {e}", self.bundle.id());
        }
    }
}

impl std::fmt::Debug for TensorRuntimeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorRuntimeAdapter")
            .field("bundle", &self.bundle.id())
            .field("factory", &self.factory.name())
            .field("config", &self.config)
            .field("active_device", &self.active_device)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

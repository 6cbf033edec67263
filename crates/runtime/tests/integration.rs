// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: bundle on disk → adapter → executor → values.
//!
//! The executors here compute simple arithmetic on the f32 buffers they
//! receive, which proves that marshaling, tensor indexing and demarshaling
//! compose correctly end to end.

use model_bundle::{LayerValue, ModelBundle, NamedValues};
use runtime::{
    Device, ExecutorConfig, ExecutorFactory, ModelFile, RuntimeError, TensorExecutor,
    TensorRuntimeAdapter,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tensor_codec::bytes;

// ── Helpers ────────────────────────────────────────────────────

type Compute = dyn Fn(&[Vec<f32>]) -> Vec<Vec<f32>> + Send + Sync;

/// Factory for executors that apply `compute` to the decoded inputs.
struct MathFactory {
    compute: Arc<Compute>,
    devices: Vec<Device>,
    runs: Arc<AtomicUsize>,
    builds: Arc<AtomicUsize>,
}

impl MathFactory {
    fn new(compute: impl Fn(&[Vec<f32>]) -> Vec<Vec<f32>> + Send + Sync + 'static) -> Self {
        Self {
            compute: Arc::new(compute),
            devices: vec![Device::Cpu],
            runs: Arc::new(AtomicUsize::new(0)),
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_devices(mut self, devices: &[Device]) -> Self {
        self.devices = devices.to_vec();
        self
    }
}

struct MathExecutor {
    compute: Arc<Compute>,
    runs: Arc<AtomicUsize>,
}

impl ExecutorFactory for MathFactory {
    fn name(&self) -> &str {
        "math"
    }

    fn supports(&self, device: Device) -> bool {
        self.devices.contains(&device)
    }

    fn create(
        &self,
        _model: &ModelFile,
        _bundle: &ModelBundle,
        _config: &ExecutorConfig,
    ) -> Result<Box<dyn TensorExecutor>, RuntimeError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MathExecutor {
            compute: Arc::clone(&self.compute),
            runs: Arc::clone(&self.runs),
        }))
    }
}

impl TensorExecutor for MathExecutor {
    fn run(&mut self, inputs: &[Vec<u8>], outputs: &mut [Vec<u8>]) -> Result<(), RuntimeError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let decoded = inputs
            .iter()
            .map(|b| bytes::read_f32s(b))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RuntimeError::ExecutionError(e.to_string()))?;
        for (out, values) in outputs.iter_mut().zip((self.compute)(&decoded)) {
            bytes::write_f32s(&values, out)
                .map_err(|e| RuntimeError::ExecutionError(e.to_string()))?;
        }
        Ok(())
    }
}

/// Writes `model.json` and a non-empty `model.bin` into a bundle directory.
fn write_bundle(root: &Path, name: &str, manifest: &str) -> PathBuf {
    let dir = root.join(format!("{name}.tfbundle"));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("model.json"), manifest).unwrap();
    std::fs::write(dir.join("model.bin"), [0u8; 16]).unwrap();
    dir
}

const ONE_IN_ONE_OUT: &str = r#"{
    "id": "1_in_1_out",
    "name": "1 in 1 out",
    "model": { "file": "model.bin", "quantized": false },
    "inputs": [ { "name": "input_x", "type": "array", "shape": [1] } ],
    "outputs": [ { "name": "output_z", "type": "array", "shape": [1] } ]
}"#;

const TWO_IN_TWO_OUT: &str = r#"{
    "id": "2_in_2_out",
    "name": "2 in 2 out",
    "model": { "file": "model.bin", "quantized": false },
    "inputs": [
        { "name": "input_x", "type": "array", "shape": [4] },
        { "name": "input_y", "type": "array", "shape": [4] }
    ],
    "outputs": [
        { "name": "output_s", "type": "array", "shape": [1] },
        { "name": "output_z", "type": "array", "shape": [1] }
    ]
}"#;

fn scale_factory() -> MathFactory {
    MathFactory::new(|ins| vec![ins[0].iter().map(|v| v * 12.5).collect()])
}

/// `output_s = 6.4 * Σx`, `output_z = 2.4 * Σy`.
fn sum_factory() -> MathFactory {
    MathFactory::new(|ins| {
        let sx: f32 = ins[0].iter().sum();
        let sy: f32 = ins[1].iter().sum();
        vec![vec![sx * 6.4], vec![sy * 2.4]]
    })
}

fn adapter(dir: &Path, factory: MathFactory, config: ExecutorConfig) -> TensorRuntimeAdapter {
    let bundle = Arc::new(ModelBundle::load(dir).unwrap());
    let mut a = TensorRuntimeAdapter::new(bundle, Arc::new(factory), config);
    a.load().unwrap();
    a
}

fn named(pairs: &[(&str, Vec<f32>)]) -> NamedValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), LayerValue::Vector(v.clone())))
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────

#[test]
fn test_single_io_bare_value() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    let mut a = adapter(&dir, scale_factory(), ExecutorConfig::default());

    let out = a.run_single(LayerValue::Vector(vec![2.0])).unwrap();
    let z = out.as_vector().unwrap();
    assert!((z[0] - 25.0).abs() < 0.01);
}

#[test]
fn test_single_io_named_map() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    let mut a = adapter(&dir, scale_factory(), ExecutorConfig::default());

    let out = a.run(&named(&[("input_x", vec![2.0])])).unwrap();
    let z = out["output_z"].as_vector().unwrap();
    assert!((z[0] - 25.0).abs() < 0.01);
}

#[test]
fn test_two_inputs_two_outputs() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "sum", TWO_IN_TWO_OUT);
    let mut a = adapter(&dir, sum_factory(), ExecutorConfig::default());

    let out = a
        .run(&named(&[
            ("input_x", vec![1.0, 2.0, 3.0, 4.0]),
            ("input_y", vec![10.0, 20.0, 30.0, 40.0]),
        ]))
        .unwrap();

    assert_eq!(out.len(), 2);
    let s = out["output_s"].as_vector().unwrap();
    let z = out["output_z"].as_vector().unwrap();
    assert_eq!(s.len(), 1);
    assert_eq!(z.len(), 1);
    assert!((s[0] - 64.0).abs() < 0.01);
    assert!((z[0] - 240.0).abs() < 0.01);
}

#[test]
fn test_shape_mismatch_never_reaches_executor() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "sum", TWO_IN_TWO_OUT);
    let factory = sum_factory();
    let runs = Arc::clone(&factory.runs);
    let mut a = adapter(&dir, factory, ExecutorConfig::default());

    // Second input is one element short; the first is valid.
    let err = a
        .run(&named(&[
            ("input_x", vec![1.0, 2.0, 3.0, 4.0]),
            ("input_y", vec![10.0, 20.0, 30.0]),
        ]))
        .unwrap_err();
    assert!(err.is_invalid_argument(), "got {err}");
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_wrong_kind_is_invalid_argument() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    let mut a = adapter(&dir, scale_factory(), ExecutorConfig::default());

    let image = tensor_codec::Image::filled(1, 1, 0xFF00_0000);
    let err = a.run_single(LayerValue::Image(image)).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_buffers_reused_across_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "sum", TWO_IN_TWO_OUT);
    let mut a = adapter(&dir, sum_factory(), ExecutorConfig::default());
    let inputs = named(&[
        ("input_x", vec![1.0, 2.0, 3.0, 4.0]),
        ("input_y", vec![10.0, 20.0, 30.0, 40.0]),
    ]);

    a.run(&inputs).unwrap();
    a.run(&inputs).unwrap();
    let stats = a.buffer_stats();
    assert_eq!(stats.reallocations, 4);
    assert_eq!(stats.reuses, 4);
}

#[test]
fn test_gpu_unavailable_falls_back_to_cpu() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    let mut a = adapter(
        &dir,
        scale_factory(),
        ExecutorConfig::default().with_device(Device::Gpu),
    );

    assert_eq!(a.active_device(), Device::Cpu);
    assert!(matches!(
        a.fallback_reason(),
        Some(RuntimeError::UnsupportedConfiguration(_))
    ));
    // Still usable.
    let out = a.run_single(LayerValue::Vector(vec![2.0])).unwrap();
    assert!((out.as_vector().unwrap()[0] - 25.0).abs() < 0.01);
}

#[test]
fn test_supported_gpu_is_used() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    let factory = scale_factory().with_devices(&[Device::Cpu, Device::Gpu]);
    let mut a = adapter(&dir, factory, ExecutorConfig::default());

    assert!(a.can_run_on(Device::Gpu));
    assert!(!a.can_run_on(Device::Nnapi));
    assert!(a.set_device(Device::Gpu).unwrap());
    assert_eq!(a.active_device(), Device::Gpu);
    assert!(a.fallback_reason().is_none());
}

#[test]
fn test_config_change_rebuilds_only_when_different() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    let factory = scale_factory();
    let builds = Arc::clone(&factory.builds);
    let mut a = adapter(&dir, factory, ExecutorConfig::default());
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    assert!(!a.set_use_fp16(false).unwrap());
    assert!(!a.set_device(Device::Cpu).unwrap());
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    assert!(a.set_use_fp16(true).unwrap());
    assert!(a.set_num_threads(2).unwrap());
    assert_eq!(builds.load(Ordering::SeqCst), 3);
}

#[test]
fn test_missing_model_file_is_model_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "scale", ONE_IN_ONE_OUT);
    std::fs::remove_file(dir.join("model.bin")).unwrap();

    let bundle = Arc::new(ModelBundle::load(&dir).unwrap());
    let mut a = TensorRuntimeAdapter::new(bundle, Arc::new(scale_factory()), ExecutorConfig::default());
    assert!(matches!(a.load(), Err(RuntimeError::ModelError(_))));
    assert!(!a.is_loaded());
}

#[test]
fn test_labeled_output() {
    let manifest = r#"{
        "id": "labeled",
        "name": "Labeled",
        "model": { "file": "model.bin" },
        "inputs": [ { "name": "x", "type": "array", "shape": [1] } ],
        "outputs": [
            { "name": "classes", "type": "array", "shape": [1, 3], "labels": ["cat", "dog", "fox"] }
        ]
    }"#;
    let tmp = tempfile::tempdir().unwrap();
    let dir = write_bundle(tmp.path(), "labeled", manifest);
    let factory = MathFactory::new(|ins| vec![vec![0.1, ins[0][0], 0.2]]);
    let mut a = adapter(&dir, factory, ExecutorConfig::default());

    let out = a.run_single(LayerValue::Vector(vec![0.7])).unwrap();
    let pairs = out.as_labeled().unwrap();
    let labels: Vec<&str> = pairs.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec!["cat", "dog", "fox"]);
    assert!((pairs[1].1 - 0.7).abs() < 1e-6);
    assert!((pairs[2].1 - 0.2).abs() < 1e-6);
}

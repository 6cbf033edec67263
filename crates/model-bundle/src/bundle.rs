// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model bundles: a manifest turned into ordered, named layer interfaces.

use crate::manifest::{BundleManifest, LabelSource, LayerKind, ManifestLayer, MANIFEST_FILE};
use crate::{
    BundleError, LayerDescription, LayerInterface, LayerRole, PixelBufferDescription,
    VectorDescription,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Read-only options carried by the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOptions {
    /// Preferred capture device position, as declared (`"0"` back, `"1"` front).
    pub device_position: Option<String>,
}

impl ModelOptions {
    /// Whether the model asks for the front-facing camera.
    pub fn prefers_front_camera(&self) -> bool {
        self.device_position.as_deref() == Some("1")
    }
}

/// A packaged model plus the description of its tensor interface.
///
/// Constructed once from a manifest and immutable afterwards. Input and
/// output indices follow manifest order; names are unique per direction.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    path: PathBuf,
    id: String,
    name: String,
    details: String,
    version: String,
    author: String,
    license: String,
    quantized: bool,
    placeholder: bool,
    model_type: Option<String>,
    model_file: Option<String>,
    options: ModelOptions,
    inputs: Vec<LayerInterface>,
    outputs: Vec<LayerInterface>,
    input_index: HashMap<String, usize>,
    output_index: HashMap<String, usize>,
}

impl ModelBundle {
    /// Loads the bundle rooted at `dir`.
    ///
    /// Steps:
    /// 1. Parse `model.json` and validate it.
    /// 2. Resolve label files relative to `dir`.
    /// 3. Build one [`LayerInterface`] per declared layer.
    pub fn load(dir: &Path) -> Result<Self, BundleError> {
        let manifest = BundleManifest::from_file(&dir.join(MANIFEST_FILE))?;
        Self::from_manifest(manifest, dir)
    }

    /// Builds a bundle from a manifest string; label files resolve against `dir`.
    pub fn from_json(json: &str, dir: &Path) -> Result<Self, BundleError> {
        Self::from_manifest(BundleManifest::from_json(json)?, dir)
    }

    pub fn from_manifest(manifest: BundleManifest, dir: &Path) -> Result<Self, BundleError> {
        manifest.validate()?;

        let quantized = manifest.is_quantized();
        let inputs = build_layers(&manifest.inputs, LayerRole::Input, quantized, dir)?;
        let outputs = build_layers(&manifest.outputs, LayerRole::Output, quantized, dir)?;

        let index = |layers: &[LayerInterface]| {
            layers
                .iter()
                .enumerate()
                .map(|(i, l)| (l.name().to_string(), i))
                .collect::<HashMap<_, _>>()
        };
        let input_index = index(&inputs);
        let output_index = index(&outputs);

        let bundle = Self {
            path: dir.to_path_buf(),
            quantized,
            placeholder: manifest.is_placeholder(),
            model_type: manifest.model_type().map(str::to_string),
            model_file: manifest.model.file,
            options: ModelOptions {
                device_position: manifest.options.device_position,
            },
            id: manifest.id,
            name: manifest.name,
            details: manifest.details,
            version: manifest.version,
            author: manifest.author,
            license: manifest.license,
            inputs,
            outputs,
            input_index,
            output_index,
        };
        tracing::debug!("loaded bundle {}", bundle.summary());
        Ok(bundle)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn is_quantized(&self) -> bool {
        self.quantized
    }

    /// A placeholder bundle has no model behind it; inference through it
    /// produces zeroed outputs.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn model_type(&self) -> Option<&str> {
        self.model_type.as_deref()
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Absolute path of the model file, if the bundle declares one.
    pub fn model_path(&self) -> Option<PathBuf> {
        self.model_file.as_ref().map(|f| self.path.join(f))
    }

    pub fn inputs(&self) -> &[LayerInterface] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[LayerInterface] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&LayerInterface> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&LayerInterface> {
        self.outputs.get(index)
    }

    pub fn input_named(&self, name: &str) -> Option<&LayerInterface> {
        self.input_index.get(name).map(|&i| &self.inputs[i])
    }

    pub fn output_named(&self, name: &str) -> Option<&LayerInterface> {
        self.output_index.get(name).map(|&i| &self.outputs[i])
    }

    pub fn input_position(&self, name: &str) -> Option<usize> {
        self.input_index.get(name).copied()
    }

    pub fn output_position(&self, name: &str) -> Option<usize> {
        self.output_index.get(name).copied()
    }

    /// `true` when the bundle declares exactly one input and one output.
    pub fn is_single_io(&self) -> bool {
        self.inputs.len() == 1 && self.outputs.len() == 1
    }

    /// Labels of the first labeled output, if any.
    pub fn labels(&self) -> Option<&[String]> {
        self.outputs.iter().find_map(|o| o.description().labels())
    }

    /// Image volume of the first pixel-buffer input, if any.
    pub fn input_volume(&self) -> Option<tensor_codec::ImageVolume> {
        self.inputs
            .iter()
            .find_map(|i| i.description().image_volume())
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "'{}' v{} ({} inputs, {} outputs{}{})",
            self.id,
            self.version,
            self.inputs.len(),
            self.outputs.len(),
            if self.quantized { ", quantized" } else { "" },
            if self.placeholder { ", placeholder" } else { "" },
        )
    }
}

fn build_layers(
    layers: &[ManifestLayer],
    role: LayerRole,
    default_quantized: bool,
    dir: &Path,
) -> Result<Vec<LayerInterface>, BundleError> {
    layers
        .iter()
        .map(|l| build_layer(l, role, default_quantized, dir))
        .collect()
}

fn build_layer(
    layer: &ManifestLayer,
    role: LayerRole,
    default_quantized: bool,
    dir: &Path,
) -> Result<LayerInterface, BundleError> {
    let quantized = layer.quantized.unwrap_or(default_quantized);

    let description = match layer.kind()? {
        LayerKind::PixelBuffer => LayerDescription::PixelBuffer(PixelBufferDescription {
            format: layer.pixel_format()?,
            volume: layer.image_volume()?,
            quantized,
            normalizer: layer.normalizer()?,
            denormalizer: layer.denormalizer()?,
        }),
        LayerKind::Vector => {
            let shape = layer.parsed_shape()?;
            let labels = match &layer.labels {
                Some(source) => Some(load_labels(source, dir)?),
                None => None,
            };
            if let Some(labels) = &labels {
                if labels.len() != shape.num_elements() {
                    return Err(BundleError::LabelMismatch {
                        layer: layer.name.clone(),
                        expected: shape.num_elements(),
                        actual: labels.len(),
                    });
                }
            }
            LayerDescription::Vector(VectorDescription {
                shape,
                quantized,
                labels,
                quantizer: layer.quantizer()?,
                dequantizer: layer.dequantizer()?,
            })
        }
    };

    Ok(LayerInterface::new(layer.name.clone(), role, description))
}

/// Reads labels inline or from a newline-separated file, dropping trailing
/// blank lines.
fn load_labels(source: &LabelSource, dir: &Path) -> Result<Vec<String>, BundleError> {
    match source {
        LabelSource::Inline(labels) => Ok(labels.clone()),
        LabelSource::File(file) => {
            let path = dir.join(file);
            let content =
                std::fs::read_to_string(&path).map_err(|source| BundleError::ResourceRead {
                    path: path.clone(),
                    source,
                })?;
            let mut labels: Vec<String> = content
                .lines()
                .map(|l| l.trim_end().to_string())
                .collect();
            while labels.last().is_some_and(|l| l.is_empty()) {
                labels.pop();
            }
            Ok(labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayerValue;

    fn two_in_two_out() -> &'static str {
        r#"{
            "id": "2_in_2_out", "name": "2 in 2 out",
            "model": { "file": "model.tflite" },
            "inputs": [
                { "name": "input_x", "type": "array", "shape": [4] },
                { "name": "input_y", "type": "array", "shape": [4] }
            ],
            "outputs": [
                { "name": "output_s", "type": "array", "shape": [1] },
                { "name": "output_z", "type": "array", "shape": [1] }
            ]
        }"#
    }

    #[test]
    fn test_indices_follow_manifest_order() {
        let b = ModelBundle::from_json(two_in_two_out(), Path::new(".")).unwrap();
        assert_eq!(b.inputs().len(), 2);
        assert_eq!(b.input(0).unwrap().name(), "input_x");
        assert_eq!(b.input(1).unwrap().name(), "input_y");
        assert_eq!(b.input_position("input_y"), Some(1));
        assert_eq!(b.output_named("output_z").unwrap().role(), LayerRole::Output);
        assert!(b.input_named("output_z").is_none());
        assert!(!b.is_single_io());
    }

    #[test]
    fn test_layer_quantization_inherits_model_flag() {
        let json = r#"{
            "id": "q", "name": "q", "model": { "file": "m.tflite", "quantized": true },
            "inputs": [
                { "name": "a", "type": "array", "shape": [2] },
                { "name": "b", "type": "array", "shape": [2], "quantized": false }
            ]
        }"#;
        let b = ModelBundle::from_json(json, Path::new(".")).unwrap();
        assert!(b.input(0).unwrap().description().is_quantized());
        assert!(!b.input(1).unwrap().description().is_quantized());
    }

    #[test]
    fn test_inline_labels() {
        let json = r#"{
            "id": "l", "name": "l", "model": { "file": "m.tflite" },
            "outputs": [{ "name": "p", "type": "array", "shape": [2], "labels": ["no", "yes"] }]
        }"#;
        let b = ModelBundle::from_json(json, Path::new(".")).unwrap();
        assert_eq!(b.labels().unwrap(), &["no".to_string(), "yes".to_string()]);
    }

    #[test]
    fn test_label_count_mismatch() {
        let json = r#"{
            "id": "l", "name": "l", "model": { "file": "m.tflite" },
            "outputs": [{ "name": "p", "type": "array", "shape": [3], "labels": ["no", "yes"] }]
        }"#;
        let err = ModelBundle::from_json(json, Path::new(".")).unwrap_err();
        assert!(matches!(
            err,
            BundleError::LabelMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn test_label_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("labels.txt"), "background\ncat\ndog\n\n").unwrap();
        let json = r#"{
            "id": "l", "name": "l", "model": { "file": "m.tflite" },
            "outputs": [{ "name": "p", "type": "array", "shape": [1, 3], "labels": "labels.txt" }]
        }"#;
        let b = ModelBundle::from_json(json, dir.path()).unwrap();
        let labels = b.labels().unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], "background");
        assert_eq!(labels[2], "dog");
    }

    #[test]
    fn test_missing_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{
            "id": "l", "name": "l", "model": { "file": "m.tflite" },
            "outputs": [{ "name": "p", "type": "array", "shape": [3], "labels": "nope.txt" }]
        }"#;
        assert!(matches!(
            ModelBundle::from_json(json, dir.path()),
            Err(BundleError::ResourceRead { .. })
        ));
    }

    #[test]
    fn test_image_input_volume() {
        let json = r#"{
            "id": "img", "name": "img", "model": { "file": "m.tflite" },
            "options": { "device_position": "1" },
            "inputs": [{ "name": "image", "type": "image", "shape": [-1, 128, 96, 3],
                         "normalize": { "standard": "[0,1]" } }],
            "outputs": [{ "name": "out", "type": "array", "shape": [1] }]
        }"#;
        let b = ModelBundle::from_json(json, Path::new("/bundles/img.tfbundle")).unwrap();
        let volume = b.input_volume().unwrap();
        assert_eq!((volume.width, volume.height), (96, 128));
        assert!(b.options().prefers_front_camera());
        assert_eq!(
            b.model_path().unwrap(),
            PathBuf::from("/bundles/img.tfbundle/m.tflite")
        );
        assert!(b.is_single_io());
    }

    #[test]
    fn test_demarshal_uses_declared_description() {
        let b = ModelBundle::from_json(two_in_two_out(), Path::new(".")).unwrap();
        let out = b.output(0).unwrap().description();
        let value = out.demarshal(&25.0f32.to_ne_bytes()).unwrap();
        assert_eq!(value, LayerValue::Vector(vec![25.0]));
    }
}

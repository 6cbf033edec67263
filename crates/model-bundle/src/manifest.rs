// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON bundle manifest parsing.
//!
//! The manifest (`model.json`) sits at the root of a bundle directory and
//! describes the model's metadata and the layout of every input and output
//! tensor. Only the fields that drive codec selection are interpreted;
//! anything else is ignored.
//!
//! # Format
//! ```json
//! {
//!   "id": "mobilenet-v2-100-224-unquantized",
//!   "name": "MobileNet V2 1.0 224",
//!   "details": "...",
//!   "version": "1",
//!   "author": "...",
//!   "license": "...",
//!   "model": { "file": "model.tflite", "quantized": false, "type": "image.classification.imagenet" },
//!   "options": { "device_position": "0" },
//!   "inputs": [
//!     { "name": "image", "type": "image", "shape": [224, 224, 3],
//!       "format": "RGB", "normalize": { "standard": "[-1,1]" } }
//!   ],
//!   "outputs": [
//!     { "name": "classification", "type": "array", "shape": [1, 1001], "labels": "labels.txt" }
//!   ]
//! }
//! ```

use crate::BundleError;
use std::collections::HashSet;
use std::path::Path;
use tensor_codec::{
    DataDequantizer, DataQuantizer, ImageVolume, PixelDenormalizer, PixelFormat,
    PixelNormalizer, Shape,
};

/// Manifest file name inside every bundle directory.
pub const MANIFEST_FILE: &str = "model.json";

/// Top-level bundle manifest, deserialized from `model.json`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BundleManifest {
    /// Unique bundle identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    /// Model file and model-level flags.
    #[serde(default)]
    pub model: ModelSection,
    /// Top-level alias for `model.quantized`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized: Option<bool>,
    /// Top-level alias for `model.type`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    /// Top-level alias for `model.placeholder`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<bool>,
    #[serde(default)]
    pub options: ManifestOptions,
    #[serde(default)]
    pub inputs: Vec<ManifestLayer>,
    #[serde(default)]
    pub outputs: Vec<ManifestLayer>,
}

fn default_version() -> String {
    "1".to_string()
}

/// The `model` table.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ModelSection {
    /// Model file name relative to the bundle directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<bool>,
    /// Engine backend tag (e.g. `"tflite"`); informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

/// The `options` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestOptions {
    /// Preferred camera position (`"0"` back, `"1"` front).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_position: Option<String>,
}

/// A single input or output entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestLayer {
    pub name: String,
    /// Layer type string: `"image"`/`"pixelbuffer"` or `"array"`/`"vector"`.
    #[serde(rename = "type")]
    pub layer_type: String,
    pub shape: Vec<i64>,
    /// Overrides the model-level quantization flag for this layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized: Option<bool>,
    /// Pixel format for image layers (`"RGB"` or `"BGR"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<CodecSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denormalize: Option<CodecSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantize: Option<CodecSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dequantize: Option<CodecSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelSource>,
}

/// A normalization or quantization spec: either a standard range or an
/// explicit scale and bias.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CodecSpec {
    /// `"[0,1]"` or `"[-1,1]"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<BiasSpec>,
}

/// Bias applied to every channel, or one per colour channel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum BiasSpec {
    Single(f32),
    PerChannel { r: f32, g: f32, b: f32 },
}

/// Labels listed inline or stored in a newline-separated file in the bundle.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum LabelSource {
    Inline(Vec<String>),
    File(String),
}

/// Which of the two layer description variants a manifest entry selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    PixelBuffer,
    Vector,
}

impl LayerKind {
    /// Parses a layer type string, case-insensitively.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image" | "pixelbuffer" | "pixel_buffer" => Some(LayerKind::PixelBuffer),
            "array" | "vector" => Some(LayerKind::Vector),
            _ => None,
        }
    }
}

/// The two standard ranges a [`CodecSpec`] may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StandardRange {
    ZeroToOne,
    NegativeOneToOne,
}

impl BundleManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, BundleError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| BundleError::ResourceRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, BundleError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Whether the model is quantized; `model.quantized` wins over the
    /// top-level alias.
    pub fn is_quantized(&self) -> bool {
        self.model.quantized.or(self.quantized).unwrap_or(false)
    }

    pub fn is_placeholder(&self) -> bool {
        self.model.placeholder.or(self.placeholder).unwrap_or(false)
    }

    pub fn model_type(&self) -> Option<&str> {
        self.model
            .model_type
            .as_deref()
            .or(self.model_type.as_deref())
    }

    /// Validates that the manifest is internally consistent.
    ///
    /// Checks:
    /// - `id` and `name` are non-empty.
    /// - Non-placeholder models declare a model file.
    /// - Layer names are unique within each direction.
    /// - Layer types, shapes and pixel formats are recognised.
    /// - Inputs only carry input codecs and outputs only output codecs.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.id.trim().is_empty() {
            return Err(BundleError::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(BundleError::MissingField("name"));
        }
        if !self.is_placeholder() && self.model.file.is_none() {
            return Err(BundleError::MissingField("model.file"));
        }

        for (layers, is_input) in [(&self.inputs, true), (&self.outputs, false)] {
            let mut seen = HashSet::new();
            for layer in layers {
                if !seen.insert(layer.name.as_str()) {
                    return Err(invalid(&layer.name, "duplicate layer name"));
                }
                layer.validate(is_input)?;
            }
        }

        Ok(())
    }
}

impl ManifestLayer {
    pub fn kind(&self) -> Result<LayerKind, BundleError> {
        LayerKind::from_str_loose(&self.layer_type).ok_or_else(|| {
            invalid(
                &self.name,
                format!("unrecognised layer type '{}'", self.layer_type),
            )
        })
    }

    pub fn parsed_shape(&self) -> Result<Shape, BundleError> {
        if self.shape.is_empty() {
            return Err(invalid(&self.name, "empty shape"));
        }
        Shape::from_declared(&self.shape).map_err(|e| invalid(&self.name, e.to_string()))
    }

    pub fn image_volume(&self) -> Result<ImageVolume, BundleError> {
        let shape = self.parsed_shape()?;
        let volume = ImageVolume::from_shape(&shape).ok_or_else(|| {
            invalid(
                &self.name,
                format!("image shape must be [height, width, channels], got {shape}"),
            )
        })?;
        if volume.channels != 3 {
            return Err(invalid(
                &self.name,
                format!("image layers need 3 channels, got {}", volume.channels),
            ));
        }
        Ok(volume)
    }

    pub fn pixel_format(&self) -> Result<PixelFormat, BundleError> {
        match &self.format {
            None => Ok(PixelFormat::Rgb),
            Some(f) => PixelFormat::from_str_loose(f)
                .ok_or_else(|| invalid(&self.name, format!("unsupported pixel format '{f}'"))),
        }
    }

    fn validate(&self, is_input: bool) -> Result<(), BundleError> {
        let kind = self.kind()?;
        match kind {
            LayerKind::PixelBuffer => {
                self.image_volume()?;
                self.pixel_format()?;
            }
            LayerKind::Vector => {
                self.parsed_shape()?;
            }
        }

        let (wrong, wrong_name) = if is_input {
            (
                self.denormalize.is_some() || self.dequantize.is_some(),
                "output codec on an input layer",
            )
        } else {
            (
                self.normalize.is_some() || self.quantize.is_some(),
                "input codec on an output layer",
            )
        };
        if wrong {
            return Err(invalid(&self.name, wrong_name));
        }

        // Build every codec once so bad specs surface here.
        self.normalizer()?;
        self.denormalizer()?;
        self.quantizer()?;
        self.dequantizer()?;
        Ok(())
    }

    pub fn normalizer(&self) -> Result<Option<PixelNormalizer>, BundleError> {
        let Some(spec) = &self.normalize else {
            return Ok(None);
        };
        let n = match spec.standard_range(&self.name)? {
            Some(StandardRange::ZeroToOne) => PixelNormalizer::ZeroToOne,
            Some(StandardRange::NegativeOneToOne) => PixelNormalizer::NegativeOneToOne,
            None => match spec.scale_and_bias(&self.name)? {
                (scale, BiasSpec::Single(bias)) => PixelNormalizer::SingleBias { scale, bias },
                (scale, BiasSpec::PerChannel { r, g, b }) => PixelNormalizer::PerChannelBias {
                    scale,
                    bias: [r, g, b],
                },
            },
        };
        Ok(Some(n))
    }

    pub fn denormalizer(&self) -> Result<Option<PixelDenormalizer>, BundleError> {
        let Some(spec) = &self.denormalize else {
            return Ok(None);
        };
        let d = match spec.standard_range(&self.name)? {
            Some(StandardRange::ZeroToOne) => PixelDenormalizer::ZeroToOne,
            Some(StandardRange::NegativeOneToOne) => PixelDenormalizer::NegativeOneToOne,
            None => match spec.scale_and_bias(&self.name)? {
                (scale, BiasSpec::Single(bias)) => PixelDenormalizer::SingleBias { scale, bias },
                (scale, BiasSpec::PerChannel { r, g, b }) => PixelDenormalizer::PerChannelBias {
                    scale,
                    bias: [r, g, b],
                },
            },
        };
        Ok(Some(d))
    }

    pub fn quantizer(&self) -> Result<Option<DataQuantizer>, BundleError> {
        let Some(spec) = &self.quantize else {
            return Ok(None);
        };
        let q = match spec.standard_range(&self.name)? {
            Some(StandardRange::ZeroToOne) => DataQuantizer::ZeroToOne,
            Some(StandardRange::NegativeOneToOne) => DataQuantizer::NegativeOneToOne,
            None => {
                let (scale, bias) = spec.scalar_scale_and_bias(&self.name)?;
                DataQuantizer::ScaleBias { scale, bias }
            }
        };
        Ok(Some(q))
    }

    pub fn dequantizer(&self) -> Result<Option<DataDequantizer>, BundleError> {
        let Some(spec) = &self.dequantize else {
            return Ok(None);
        };
        let d = match spec.standard_range(&self.name)? {
            Some(StandardRange::ZeroToOne) => DataDequantizer::ZeroToOne,
            Some(StandardRange::NegativeOneToOne) => DataDequantizer::NegativeOneToOne,
            None => {
                let (scale, bias) = spec.scalar_scale_and_bias(&self.name)?;
                DataDequantizer::ScaleBias { scale, bias }
            }
        };
        Ok(Some(d))
    }
}

impl CodecSpec {
    fn standard_range(&self, layer: &str) -> Result<Option<StandardRange>, BundleError> {
        let Some(standard) = &self.standard else {
            return Ok(None);
        };
        let compact: String = standard.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "[0,1]" => Ok(Some(StandardRange::ZeroToOne)),
            "[-1,1]" => Ok(Some(StandardRange::NegativeOneToOne)),
            _ => Err(invalid(layer, format!("unknown standard range '{standard}'"))),
        }
    }

    fn scale_and_bias(&self, layer: &str) -> Result<(f32, BiasSpec), BundleError> {
        if self.scale.is_none() && self.bias.is_none() {
            return Err(invalid(
                layer,
                "codec needs either 'standard' or 'scale'/'bias'",
            ));
        }
        Ok((
            self.scale.unwrap_or(1.0),
            self.bias.unwrap_or(BiasSpec::Single(0.0)),
        ))
    }

    fn scalar_scale_and_bias(&self, layer: &str) -> Result<(f32, f32), BundleError> {
        match self.scale_and_bias(layer)? {
            (scale, BiasSpec::Single(bias)) => Ok((scale, bias)),
            (_, BiasSpec::PerChannel { .. }) => Err(invalid(
                layer,
                "per-channel bias is only valid for pixel normalization",
            )),
        }
    }
}

fn invalid(layer: &str, detail: impl Into<String>) -> BundleError {
    BundleError::InvalidLayer {
        layer: layer.to_string(),
        detail: detail.into(),
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Application-level values exchanged with a model.

use std::collections::HashMap;
use tensor_codec::Image;

/// Values keyed by layer name, used for both inputs and outputs.
pub type NamedValues = HashMap<String, LayerValue>;

/// One layer's worth of data before marshaling or after demarshaling.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerValue {
    /// A flat numeric tensor.
    Vector(Vec<f32>),
    /// A vector output whose layer carries labels, as `(label, score)`
    /// pairs in tensor order. Labels may repeat.
    Labeled(Vec<(String, f32)>),
    /// A bitmap for pixel-buffer layers.
    Image(Image),
}

impl LayerValue {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LayerValue::Vector(_) => "vector",
            LayerValue::Labeled(_) => "labeled vector",
            LayerValue::Image(_) => "image",
        }
    }

    /// Number of scalar entries (pixels for images).
    pub fn len(&self) -> usize {
        match self {
            LayerValue::Vector(v) => v.len(),
            LayerValue::Labeled(pairs) => pairs.len(),
            LayerValue::Image(img) => img.width() * img.height(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            LayerValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_labeled(&self) -> Option<&[(String, f32)]> {
        match self {
            LayerValue::Labeled(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            LayerValue::Image(img) => Some(img),
            _ => None,
        }
    }
}

impl From<Vec<f32>> for LayerValue {
    fn from(v: Vec<f32>) -> Self {
        LayerValue::Vector(v)
    }
}

impl From<Image> for LayerValue {
    fn from(img: Image) -> Self {
        LayerValue::Image(img)
    }
}

impl From<Vec<(String, f32)>> for LayerValue {
    fn from(pairs: Vec<(String, f32)>) -> Self {
        LayerValue::Labeled(pairs)
    }
}

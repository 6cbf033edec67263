// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer descriptions and the marshaling between [`LayerValue`]s and the
//! byte layout an executor expects.
//!
//! A [`LayerDescription`] is a closed sum type. Marshaling and demarshaling
//! match on it exhaustively, so a new tensor kind cannot be added without
//! every codec path being updated.

use crate::LayerValue;
use std::fmt;
use tensor_codec::{
    bytes, pack_rgb, unpack_rgb, CodecError, DType, DataDequantizer, DataQuantizer, Image,
    ImageVolume, PixelDenormalizer, PixelFormat, PixelNormalizer, Shape,
};

/// Direction of a layer relative to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LayerRole {
    Input,
    Output,
}

impl LayerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerRole::Input => "input",
            LayerRole::Output => "output",
        }
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBufferDescription {
    pub format: PixelFormat,
    pub volume: ImageVolume,
    pub quantized: bool,
    /// Input direction only.
    pub normalizer: Option<PixelNormalizer>,
    /// Output direction only.
    pub denormalizer: Option<PixelDenormalizer>,
}

/// A flat numeric tensor, optionally labeled.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDescription {
    pub shape: Shape,
    pub quantized: bool,
    /// When present, `labels.len()` equals the element count.
    pub labels: Option<Vec<String>>,
    /// Input direction only.
    pub quantizer: Option<DataQuantizer>,
    /// Output direction only.
    pub dequantizer: Option<DataDequantizer>,
}

impl VectorDescription {
    pub fn length(&self) -> usize {
        self.shape.num_elements()
    }
}

/// Shape, quantization and codec of one tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerDescription {
    PixelBuffer(PixelBufferDescription),
    Vector(VectorDescription),
}

impl LayerDescription {
    pub fn kind_name(&self) -> &'static str {
        match self {
            LayerDescription::PixelBuffer(_) => "pixelbuffer",
            LayerDescription::Vector(_) => "vector",
        }
    }

    pub fn is_quantized(&self) -> bool {
        match self {
            LayerDescription::PixelBuffer(p) => p.quantized,
            LayerDescription::Vector(v) => v.quantized,
        }
    }

    pub fn dtype(&self) -> DType {
        DType::for_quantized(self.is_quantized())
    }

    /// Number of scalar elements in the tensor.
    pub fn element_count(&self) -> usize {
        match self {
            LayerDescription::PixelBuffer(p) => p.volume.num_elements(),
            LayerDescription::Vector(v) => v.length(),
        }
    }

    /// Exact size of the marshaled buffer.
    pub fn byte_len(&self) -> usize {
        self.element_count() * self.dtype().size_bytes()
    }

    pub fn labels(&self) -> Option<&[String]> {
        match self {
            LayerDescription::Vector(v) => v.labels.as_deref(),
            LayerDescription::PixelBuffer(_) => None,
        }
    }

    pub fn image_volume(&self) -> Option<ImageVolume> {
        match self {
            LayerDescription::PixelBuffer(p) => Some(p.volume),
            LayerDescription::Vector(_) => None,
        }
    }

    /// Checks that `value` fits this layer without touching any buffer.
    pub fn check_value(&self, value: &LayerValue) -> Result<(), CodecError> {
        match (self, value) {
            (LayerDescription::PixelBuffer(p), LayerValue::Image(img)) => {
                if img.width() != p.volume.width || img.height() != p.volume.height {
                    return Err(CodecError::ImageSizeMismatch {
                        expected_width: p.volume.width,
                        expected_height: p.volume.height,
                        actual_width: img.width(),
                        actual_height: img.height(),
                    });
                }
                if p.volume.channels != 3 {
                    return Err(CodecError::UnsupportedChannels(p.volume.channels));
                }
                Ok(())
            }
            (LayerDescription::Vector(v), LayerValue::Vector(values)) => {
                if values.len() != v.length() {
                    return Err(CodecError::LengthMismatch {
                        expected: v.length(),
                        actual: values.len(),
                    });
                }
                Ok(())
            }
            (LayerDescription::PixelBuffer(_), other) => Err(CodecError::WrongKind {
                expected: "image",
                actual: other.kind_name(),
            }),
            (LayerDescription::Vector(_), other) => Err(CodecError::WrongKind {
                expected: "vector",
                actual: other.kind_name(),
            }),
        }
    }

    /// Marshals `value` into `buf`.
    ///
    /// `buf` is resized to [`Self::byte_len`] only when its length differs,
    /// so a buffer reused across calls is never reallocated once warm.
    pub fn marshal(&self, value: &LayerValue, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        self.check_value(value)?;
        let len = self.byte_len();
        if buf.len() != len {
            buf.resize(len, 0);
        }
        match (self, value) {
            (LayerDescription::PixelBuffer(p), LayerValue::Image(img)) => {
                marshal_pixels(p, img, buf);
                Ok(())
            }
            (LayerDescription::Vector(v), LayerValue::Vector(values)) => {
                marshal_vector(v, values, buf)
            }
            // check_value rejected every other pairing.
            (_, other) => Err(CodecError::WrongKind {
                expected: self.kind_name(),
                actual: other.kind_name(),
            }),
        }
    }

    /// Reads a value back out of an executor buffer.
    pub fn demarshal(&self, buf: &[u8]) -> Result<LayerValue, CodecError> {
        let expected = self.byte_len();
        if buf.len() != expected {
            return Err(CodecError::BufferSizeMismatch {
                expected,
                actual: buf.len(),
            });
        }
        match self {
            LayerDescription::PixelBuffer(p) => demarshal_pixels(p, buf).map(LayerValue::Image),
            LayerDescription::Vector(v) => Ok(demarshal_vector(v, buf)),
        }
    }
}

// ── Pixel buffers ──────────────────────────────────────────────

/// Walks the image with width as the outer loop and height as the inner
/// loop, consuming pixels through one running linear index. Models packaged
/// for this layout depend on the exact visiting order.
fn marshal_pixels(desc: &PixelBufferDescription, image: &Image, buf: &mut [u8]) {
    let pixels = image.pixels();
    let order = desc.format.channel_order();
    let mut pixel = 0;
    let mut out = 0;

    for _x in 0..desc.volume.width {
        for _y in 0..desc.volume.height {
            let rgb = unpack_rgb(pixels[pixel]);
            pixel += 1;
            for channel in order {
                let value = rgb[channel];
                if desc.quantized {
                    buf[out] = value;
                } else {
                    let f = match &desc.normalizer {
                        Some(n) => n.normalize(value, channel),
                        None => value as f32,
                    };
                    bytes::put_f32(buf, out, f);
                }
                out += 1;
            }
        }
    }
}

fn demarshal_pixels(desc: &PixelBufferDescription, buf: &[u8]) -> Result<Image, CodecError> {
    let order = desc.format.channel_order();
    let mut pixels = Vec::with_capacity(desc.volume.num_pixels());
    let mut at = 0;

    for _x in 0..desc.volume.width {
        for _y in 0..desc.volume.height {
            let mut rgb = [0u8; 3];
            for channel in order {
                rgb[channel] = if desc.quantized {
                    buf[at]
                } else {
                    let f = bytes::get_f32(buf, at);
                    match &desc.denormalizer {
                        Some(d) => d.denormalize(f, channel),
                        None => f as u8,
                    }
                };
                at += 1;
            }
            pixels.push(pack_rgb(rgb[0], rgb[1], rgb[2]));
        }
    }

    Image::new(desc.volume.width, desc.volume.height, pixels)
}

// ── Vectors ────────────────────────────────────────────────────

fn marshal_vector(
    desc: &VectorDescription,
    values: &[f32],
    buf: &mut [u8],
) -> Result<(), CodecError> {
    if desc.quantized {
        for (dst, &v) in buf.iter_mut().zip(values) {
            *dst = match &desc.quantizer {
                Some(q) => q.quantize(v),
                None => v as u8,
            };
        }
        Ok(())
    } else {
        bytes::write_f32s(values, buf)
    }
}

fn demarshal_vector(desc: &VectorDescription, buf: &[u8]) -> LayerValue {
    let values: Vec<f32> = if desc.quantized {
        buf.iter()
            .map(|&b| match &desc.dequantizer {
                Some(d) => d.dequantize(b),
                None => b as f32,
            })
            .collect()
    } else {
        (0..desc.length()).map(|i| bytes::get_f32(buf, i)).collect()
    };

    match &desc.labels {
        Some(labels) => LayerValue::Labeled(labels.iter().cloned().zip(values).collect()),
        None => LayerValue::Vector(values),
    }
}

// ── Layer interface ────────────────────────────────────────────

/// A named input or output of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInterface {
    name: String,
    role: LayerRole,
    description: LayerDescription,
}

impl LayerInterface {
    pub fn new(name: impl Into<String>, role: LayerRole, description: LayerDescription) -> Self {
        Self {
            name: name.into(),
            role,
            description,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn description(&self) -> &LayerDescription {
        &self.description
    }

    /// One-line summary for inspection output.
    pub fn summary(&self) -> String {
        let d = &self.description;
        let detail = match d {
            LayerDescription::PixelBuffer(p) => {
                let codec = match (p.normalizer, p.denormalizer) {
                    (Some(n), _) => format!(", normalize {n:?}"),
                    (_, Some(dn)) => format!(", denormalize {dn:?}"),
                    _ => String::new(),
                };
                format!("{} {}{codec}", p.format, p.volume)
            }
            LayerDescription::Vector(v) => {
                let labels = v
                    .labels
                    .as_ref()
                    .map(|l| format!(", {} labels", l.len()))
                    .unwrap_or_default();
                format!("{}{labels}", v.shape)
            }
        };
        format!(
            "{} '{}' [{}] {} ({}, {} bytes)",
            self.role,
            self.name,
            d.kind_name(),
            detail,
            d.dtype(),
            d.byte_len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(len: usize, quantized: bool) -> VectorDescription {
        VectorDescription {
            shape: Shape::vector(len),
            quantized,
            labels: None,
            quantizer: None,
            dequantizer: None,
        }
    }

    fn pixels(width: usize, height: usize, quantized: bool) -> PixelBufferDescription {
        PixelBufferDescription {
            format: PixelFormat::Rgb,
            volume: ImageVolume::new(width, height, 3),
            quantized,
            normalizer: None,
            denormalizer: None,
        }
    }

    #[test]
    fn test_vector_marshal_f32() {
        let d = LayerDescription::Vector(vector(3, false));
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Vector(vec![1.0, 2.5, -3.0]), &mut buf)
            .unwrap();
        assert_eq!(buf.len(), 12);
        assert_eq!(bytes::get_f32(&buf, 1), 2.5);
    }

    #[test]
    fn test_vector_length_mismatch() {
        let d = LayerDescription::Vector(vector(4, false));
        let mut buf = Vec::new();
        let err = d
            .marshal(&LayerValue::Vector(vec![1.0, 2.0]), &mut buf)
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthMismatch {
                expected: 4,
                actual: 2
            }
        );
        // Nothing was written.
        assert!(buf.is_empty());
    }

    #[test]
    fn test_wrong_kind() {
        let d = LayerDescription::PixelBuffer(pixels(2, 2, false));
        let mut buf = Vec::new();
        let err = d
            .marshal(&LayerValue::Vector(vec![0.0; 12]), &mut buf)
            .unwrap_err();
        assert!(matches!(err, CodecError::WrongKind { expected: "image", .. }));
    }

    #[test]
    fn test_quantized_vector_with_quantizer() {
        let mut v = vector(3, true);
        v.quantizer = Some(DataQuantizer::ZeroToOne);
        let d = LayerDescription::Vector(v);
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Vector(vec![0.0, 1.0, 0.5]), &mut buf)
            .unwrap();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[1], 255);
        assert!((buf[2] as i32 - 127).abs() <= 1);
    }

    #[test]
    fn test_quantized_vector_output_dequantized() {
        let mut v = vector(2, true);
        v.dequantizer = Some(DataDequantizer::ZeroToOne);
        let d = LayerDescription::Vector(v);
        let out = d.demarshal(&[0, 255]).unwrap();
        let values = out.as_vector().unwrap();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quantized_output_without_dequantizer_is_raw() {
        let d = LayerDescription::Vector(vector(2, true));
        let out = d.demarshal(&[7, 200]).unwrap();
        assert_eq!(out, LayerValue::Vector(vec![7.0, 200.0]));
    }

    #[test]
    fn test_labeled_output() {
        let mut v = vector(3, false);
        v.labels = Some(vec!["cat".into(), "dog".into(), "bird".into()]);
        let d = LayerDescription::Vector(v);
        let mut buf = vec![0u8; 12];
        bytes::write_f32s(&[0.1, 0.7, 0.2], &mut buf).unwrap();
        let out = d.demarshal(&buf).unwrap();
        let pairs = out.as_labeled().unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1], ("dog".to_string(), 0.7));
    }

    #[test]
    fn test_labeled_output_keeps_repeated_labels() {
        let mut v = vector(3, false);
        v.labels = Some(vec!["crane".into(), "cat".into(), "crane".into()]);
        let d = LayerDescription::Vector(v);
        let mut buf = vec![0u8; 12];
        bytes::write_f32s(&[0.9, 0.05, 0.05], &mut buf).unwrap();
        let out = d.demarshal(&buf).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(
            out.as_labeled().unwrap(),
            &[
                ("crane".to_string(), 0.9),
                ("cat".to_string(), 0.05),
                ("crane".to_string(), 0.05),
            ]
        );
    }

    #[test]
    fn test_demarshal_size_mismatch() {
        let d = LayerDescription::Vector(vector(2, false));
        assert!(matches!(
            d.demarshal(&[0u8; 4]),
            Err(CodecError::BufferSizeMismatch { expected: 8, actual: 4 })
        ));
    }

    #[test]
    fn test_pixel_marshal_quantized_channel_order() {
        let d = LayerDescription::PixelBuffer(pixels(2, 1, true));
        let img = Image::new(2, 1, vec![0xFF01_0203, 0xFF0A_0B0C]).unwrap();
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Image(img), &mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 10, 11, 12]);
    }

    #[test]
    fn test_pixel_marshal_bgr() {
        let mut p = pixels(1, 1, true);
        p.format = PixelFormat::Bgr;
        let d = LayerDescription::PixelBuffer(p);
        let img = Image::filled(1, 1, 0xFF01_0203);
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Image(img), &mut buf).unwrap();
        assert_eq!(buf, vec![3, 2, 1]);
    }

    #[test]
    fn test_pixel_marshal_normalized() {
        let mut p = pixels(2, 2, false);
        p.normalizer = Some(PixelNormalizer::NegativeOneToOne);
        let d = LayerDescription::PixelBuffer(p);
        let img = Image::filled(2, 2, pack_rgb(0, 255, 0));
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Image(img), &mut buf).unwrap();
        assert_eq!(buf.len(), 2 * 2 * 3 * 4);
        assert!((bytes::get_f32(&buf, 0) + 1.0).abs() < 0.01);
        assert!((bytes::get_f32(&buf, 1) - 1.0).abs() < 0.01);
        assert!((bytes::get_f32(&buf, 2) + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_pixel_marshal_unnormalized_writes_raw_floats() {
        let d = LayerDescription::PixelBuffer(pixels(1, 1, false));
        let img = Image::filled(1, 1, pack_rgb(10, 20, 30));
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Image(img), &mut buf).unwrap();
        assert_eq!(bytes::read_f32s(&buf).unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_pixel_size_mismatch() {
        let d = LayerDescription::PixelBuffer(pixels(4, 4, false));
        let mut buf = Vec::new();
        let err = d
            .marshal(&LayerValue::Image(Image::filled(4, 3, 0)), &mut buf)
            .unwrap_err();
        assert!(matches!(err, CodecError::ImageSizeMismatch { .. }));
    }

    #[test]
    fn test_buffer_reused_when_warm() {
        let d = LayerDescription::Vector(vector(16, false));
        let mut buf = Vec::new();
        d.marshal(&LayerValue::Vector(vec![0.0; 16]), &mut buf)
            .unwrap();
        let ptr = buf.as_ptr();
        d.marshal(&LayerValue::Vector(vec![1.0; 16]), &mut buf)
            .unwrap();
        assert_eq!(buf.as_ptr(), ptr);
    }

    #[test]
    fn test_pixel_output_denormalized() {
        let mut p = pixels(1, 2, false);
        p.denormalizer = Some(PixelDenormalizer::ZeroToOne);
        let d = LayerDescription::PixelBuffer(p);
        let mut buf = vec![0u8; 6 * 4];
        bytes::write_f32s(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0], &mut buf).unwrap();
        let img = d.demarshal(&buf).unwrap();
        let img = img.as_image().unwrap();
        assert_eq!(unpack_rgb(img.pixels()[0]), [255, 0, 0]);
        assert_eq!(unpack_rgb(img.pixels()[1]), [0, 0, 255]);
    }

    #[test]
    fn test_summary() {
        let layer = LayerInterface::new(
            "classification",
            LayerRole::Output,
            LayerDescription::Vector(vector(1001, false)),
        );
        let s = layer.summary();
        assert!(s.contains("output 'classification'"));
        assert!(s.contains("4004 bytes"));
    }
}

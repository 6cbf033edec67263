// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `netrun inspect` command: display a bundle's metadata and tensor layout.
//!
//! Prints each input and output layer with its kind, shape, element type,
//! codec and buffer size, i.e. everything that decides how values are
//! marshaled for the executor.

use model_bundle::{LayerDescription, LayerInterface};
use runtime::RuntimeConfig;

pub async fn execute(bundle: Option<String>, config: RuntimeConfig, json: bool) -> anyhow::Result<()> {
    let bundle = super::resolve_bundle(bundle.as_deref(), &config)?;

    if json {
        let manifest_path = bundle.path().join(model_bundle::MANIFEST_FILE);
        let manifest = model_bundle::manifest::BundleManifest::from_file(&manifest_path)?;
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    super::banner("Bundle Inspector");

    // ── Summary ────────────────────────────────────────────────
    println!("  Id:        {}", bundle.id());
    println!("  Name:      {}", bundle.name());
    if !bundle.details().is_empty() {
        println!("  Details:   {}", super::truncate(bundle.details(), 60));
    }
    println!("  Version:   {}", bundle.version());
    println!("  Author:    {}", or_dash(bundle.author()));
    println!("  License:   {}", or_dash(bundle.license()));
    println!("  Type:      {}", bundle.model_type().unwrap_or("-"));
    println!("  Quantized: {}", bundle.is_quantized());
    if bundle.is_placeholder() {
        println!("  Model:     placeholder (no inference)");
    } else if let Some(path) = bundle.model_path() {
        println!("  Model:     {}", path.display());
    }
    if let Some(pos) = &bundle.options().device_position {
        println!("  Camera:    {pos}");
    }
    println!();

    // ── Layers ─────────────────────────────────────────────────
    print_layers("Inputs", bundle.inputs());
    print_layers("Outputs", bundle.outputs());

    if let Some(labels) = bundle.labels() {
        let preview: Vec<&str> = labels.iter().take(5).map(String::as_str).collect();
        println!(
            "  Labels: {} ({}{})",
            labels.len(),
            preview.join(", "),
            if labels.len() > 5 { ", ..." } else { "" },
        );
        println!();
    }
    Ok(())
}

fn print_layers(title: &str, layers: &[LayerInterface]) {
    println!("  {title}:");
    println!(
        "  {:<4} {:<24} {:<8} {:<16} {:<4} {:<22} {:>10}",
        "Idx", "Name", "Kind", "Shape", "Type", "Codec", "Bytes",
    );
    println!("  {}", "-".repeat(94));

    for (i, layer) in layers.iter().enumerate() {
        let d = layer.description();
        let (shape, codec) = match d {
            LayerDescription::PixelBuffer(p) => {
                let codec = match (&p.normalizer, &p.denormalizer) {
                    (Some(n), _) => format!("{} {n:?}", p.format),
                    (_, Some(dn)) => format!("{} {dn:?}", p.format),
                    _ => format!("{} raw", p.format),
                };
                (p.volume.to_string(), codec)
            }
            LayerDescription::Vector(v) => {
                let codec = match (&v.quantizer, &v.dequantizer) {
                    (Some(q), _) => format!("{q:?}"),
                    (_, Some(dq)) => format!("{dq:?}"),
                    _ => "-".to_string(),
                };
                (v.shape.to_string(), codec)
            }
        };
        println!(
            "  {:<4} {:<24} {:<8} {:<16} {:<4} {:<22} {:>10}",
            i,
            super::truncate(layer.name(), 24),
            d.kind_name(),
            shape,
            d.dtype().to_string(),
            super::truncate(&codec, 22),
            d.byte_len(),
        );
    }
    println!();
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

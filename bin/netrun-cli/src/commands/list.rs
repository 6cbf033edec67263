// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `netrun list` command: discover the bundles in a directory.

use super::truncate;
use model_bundle::BundleManager;
use std::path::PathBuf;

pub async fn execute(dir: PathBuf) -> anyhow::Result<()> {
    super::banner("Bundle Library");

    let manager = BundleManager::load(&dir)
        .map_err(|e| anyhow::anyhow!("failed to scan '{}': {e}", dir.display()))?;

    println!("  Directory: {}", manager.root().display());
    println!("  Bundles:   {}", manager.len());
    println!();

    if manager.is_empty() {
        println!("  No valid bundles found (run `netrun validate` for details).");
        println!();
        return Ok(());
    }

    println!(
        "  {:<24} {:<28} {:>7} {:>4} {:>4}  {}",
        "Id", "Name", "Version", "In", "Out", "Flags",
    );
    println!("  {}", "-".repeat(80));

    for bundle in manager.iter() {
        let mut flags = Vec::new();
        if bundle.is_quantized() {
            flags.push("quantized");
        }
        if bundle.is_placeholder() {
            flags.push("placeholder");
        }
        if bundle.options().prefers_front_camera() {
            flags.push("front-camera");
        }
        println!(
            "  {:<24} {:<28} {:>7} {:>4} {:>4}  {}",
            truncate(bundle.id(), 24),
            truncate(bundle.name(), 28),
            truncate(bundle.version(), 7),
            bundle.inputs().len(),
            bundle.outputs().len(),
            flags.join(","),
        );
    }
    println!();
    Ok(())
}

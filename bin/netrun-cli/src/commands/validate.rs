// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `netrun validate` command: check bundles before shipping them.
//!
//! Each path is either a bundle directory or a directory of bundles. Ids
//! must be unique across everything validated in one invocation.

use model_bundle::{is_bundle_dir, BundleValidator};
use std::path::{Path, PathBuf};

pub async fn execute(paths: Vec<PathBuf>) -> anyhow::Result<()> {
    super::banner("Bundle Validator");

    let mut candidates = Vec::new();
    for path in &paths {
        collect(path, &mut candidates)?;
    }
    if candidates.is_empty() {
        anyhow::bail!("no bundle directories found");
    }

    let mut validator = BundleValidator::new();
    let mut failures = 0;
    for dir in &candidates {
        match validator.accept(dir) {
            Ok(bundle) => println!(
                "  ok    {:<40} {} ({} in, {} out)",
                dir.display(),
                bundle.id(),
                bundle.inputs().len(),
                bundle.outputs().len(),
            ),
            Err(e) => {
                failures += 1;
                println!("  FAIL  {:<40} {e}", dir.display());
            }
        }
    }
    println!();
    println!(
        "  {} checked, {} valid, {} invalid",
        candidates.len(),
        candidates.len() - failures,
        failures,
    );
    println!();

    if failures > 0 {
        anyhow::bail!("{failures} bundle(s) failed validation");
    }
    Ok(())
}

/// Expands `path` into bundle candidates, sorted for stable output.
fn collect(path: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    if is_bundle_dir(path) || !path.is_dir() {
        out.push(path.to_path_buf());
        return Ok(());
    }
    let mut found: Vec<PathBuf> = std::fs::read_dir(path)
        .map_err(|e| anyhow::anyhow!("cannot read '{}': {e}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_bundle_dir(p))
        .collect();
    found.sort();
    out.extend(found);
    Ok(())
}

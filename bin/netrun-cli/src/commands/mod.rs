// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the helpers they share.

pub mod inspect;
pub mod list;
pub mod run;
pub mod stream;
pub mod validate;

use model_bundle::{BundleManager, ModelBundle};
use runtime::{Device, ExecutorConfig, RuntimeConfig};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reads the config file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    match path {
        Some(p) => RuntimeConfig::from_file(p)
            .map_err(|e| anyhow::anyhow!("failed to load config '{}': {e}", p.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

/// Resolves a bundle argument: a bundle directory, or an id looked up in
/// the configured bundles directory. Falls back to `default_bundle`.
pub fn resolve_bundle(
    arg: Option<&str>,
    config: &RuntimeConfig,
) -> anyhow::Result<Arc<ModelBundle>> {
    let spec = arg
        .map(str::to_string)
        .or_else(|| config.default_bundle.clone())
        .ok_or_else(|| anyhow::anyhow!("no bundle given and no default_bundle configured"))?;

    let path = Path::new(&spec);
    if path.is_dir() {
        return ModelBundle::load(path)
            .map(Arc::new)
            .map_err(|e| anyhow::anyhow!("failed to load bundle '{}': {e}", path.display()));
    }

    let manager = BundleManager::load(&config.bundles_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to scan bundles in '{}': {e}",
            config.bundles_dir.display()
        )
    })?;
    manager.bundle_with_id(&spec).ok_or_else(|| {
        anyhow::anyhow!(
            "no bundle '{spec}' in '{}' (known: {})",
            config.bundles_dir.display(),
            manager.bundle_ids().join(", ")
        )
    })
}

/// Executor flags shared by `run` and `stream`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ExecutorArgs {
    /// Target device: cpu, gpu or nnapi.
    #[arg(short, long)]
    pub device: Option<String>,

    /// Executor threads.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Allow 16-bit float precision.
    #[arg(long)]
    pub fp16: bool,
}

impl ExecutorArgs {
    /// Applies the flags over the configured executor settings.
    pub fn apply(&self, base: &ExecutorConfig) -> anyhow::Result<ExecutorConfig> {
        let mut config = base.clone();
        if let Some(device) = &self.device {
            let device: Device = device.parse()?;
            config = config.with_device(device);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if self.fp16 {
            config = config.with_fp16(true);
        }
        Ok(config)
    }
}

/// Truncates a string with ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║{:^54}║", format!("netrun · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}

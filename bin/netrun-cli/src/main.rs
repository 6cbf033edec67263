// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # netrun
//!
//! Command-line interface for model bundles and the model runner.
//!
//! ## Usage
//! ```bash
//! # List the bundles in a directory
//! netrun list --dir ./bundles
//!
//! # Inspect one bundle's tensor layout
//! netrun inspect ./bundles/mobilenet.tfbundle
//!
//! # Validate bundles before shipping them
//! netrun validate ./bundles
//!
//! # One inference with explicit inputs
//! netrun run two-in-two-out --input input_x=1,2,3,4 --input input_y=10,20,30,40
//!
//! # Stream synthetic frames through a classifier
//! netrun -c netrun.toml stream mobilenet --frames 50 --filter low-pass
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "netrun",
    about = "Load model bundles, marshal tensors and drive a serialized model runner",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the valid bundles in a directory.
    List {
        /// Bundles directory (defaults to `bundles_dir` from the config).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show a bundle's metadata and input/output layers.
    Inspect {
        /// Bundle directory or id.
        bundle: Option<String>,

        /// Print the parsed manifest as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// Validate bundle directories (or directories of bundles).
    Validate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Run one inference.
    Run {
        /// Bundle directory or id.
        bundle: Option<String>,

        /// Vector input as NAME=V1,V2,... (repeatable).
        #[arg(short, long = "input")]
        inputs: Vec<String>,

        #[command(flatten)]
        executor: commands::ExecutorArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Stream synthetic frames and print classifications.
    Stream {
        /// Bundle directory or id.
        bundle: Option<String>,

        /// Number of frames to stream.
        #[arg(short, long)]
        frames: Option<usize>,

        /// Classifications shown per frame.
        #[arg(long)]
        top: Option<usize>,

        /// Smoothing across frames.
        #[arg(long, value_enum)]
        filter: Option<commands::stream::FilterKind>,

        #[command(flatten)]
        executor: commands::ExecutorArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;
    tracing::debug!(
        "bundles_dir={} executor=({})",
        config.bundles_dir.display(),
        config.executor.summary()
    );

    match cli.command {
        Commands::List { dir } => {
            commands::list::execute(dir.unwrap_or_else(|| config.bundles_dir.clone())).await
        }
        Commands::Inspect { bundle, json } => {
            commands::inspect::execute(bundle, config, json).await
        }
        Commands::Validate { paths } => commands::validate::execute(paths).await,
        Commands::Run {
            bundle,
            inputs,
            executor,
            json,
        } => commands::run::execute(bundle, inputs, executor, config, json).await,
        Commands::Stream {
            bundle,
            frames,
            top,
            filter,
            executor,
        } => commands::stream::execute(bundle, frames, top, filter, executor, config).await,
    }
}

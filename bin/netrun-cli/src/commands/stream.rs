// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `netrun stream` command: drive the streaming loop with synthetic frames
//! and print smoothed classifications as they arrive.

use super::ExecutorArgs;
use model_bundle::LayerValue;
use model_runner::classification::{top_n, ClassificationSmoother, LowPassFilter};
use model_runner::{FrameResult, ModelRunner, SyntheticSource};
use runtime::{RuntimeConfig, SyntheticExecutorFactory};
use std::sync::Arc;

/// Frames streamed when neither `--frames` nor `max_frames` is set.
const DEFAULT_FRAMES: usize = 20;

/// How classification scores are smoothed across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterKind {
    /// Exponential decay with a drop threshold.
    Decay,
    /// Three-stage low-pass filter.
    LowPass,
    /// Raw scores.
    None,
}

enum Filter {
    Decay(ClassificationSmoother),
    LowPass(LowPassFilter),
    None,
}

impl Filter {
    fn new(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Decay => Filter::Decay(ClassificationSmoother::default()),
            FilterKind::LowPass => Filter::LowPass(LowPassFilter::default()),
            FilterKind::None => Filter::None,
        }
    }

    fn apply(&mut self, scores: &[(String, f32)]) -> Vec<(String, f32)> {
        match self {
            Filter::Decay(s) => s.smooth(scores),
            Filter::LowPass(f) => {
                let values: Vec<f32> = scores.iter().map(|(_, v)| *v).collect();
                scores
                    .iter()
                    .map(|(l, _)| l.clone())
                    .zip(f.apply(&values))
                    .collect()
            }
            Filter::None => scores.to_vec(),
        }
    }
}

pub async fn execute(
    bundle: Option<String>,
    frames: Option<usize>,
    top: Option<usize>,
    filter: Option<FilterKind>,
    executor: ExecutorArgs,
    config: RuntimeConfig,
) -> anyhow::Result<()> {
    let bundle = super::resolve_bundle(bundle.as_deref(), &config)?;
    let exec_config = executor.apply(&config.executor)?;
    let frames = frames
        .or(config.streaming.max_frames)
        .unwrap_or(DEFAULT_FRAMES);
    let top = top.unwrap_or(config.streaming.top_n);
    let filter_kind = filter.unwrap_or(if config.streaming.smoothing {
        FilterKind::Decay
    } else {
        FilterKind::None
    });

    super::banner("Stream Classifier");
    println!("  Config:");
    println!("   Bundle:   {}", bundle.id());
    println!("   Executor: {}", exec_config.summary());
    println!("   Frames:   {frames}");
    println!("   Top:      {top}");
    println!("   Filter:   {filter_kind:?}");
    println!();

    let runner = ModelRunner::new(Arc::new(SyntheticExecutorFactory), exec_config)?;
    runner.load(Arc::clone(&bundle)).await?;

    let mut filter = Filter::new(filter_kind);
    let mut results = runner
        .start_streaming(SyntheticSource::with_limit(frames as u64))
        .await?;

    let mut received = 0usize;
    let mut total_latency = 0.0;
    while let Some(frame) = results.recv().await {
        received += 1;
        total_latency += frame.latency_ms;
        print_frame(&frame, &mut filter, top);
    }

    let status = runner.status().await?;
    runner.shutdown()?;

    println!();
    println!("  Summary:");
    println!(
        "   {received} of {frames} frames delivered ({} dropped while the consumer was busy)",
        frames.saturating_sub(received),
    );
    if received > 0 {
        println!("   Mean latency: {:.2} ms", total_latency / received as f64);
    }
    println!("   {}", status.summary());
    println!();
    Ok(())
}

fn print_frame(frame: &FrameResult, filter: &mut Filter, top: usize) {
    let labeled = frame.outputs.values().find_map(LayerValue::as_labeled);
    let detail = match labeled {
        Some(scores) => top_n(&filter.apply(scores), top)
            .into_iter()
            .map(|(label, score)| format!("{} {score:.3}", super::truncate(&label, 20)))
            .collect::<Vec<_>>()
            .join(", "),
        None => format!("{} outputs", frame.outputs.len()),
    };
    println!(
        "  #{:<5} {:>8.2} ms  {}",
        frame.request_id, frame.latency_ms, detail
    );
}

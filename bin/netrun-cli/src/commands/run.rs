// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `netrun run` command: one inference through the model runner.
//!
//! ```text
//! resolve bundle → ModelRunner::load → build inputs → run_once → outputs
//! ```
//!
//! Inputs not given with `--input` are synthesized to fit their layer.

use super::ExecutorArgs;
use model_bundle::{LayerValue, ModelBundle, NamedValues};
use model_runner::classification::top_n;
use model_runner::{DataSource, FrameResult, ModelCache, ModelRunner, SyntheticSource};
use runtime::{RuntimeConfig, SyntheticExecutorFactory};
use std::sync::Arc;

pub async fn execute(
    bundle: Option<String>,
    inputs: Vec<String>,
    executor: ExecutorArgs,
    config: RuntimeConfig,
    json: bool,
) -> anyhow::Result<()> {
    let bundle = super::resolve_bundle(bundle.as_deref(), &config)?;
    let exec_config = executor.apply(&config.executor)?;

    if !json {
        super::banner("Inference Runner");
        println!("  Config:");
        println!("   Bundle:   {} ({})", bundle.id(), bundle.path().display());
        println!("   Executor: {}", exec_config.summary());
        println!();
        println!("  [1/3] Loading model...");
    }

    let runner = ModelRunner::new(Arc::new(SyntheticExecutorFactory), exec_config)?;
    runner.load(Arc::clone(&bundle)).await?;
    let status = runner.status().await?;
    if !json {
        if let Some(reason) = &status.fallback {
            println!("        {reason}");
        }
        println!("        Running on {}.", status.active_device);
        println!();
        println!("  [2/3] Preparing inputs...");
    }

    let named = build_inputs(&bundle, &inputs)?;
    if !json {
        for layer in bundle.inputs() {
            let source = if inputs.iter().any(|i| i.starts_with(&format!("{}=", layer.name()))) {
                "given"
            } else {
                "synthetic"
            };
            println!("        {} ({source})", layer.summary());
        }
        println!();
        println!("  [3/3] Running inference...");
    }

    let result = runner.run_once(named).await?;
    runner.shutdown()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result_json(&result))?);
    } else {
        println!();
        print_outputs(&result, config.streaming.top_n);
    }
    Ok(())
}

/// Synthesizes a full frame, then overrides it with `name=v1,v2,...`
/// arguments.
fn build_inputs(bundle: &Arc<ModelBundle>, args: &[String]) -> anyhow::Result<NamedValues> {
    let cache = ModelCache::from_bundle(Arc::clone(bundle));
    let mut named = SyntheticSource::new()
        .next_frame(&cache)?
        .unwrap_or_default();

    for arg in args {
        let (name, values) = parse_input(arg)?;
        if bundle.input_named(&name).is_none() {
            anyhow::bail!(
                "bundle '{}' has no input '{name}' (inputs: {})",
                bundle.id(),
                bundle
                    .inputs()
                    .iter()
                    .map(|l| l.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        named.insert(name, LayerValue::Vector(values));
    }
    Ok(named)
}

/// Parses `name=1.0,2.5,3`.
fn parse_input(arg: &str) -> anyhow::Result<(String, Vec<f32>)> {
    let (name, list) = arg
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected NAME=V1,V2,... but got '{arg}'"))?;
    let values = list
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| anyhow::anyhow!("bad value '{v}' for '{name}': {e}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok((name.trim().to_string(), values))
}

pub(crate) fn print_outputs(result: &FrameResult, top: usize) {
    println!("  Results (request {}):", result.request_id);
    let mut names: Vec<&String> = result.outputs.keys().collect();
    names.sort();
    for name in names {
        match &result.outputs[name] {
            LayerValue::Labeled(scores) => {
                println!("   {name}: top {} of {}", top.min(scores.len()), scores.len());
                for (label, score) in top_n(scores, top) {
                    println!("     {:<32} {score:.4}", super::truncate(&label, 32));
                }
            }
            LayerValue::Vector(values) => {
                let shown: Vec<String> = values.iter().take(10).map(|v| format!("{v:.4}")).collect();
                println!(
                    "   {name}: [{}{}] ({} values)",
                    shown.join(", "),
                    if values.len() > 10 { ", ..." } else { "" },
                    values.len(),
                );
            }
            LayerValue::Image(image) => {
                println!("   {name}: image {}x{}", image.width(), image.height());
            }
        }
    }
    println!();
    println!("  Latency: {:.2} ms", result.latency_ms);
    println!();
}

pub(crate) fn result_json(result: &FrameResult) -> serde_json::Value {
    let outputs: serde_json::Map<String, serde_json::Value> = result
        .outputs
        .iter()
        .map(|(name, value)| {
            let v = match value {
                LayerValue::Vector(values) => serde_json::json!(values),
                LayerValue::Labeled(scores) => scores
                    .iter()
                    .map(|(label, score)| serde_json::json!({ "label": label, "score": score }))
                    .collect::<serde_json::Value>(),
                LayerValue::Image(image) => serde_json::json!({
                    "width": image.width(),
                    "height": image.height(),
                }),
            };
            (name.clone(), v)
        })
        .collect();
    serde_json::json!({
        "request_id": result.request_id,
        "bundle_id": result.bundle_id,
        "latency_ms": result.latency_ms,
        "outputs": outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        let (name, values) = parse_input("input_x=1, 2.5,3").unwrap();
        assert_eq!(name, "input_x");
        assert_eq!(values, vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn test_parse_input_rejects_garbage() {
        assert!(parse_input("no-equals").is_err());
        assert!(parse_input("x=1,abc").is_err());
    }

    #[test]
    fn test_result_json_shape() {
        let result = FrameResult {
            request_id: 7,
            bundle_id: "b".into(),
            outputs: NamedValues::from([("z".to_string(), LayerValue::Vector(vec![25.0]))]),
            latency_ms: 1.5,
        };
        let v = result_json(&result);
        assert_eq!(v["request_id"], 7);
        assert_eq!(v["outputs"]["z"][0], 25.0);
    }

    #[test]
    fn test_result_json_keeps_repeated_labels() {
        let scores = vec![("crane".to_string(), 0.5), ("crane".to_string(), 0.25)];
        let result = FrameResult {
            request_id: 1,
            bundle_id: "b".into(),
            outputs: NamedValues::from([("classes".to_string(), LayerValue::Labeled(scores))]),
            latency_ms: 0.5,
        };
        let v = result_json(&result);
        let classes = v["outputs"]["classes"].as_array().unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[1]["label"], "crane");
        assert_eq!(classes[1]["score"], 0.25);
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference profiling metrics.
//!
//! [`InferenceMetrics`] splits one `run` into its marshal, execute and
//! demarshal phases. The marshal share is what buffer reuse and codec
//! choice affect; the execute share belongs to the engine.

use std::time::Duration;

/// Timing for a single adapter run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct InferenceMetrics {
    /// Time spent packing inputs into executor buffers.
    pub marshal_duration: Duration,
    /// Time spent inside the executor.
    pub execute_duration: Duration,
    /// Time spent reading outputs back into values.
    pub demarshal_duration: Duration,
    /// Wall-clock time for the whole run.
    pub total_duration: Duration,
    /// Bytes written across all input buffers.
    pub input_bytes: usize,
    /// Bytes read across all output buffers.
    pub output_bytes: usize,
}

impl InferenceMetrics {
    /// Total latency in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.total_duration.as_secs_f64() * 1000.0
    }

    /// Fraction of the run spent outside the executor, in `[0.0, 1.0]`.
    pub fn overhead_ratio(&self) -> f64 {
        let total = self.total_duration.as_secs_f64();
        if total <= 0.0 {
            return 0.0;
        }
        let overhead = (self.marshal_duration + self.demarshal_duration).as_secs_f64();
        (overhead / total).min(1.0)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Inference: {:.2}ms total, {:.2}ms marshal, {:.2}ms execute, \
             {:.2}ms demarshal ({:.0}% overhead), {} B in, {} B out",
            self.latency_ms(),
            self.marshal_duration.as_secs_f64() * 1000.0,
            self.execute_duration.as_secs_f64() * 1000.0,
            self.demarshal_duration.as_secs_f64() * 1000.0,
            self.overhead_ratio() * 100.0,
            self.input_bytes,
            self.output_bytes,
        )
    }
}

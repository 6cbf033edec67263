// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-layer byte buffers reused across inference calls.
//!
//! Each input and output tensor owns one buffer. A buffer is resized only
//! when the layer's byte length differs from its current length, so the
//! steady-state path performs no allocation. [`BufferStats`] tracks how
//! often that holds.

/// Cumulative statistics about buffer reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BufferStats {
    /// Buffers handed out at their existing size.
    pub reuses: u64,
    /// Buffers that had to be resized first.
    pub reallocations: u64,
    /// Bytes currently held across all buffers.
    pub resident_bytes: usize,
}

impl BufferStats {
    /// Returns the reuse ratio as a fraction in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` if no buffers have been handed out.
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.reuses + self.reallocations;
        if total == 0 {
            return 0.0;
        }
        self.reuses as f64 / total as f64
    }

    pub fn summary(&self) -> String {
        format!(
            "Buffers: {} reuses, {} reallocations ({:.0}% reuse), {:.2} KB resident",
            self.reuses,
            self.reallocations,
            self.reuse_ratio() * 100.0,
            self.resident_bytes as f64 / 1024.0,
        )
    }
}

/// Input and output buffers for one bundle, indexed like its layers.
#[derive(Debug, Default)]
pub struct LayerBuffers {
    inputs: Vec<Vec<u8>>,
    outputs: Vec<Vec<u8>>,
    stats: BufferStats,
}

impl LayerBuffers {
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            inputs: vec![Vec::new(); num_inputs],
            outputs: vec![Vec::new(); num_outputs],
            stats: BufferStats::default(),
        }
    }

    /// Returns input buffer `index`, sized to `len` bytes.
    pub fn input(&mut self, index: usize, len: usize) -> &mut Vec<u8> {
        Self::prepare(&mut self.inputs[index], len, &mut self.stats)
    }

    /// Returns output buffer `index`, sized to `len` bytes.
    pub fn output(&mut self, index: usize, len: usize) -> &mut Vec<u8> {
        Self::prepare(&mut self.outputs[index], len, &mut self.stats)
    }

    /// Borrows all inputs immutably and all outputs mutably, as the
    /// executor needs them.
    pub fn split(&mut self) -> (&[Vec<u8>], &mut [Vec<u8>]) {
        (&self.inputs, &mut self.outputs)
    }

    pub fn output_bytes(&self, index: usize) -> &[u8] {
        &self.outputs[index]
    }

    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Drops every buffer's memory.
    pub fn release(&mut self) {
        for buf in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            *buf = Vec::new();
        }
        self.stats.resident_bytes = 0;
    }

    fn prepare<'a>(buf: &'a mut Vec<u8>, len: usize, stats: &mut BufferStats) -> &'a mut Vec<u8> {
        if buf.len() == len {
            stats.reuses += 1;
        } else {
            stats.reallocations += 1;
            stats.resident_bytes = stats.resident_bytes.saturating_sub(buf.len()) + len;
            buf.resize(len, 0);
        }
        buf
    }
}

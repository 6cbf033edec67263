// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Post-processing for streamed classification outputs.
//!
//! Consecutive camera frames produce jittery probabilities. These helpers
//! pick the strongest labels and damp frame-to-frame noise.

/// Default weight of the previous frame in [`ClassificationSmoother`].
pub const SMOOTHING_DECAY: f32 = 0.7;
/// Default minimum smoothed probability kept by [`ClassificationSmoother`].
pub const SMOOTHING_THRESHOLD: f32 = 0.02;
/// Default number of stages in [`LowPassFilter`].
pub const FILTER_STAGES: usize = 3;
/// Default per-stage factor in [`LowPassFilter`].
pub const FILTER_FACTOR: f32 = 0.4;

/// Returns the `n` highest-scoring entries, best first.
///
/// Ties keep tensor order. Repeated labels are ranked as separate entries.
pub fn top_n(scores: &[(String, f32)], n: usize) -> Vec<(String, f32)> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Exponentially decaying average over labeled scores.
///
/// `smoothed = decay * previous + (1 - decay) * current`, matched by
/// position. Entries that fall below the threshold are dropped from the
/// output and forgotten. The history resets when the label list changes,
/// as it does after a model switch.
#[derive(Debug, Clone)]
pub struct ClassificationSmoother {
    decay: f32,
    threshold: f32,
    labels: Vec<String>,
    previous: Vec<f32>,
}

impl Default for ClassificationSmoother {
    fn default() -> Self {
        Self::new(SMOOTHING_DECAY, SMOOTHING_THRESHOLD)
    }
}

impl ClassificationSmoother {
    pub fn new(decay: f32, threshold: f32) -> Self {
        Self {
            decay,
            threshold,
            labels: Vec::new(),
            previous: Vec::new(),
        }
    }

    pub fn smooth(&mut self, current: &[(String, f32)]) -> Vec<(String, f32)> {
        let same_labels = self.labels.len() == current.len()
            && self.labels.iter().zip(current).all(|(l, (c, _))| l == c);
        if !same_labels {
            self.labels = current.iter().map(|(l, _)| l.clone()).collect();
            self.previous = vec![0.0; current.len()];
        }

        let mut smoothed = Vec::new();
        for (prev, (label, curr)) in self.previous.iter_mut().zip(current) {
            let value = self.decay * *prev + (1.0 - self.decay) * curr;
            if value >= self.threshold {
                *prev = value;
                smoothed.push((label.clone(), value));
            } else {
                *prev = 0.0;
            }
        }
        smoothed
    }

    pub fn reset(&mut self) {
        self.labels.clear();
        self.previous.clear();
    }
}

/// Cascaded first-order low-pass filter over a fixed-length score vector.
///
/// The first stage tracks the input; each later stage tracks the stage
/// before it; the last stage is the output. Resets itself when the vector
/// length changes, as it does after a model switch.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    factor: f32,
    stages: Vec<Vec<f32>>,
    num_stages: usize,
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(FILTER_STAGES, FILTER_FACTOR)
    }
}

impl LowPassFilter {
    pub fn new(num_stages: usize, factor: f32) -> Self {
        Self {
            factor,
            stages: Vec::new(),
            num_stages: num_stages.max(1),
        }
    }

    /// Feeds one frame and returns the filtered scores.
    pub fn apply(&mut self, scores: &[f32]) -> Vec<f32> {
        if self.stages.first().map_or(true, |s| s.len() != scores.len()) {
            self.stages = vec![vec![0.0; scores.len()]; self.num_stages];
        }

        for (s, &x) in self.stages[0].iter_mut().zip(scores) {
            *s += self.factor * (x - *s);
        }
        for i in 1..self.num_stages {
            let (done, rest) = self.stages.split_at_mut(i);
            let prev = &done[i - 1];
            for (s, &p) in rest[0].iter_mut().zip(prev) {
                *s += self.factor * (p - *s);
            }
        }

        self.stages[self.num_stages - 1].clone()
    }
}

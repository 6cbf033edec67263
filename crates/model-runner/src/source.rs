// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Frame producers for the streaming loop.

use crate::{ModelCache, RunnerResult};
use model_bundle::{LayerDescription, LayerValue, NamedValues};
use tensor_codec::Image;

/// Supplies one frame of named inputs per streaming iteration.
///
/// Called on the runner's worker thread, so it must not block for long.
/// Returning `Ok(None)` ends the stream; returning an error skips the frame.
pub trait DataSource: Send {
    fn next_frame(&mut self, cache: &ModelCache) -> RunnerResult<Option<NamedValues>>;
}

impl<F> DataSource for F
where
    F: FnMut(&ModelCache) -> RunnerResult<Option<NamedValues>> + Send,
{
    fn next_frame(&mut self, cache: &ModelCache) -> RunnerResult<Option<NamedValues>> {
        self(cache)
    }
}

/// Generates inputs for whatever bundle is active.
///
/// Image layers receive a gradient sized to the layer; vector layers
/// receive a ramp in `[0, 1]` that shifts by one step per frame. Because it
/// sizes every frame from the cache, it keeps working across model switches.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    limit: Option<u64>,
    produced: u64,
}

impl SyntheticSource {
    /// A source that never runs out.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that ends after `frames` frames.
    pub fn with_limit(frames: u64) -> Self {
        Self {
            limit: Some(frames),
            produced: 0,
        }
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl DataSource for SyntheticSource {
    fn next_frame(&mut self, cache: &ModelCache) -> RunnerResult<Option<NamedValues>> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }
        let step = self.produced as usize;
        let frame = cache
            .bundle()
            .inputs()
            .iter()
            .map(|layer| {
                let value = match layer.description() {
                    LayerDescription::PixelBuffer(p) => {
                        LayerValue::Image(Image::gradient(p.volume.width, p.volume.height))
                    }
                    LayerDescription::Vector(v) => LayerValue::Vector(
                        (0..v.length())
                            .map(|i| ((i + step) % 256) as f32 / 255.0)
                            .collect(),
                    ),
                };
                (layer.name().to_string(), value)
            })
            .collect();
        self.produced += 1;
        Ok(Some(frame))
    }
}

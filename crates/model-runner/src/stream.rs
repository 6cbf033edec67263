// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Results delivered by the runner.

use model_bundle::{LayerValue, NamedValues};
use tokio::sync::mpsc;

/// One completed inference, single-shot or streamed.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Monotonic id assigned by the worker.
    pub request_id: u64,
    /// Bundle that produced the outputs.
    pub bundle_id: String,
    /// One entry per declared output.
    pub outputs: NamedValues,
    /// Wall-clock latency of the adapter run.
    pub latency_ms: f64,
}

impl FrameResult {
    /// The sole output of a single-output bundle.
    pub fn single(&self) -> Option<&LayerValue> {
        if self.outputs.len() == 1 {
            self.outputs.values().next()
        } else {
            None
        }
    }

    pub fn output(&self, name: &str) -> Option<&LayerValue> {
        self.outputs.get(name)
    }
}

/// Receiving end of a streaming session.
///
/// Holds at most one undelivered result; the worker drops newer frames
/// while it is full. Ends (`None`) once the stream is stopped, replaced or
/// its source runs out. Dropping it stops the stream on the next frame.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<FrameResult>,
}

impl ResultStream {
    pub(crate) fn new(rx: mpsc::Receiver<FrameResult>) -> Self {
        Self { rx }
    }

    /// Waits for the next result.
    pub async fn recv(&mut self) -> Option<FrameResult> {
        self.rx.recv().await
    }

    /// Blocking variant of [`Self::recv`]. Must not be called from within
    /// an async runtime.
    pub fn blocking_recv(&mut self) -> Option<FrameResult> {
        self.rx.blocking_recv()
    }

    /// Returns a waiting result without blocking.
    pub fn try_recv(&mut self) -> Option<FrameResult> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outputs: NamedValues) -> FrameResult {
        FrameResult {
            request_id: 1,
            bundle_id: "b".into(),
            outputs,
            latency_ms: 0.5,
        }
    }

    #[test]
    fn test_single_output() {
        let mut outputs = NamedValues::new();
        outputs.insert("z".into(), LayerValue::Vector(vec![1.0]));
        let r = result(outputs);
        assert_eq!(r.single().and_then(LayerValue::as_vector), Some(&[1.0][..]));
        assert!(r.output("z").is_some());
    }

    #[test]
    fn test_single_with_many_outputs() {
        let mut outputs = NamedValues::new();
        outputs.insert("a".into(), LayerValue::Vector(vec![1.0]));
        outputs.insert("b".into(), LayerValue::Vector(vec![2.0]));
        assert!(result(outputs).single().is_none());
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let mut stream = ResultStream::new(rx);
        tx.try_send(result(NamedValues::new())).unwrap();
        assert!(tx.try_send(result(NamedValues::new())).is_err());
        drop(tx);
        assert!(stream.recv().await.is_some());
        assert!(stream.recv().await.is_none());
    }
}

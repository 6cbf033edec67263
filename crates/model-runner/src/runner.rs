// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The model runner: one worker thread, one FIFO command queue.
//!
//! ```text
//! caller ──Command──▶ ┌──────────────┐
//! caller ──Command──▶ │ command queue│──▶ worker ──▶ TensorRuntimeAdapter
//!            ┌──────▶ └──────────────┘       │
//!            └──────── Frame { generation } ◀─┘  (self-enqueued)
//! ```
//!
//! Every operation touching the adapter or runner state is a command
//! processed on the worker, so at most one inference runs at a time and
//! reconfiguration never races a frame. The streaming loop re-enqueues a
//! `Frame` from inside its own handler; a command sent while streaming is
//! therefore processed before the next frame. Stopping or replacing the
//! stream bumps a generation counter, and frames carrying an older
//! generation are discarded when dequeued.

use crate::{
    DataSource, FrameResult, ModelCache, ResultStream, RunnerError, RunnerResult, RunnerState,
    RunnerStatus,
};
use model_bundle::{LayerValue, ModelBundle, NamedValues};
use runtime::{Device, ExecutorConfig, ExecutorFactory, TensorRuntimeAdapter};
use std::any::Any;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tokio::sync::{mpsc as result_mpsc, oneshot};

/// Undelivered results a stream may hold.
const RESULT_CAPACITY: usize = 1;

// ── Commands ───────────────────────────────────────────────────

type Reply<T> = oneshot::Sender<RunnerResult<T>>;

enum RunInput {
    Named(NamedValues),
    Single(LayerValue),
}

enum ConfigChange {
    Device(Device),
    Threads(usize),
    Fp16(bool),
}

enum Command {
    Run {
        input: RunInput,
        reply: Reply<FrameResult>,
    },
    StartStreaming {
        source: Box<dyn DataSource>,
        results: result_mpsc::Sender<FrameResult>,
        reply: Reply<()>,
    },
    StopStreaming {
        reply: Reply<()>,
    },
    Frame {
        generation: u64,
    },
    SwitchModel {
        bundle: Arc<ModelBundle>,
        config: Option<ExecutorConfig>,
        reply: Reply<()>,
    },
    Configure {
        change: ConfigChange,
        reply: Reply<bool>,
    },
    Status {
        reply: oneshot::Sender<RunnerStatus>,
    },
    Reset {
        reply: Reply<()>,
    },
    Shutdown,
}

// ── Public handle ──────────────────────────────────────────────

/// Serializes inference, streaming and reconfiguration against one
/// executor.
///
/// Async methods submit a command and await its acknowledgement; they may
/// be called from any task. Dropping the runner stops the worker after the
/// commands already queued.
pub struct ModelRunner {
    sender: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl ModelRunner {
    /// Starts an idle runner. Load a model with [`Self::switch_model`] or
    /// [`Self::load`].
    pub fn new(factory: Arc<dyn ExecutorFactory>, config: ExecutorConfig) -> RunnerResult<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = Worker {
            factory,
            config,
            adapter: None,
            cache: None,
            state: RunnerState::Idle,
            stream: None,
            generation: 0,
            next_request_id: 0,
            queue: sender.clone(),
        };

        let handle = thread::Builder::new()
            .name("model-runner-worker".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// Loads `bundle` with the runner's current executor configuration.
    pub async fn load(&self, bundle: Arc<ModelBundle>) -> RunnerResult<()> {
        self.request(|reply| Command::SwitchModel {
            bundle,
            config: None,
            reply,
        })
        .await?
    }

    /// Replaces the active model and executor configuration.
    ///
    /// Streaming resumes with the new model if it was active. On failure
    /// the previous model is reloaded when possible, otherwise the runner
    /// becomes idle; the error is returned either way.
    pub async fn switch_model(
        &self,
        bundle: Arc<ModelBundle>,
        config: ExecutorConfig,
    ) -> RunnerResult<()> {
        self.request(|reply| Command::SwitchModel {
            bundle,
            config: Some(config),
            reply,
        })
        .await?
    }

    /// Runs one inference over named inputs.
    pub async fn run_once(&self, inputs: NamedValues) -> RunnerResult<FrameResult> {
        self.request(|reply| Command::Run {
            input: RunInput::Named(inputs),
            reply,
        })
        .await?
    }

    /// Runs one inference on a single-input, single-output model.
    pub async fn run_single(&self, value: LayerValue) -> RunnerResult<FrameResult> {
        self.request(|reply| Command::Run {
            input: RunInput::Single(value),
            reply,
        })
        .await?
    }

    /// Blocking variant of [`Self::run_once`] for callers outside an async
    /// runtime.
    pub fn run_once_blocking(&self, inputs: NamedValues) -> RunnerResult<FrameResult> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Run {
            input: RunInput::Named(inputs),
            reply,
        })?;
        rx.blocking_recv()
            .map_err(|_| RunnerError::Channel("worker dropped the reply".into()))?
    }

    /// Starts the capture loop, replacing any stream already running.
    ///
    /// Frame failures are logged and skipped. The stream ends when stopped,
    /// when the source returns `None`, or when the returned
    /// [`ResultStream`] is dropped.
    pub async fn start_streaming(
        &self,
        source: impl DataSource + 'static,
    ) -> RunnerResult<ResultStream> {
        let (results, rx) = result_mpsc::channel(RESULT_CAPACITY);
        self.request(|reply| Command::StartStreaming {
            source: Box::new(source),
            results,
            reply,
        })
        .await??;
        Ok(ResultStream::new(rx))
    }

    /// Stops the capture loop. A frame already running completes first.
    pub async fn stop_streaming(&self) -> RunnerResult<()> {
        self.request(|reply| Command::StopStreaming { reply }).await?
    }

    /// Returns whether the configuration changed.
    pub async fn set_device(&self, device: Device) -> RunnerResult<bool> {
        self.configure(ConfigChange::Device(device)).await
    }

    pub async fn set_threads(&self, threads: usize) -> RunnerResult<bool> {
        self.configure(ConfigChange::Threads(threads)).await
    }

    pub async fn set_precision(&self, use_fp16: bool) -> RunnerResult<bool> {
        self.configure(ConfigChange::Fp16(use_fp16)).await
    }

    pub async fn status(&self) -> RunnerResult<RunnerStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Rebuilds the executor of the current model.
    pub async fn reset(&self) -> RunnerResult<()> {
        self.request(|reply| Command::Reset { reply }).await?
    }

    /// Stops the worker after the commands already queued and waits for it.
    pub fn shutdown(mut self) -> RunnerResult<()> {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(Command::Shutdown);
            handle
                .join()
                .map_err(|e| RunnerError::Join(format_join_error(e)))?;
        }
        Ok(())
    }

    async fn configure(&self, change: ConfigChange) -> RunnerResult<bool> {
        self.request(|reply| Command::Configure { change, reply })
            .await?
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> RunnerResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await
            .map_err(|_| RunnerError::Channel("worker dropped the reply".into()))
    }

    fn send(&self, command: Command) -> RunnerResult<()> {
        self.sender
            .send(command)
            .map_err(|e| RunnerError::Channel(e.to_string()))
    }
}

impl Drop for ModelRunner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(Command::Shutdown);
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for ModelRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRunner")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

fn format_join_error(err: Box<dyn Any + Send + 'static>) -> String {
    if let Some(msg) = err.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Worker ─────────────────────────────────────────────────────

struct ActiveStream {
    source: Box<dyn DataSource>,
    results: result_mpsc::Sender<FrameResult>,
    generation: u64,
    frames: u64,
}

struct Worker {
    factory: Arc<dyn ExecutorFactory>,
    config: ExecutorConfig,
    adapter: Option<TensorRuntimeAdapter>,
    cache: Option<ModelCache>,
    state: RunnerState,
    stream: Option<ActiveStream>,
    generation: u64,
    next_request_id: u64,
    /// Sender side of the worker's own queue, used to chain frames.
    queue: Sender<Command>,
}

impl Worker {
    fn run(mut self, receiver: Receiver<Command>) {
        tracing::debug!("runner worker started");
        while let Ok(command) = receiver.recv() {
            match command {
                Command::Run { input, reply } => {
                    let _ = reply.send(self.run_once(input));
                }
                Command::StartStreaming {
                    source,
                    results,
                    reply,
                } => {
                    let _ = reply.send(self.start_streaming(source, results));
                }
                Command::StopStreaming { reply } => {
                    self.stop_streaming("stopped");
                    let _ = reply.send(Ok(()));
                }
                Command::Frame { generation } => self.on_frame(generation),
                Command::SwitchModel {
                    bundle,
                    config,
                    reply,
                } => {
                    let config = config.unwrap_or_else(|| self.config.clone());
                    let _ = reply.send(self.switch_model(bundle, config));
                }
                Command::Configure { change, reply } => {
                    let _ = reply.send(self.configure(change));
                }
                Command::Status { reply } => {
                    let _ = reply.send(self.status());
                }
                Command::Reset { reply } => {
                    let _ = reply.send(self.reset());
                }
                Command::Shutdown => break,
            }
        }

        self.stream = None;
        if let Some(mut adapter) = self.adapter.take() {
            if let Err(e) = adapter.unload() {
                tracing::warn!("unloading on shutdown: {e}");
            }
        }
        tracing::debug!("runner worker stopped");
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn run_once(&mut self, input: RunInput) -> RunnerResult<FrameResult> {
        let request_id = self.next_request_id();
        let adapter = self.adapter.as_mut().ok_or(RunnerError::NoModel)?;
        let start = Instant::now();
        let outputs = match input {
            RunInput::Named(inputs) => adapter.run(&inputs)?,
            RunInput::Single(value) => {
                let output = adapter.run_single(value)?;
                let name = adapter
                    .bundle()
                    .output(0)
                    .map(|o| o.name().to_string())
                    .unwrap_or_default();
                NamedValues::from([(name, output)])
            }
        };
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!("request {request_id}: {latency_ms:.2}ms");
        Ok(FrameResult {
            request_id,
            bundle_id: adapter.bundle().id().to_string(),
            outputs,
            latency_ms,
        })
    }

    // ── Streaming ──────────────────────────────────────────────

    fn start_streaming(
        &mut self,
        source: Box<dyn DataSource>,
        results: result_mpsc::Sender<FrameResult>,
    ) -> RunnerResult<()> {
        if self.adapter.is_none() {
            return Err(RunnerError::NoModel);
        }
        if self.stream.is_some() {
            self.stop_streaming("replaced");
        }

        self.generation += 1;
        self.stream = Some(ActiveStream {
            source,
            results,
            generation: self.generation,
            frames: 0,
        });
        self.state = RunnerState::Streaming;
        tracing::info!("streaming started (generation {})", self.generation);
        self.enqueue_frame(self.generation);
        Ok(())
    }

    fn stop_streaming(&mut self, reason: &str) {
        if let Some(stream) = self.stream.take() {
            self.generation += 1;
            tracing::info!("streaming {reason} after {} frames", stream.frames);
        }
        if self.state == RunnerState::Streaming {
            self.state = RunnerState::Ready;
        }
    }

    fn enqueue_frame(&self, generation: u64) {
        if self.queue.send(Command::Frame { generation }).is_err() {
            tracing::warn!("runner queue closed; frame {generation} not scheduled");
        }
    }

    fn on_frame(&mut self, generation: u64) {
        let (Some(stream), Some(adapter), Some(cache)) =
            (self.stream.as_mut(), self.adapter.as_mut(), self.cache.as_ref())
        else {
            return;
        };
        if stream.generation != generation {
            tracing::trace!("discarding stale frame (generation {generation})");
            return;
        }
        if stream.results.is_closed() {
            self.stop_streaming("abandoned by receiver");
            return;
        }

        let inputs = match stream.source.next_frame(cache) {
            Ok(Some(inputs)) => Some(inputs),
            Ok(None) => {
                self.stop_streaming("ended by source");
                return;
            }
            Err(e) => {
                tracing::warn!("skipping frame: {e}");
                None
            }
        };

        if let Some(inputs) = inputs {
            self.next_request_id += 1;
            let request_id = self.next_request_id;
            let start = Instant::now();
            match adapter.run(&inputs) {
                Ok(outputs) => {
                    stream.frames += 1;
                    let result = FrameResult {
                        request_id,
                        bundle_id: cache.bundle_id().to_string(),
                        outputs,
                        latency_ms: start.elapsed().as_secs_f64() * 1000.0,
                    };
                    tracing::debug!("frame {request_id}: {:.2}ms", result.latency_ms);
                    match stream.results.try_send(result) {
                        Ok(()) => {}
                        Err(result_mpsc::error::TrySendError::Full(_)) => {
                            tracing::warn!("result stream full; dropping frame {request_id}");
                        }
                        Err(result_mpsc::error::TrySendError::Closed(_)) => {
                            self.stop_streaming("abandoned by receiver");
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!("frame {request_id} failed: {e}"),
            }
        }

        self.enqueue_frame(generation);
    }

    // ── Reconfiguration ────────────────────────────────────────

    fn switch_model(&mut self, bundle: Arc<ModelBundle>, config: ExecutorConfig) -> RunnerResult<()> {
        let resume = self.state;
        let previous = self
            .adapter
            .as_ref()
            .map(|a| (Arc::clone(a.bundle()), self.config.clone()));
        self.state = RunnerState::Switching;
        tracing::info!("switching to '{}' ({})", bundle.id(), config.summary());

        if let Some(mut old) = self.adapter.take() {
            if let Err(e) = old.unload() {
                tracing::warn!("unloading '{}': {e}", old.bundle().id());
            }
        }

        match self.install(Arc::clone(&bundle), config) {
            Ok(()) => {
                self.settle(resume);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("switch to '{}' failed: {e}", bundle.id());
                match previous {
                    Some((old_bundle, old_config)) => {
                        match self.install(Arc::clone(&old_bundle), old_config) {
                            Ok(()) => {
                                tracing::info!("restored '{}'", old_bundle.id());
                                self.settle(resume);
                            }
                            Err(restore) => {
                                tracing::warn!("restoring '{}' failed: {restore}", old_bundle.id());
                                self.go_idle();
                            }
                        }
                    }
                    None => self.go_idle(),
                }
                Err(e)
            }
        }
    }

    /// Builds and loads an adapter for `bundle`, refreshing the cache.
    fn install(&mut self, bundle: Arc<ModelBundle>, config: ExecutorConfig) -> RunnerResult<()> {
        let mut adapter =
            TensorRuntimeAdapter::new(Arc::clone(&bundle), Arc::clone(&self.factory), config.clone());
        adapter.load()?;
        self.cache = Some(ModelCache::from_bundle(bundle));
        self.adapter = Some(adapter);
        self.config = config;
        Ok(())
    }

    /// Leaves `Switching` for the state it interrupted. An active stream
    /// moves to a new generation so frames queued for the old model are
    /// discarded.
    fn settle(&mut self, resume: RunnerState) {
        match (self.stream.as_mut(), resume) {
            (Some(stream), RunnerState::Streaming) => {
                self.generation += 1;
                stream.generation = self.generation;
                self.state = RunnerState::Streaming;
                self.enqueue_frame(self.generation);
            }
            _ => self.state = RunnerState::Ready,
        }
    }

    fn go_idle(&mut self) {
        self.stop_streaming("dropped: no model");
        self.adapter = None;
        self.cache = None;
        self.state = RunnerState::Idle;
    }

    fn configure(&mut self, change: ConfigChange) -> RunnerResult<bool> {
        let next = match change {
            ConfigChange::Device(d) => self.config.clone().with_device(d),
            ConfigChange::Threads(n) => self.config.clone().with_threads(n),
            ConfigChange::Fp16(b) => self.config.clone().with_fp16(b),
        };
        if next == self.config {
            return Ok(false);
        }

        let Some(adapter) = self.adapter.as_mut() else {
            self.config = next;
            return Ok(true);
        };
        let resume = self.state;
        self.state = RunnerState::Switching;
        let applied = adapter.apply_config(next.clone());
        self.state = resume;
        // The adapter keeps the new config even when the rebuild fails.
        self.config = next;
        applied?;
        tracing::info!("executor reconfigured ({})", self.config.summary());
        Ok(true)
    }

    fn reset(&mut self) -> RunnerResult<()> {
        let adapter = self.adapter.as_mut().ok_or(RunnerError::NoModel)?;
        adapter.recreate_executor()?;
        Ok(())
    }

    fn status(&self) -> RunnerStatus {
        RunnerStatus {
            state: self.state,
            bundle_id: self.cache.as_ref().map(|c| c.bundle_id().to_string()),
            requested_device: self.config.device,
            active_device: self
                .adapter
                .as_ref()
                .map_or(self.config.device, TensorRuntimeAdapter::active_device),
            fallback: self
                .adapter
                .as_ref()
                .and_then(|a| a.fallback_reason())
                .map(ToString::to_string),
            num_threads: self.config.num_threads,
            use_fp16: self.config.use_fp16,
            label_count: self
                .cache
                .as_ref()
                .and_then(ModelCache::labels)
                .map_or(0, <[String]>::len),
            input_volume: self.cache.as_ref().and_then(ModelCache::input_volume),
            frames_streamed: self.stream.as_ref().map_or(0, |s| s.frames),
        }
    }
}

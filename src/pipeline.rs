//! Pipeline context and configuration.
//!
//! A [`Pipeline`] is the shared context behind every [`Stream`] built from it:
//! it fixes the hand-off channel capacity and tracks every task spawned on
//! behalf of its stages, so a caller can wait for them all to exit.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::task::task_tracker::TrackedFuture;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::stream::Stream;

/// Configuration for pipeline execution
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Capacity of every hand-off channel between stages
    pub buffer_size: usize,
    /// Name attached to the tracing span of every task
    pub name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            name: "pipeline".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Channel capacity actually used; tokio channels need at least one slot.
    pub fn capacity(&self) -> usize {
        self.buffer_size.max(1)
    }
}

/// Shared context for a family of streams.
///
/// Cloning is cheap; clones share the same task tracker.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    tracker: TaskTracker,
}

impl Pipeline {
    /// Create a pipeline with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline from an existing configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            tracker: TaskTracker::new(),
        }
    }

    /// Set the hand-off channel capacity
    pub fn buffer_size(mut self, size: usize) -> Self {
        Arc::make_mut(&mut self.config).buffer_size = size;
        self
    }

    /// Set the name used in tracing spans
    pub fn name(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).name = name.into();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of tasks spawned through this pipeline that are still running.
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task spawned through this pipeline has exited.
    ///
    /// Call this once the pipeline is fully built. Tasks only exit when their
    /// input is exhausted, their output is dropped, or cancellation fires, so
    /// this never returns for a pipeline that is none of those.
    pub async fn join(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Open a fresh hand-off channel whose receiving end belongs to this pipeline.
    pub(crate) fn open<T>(&self) -> (mpsc::Sender<T>, Stream<T>) {
        let (tx, rx) = mpsc::channel(self.config.capacity());
        (tx, Stream::new(rx, self.clone()))
    }

    /// Count `task` as live in this pipeline until it completes, for tasks
    /// spawned somewhere other than [`spawn`](Self::spawn).
    pub(crate) fn track<F: Future>(&self, task: F) -> TrackedFuture<F> {
        self.tracker.track_future(task)
    }

    /// Spawn a tracked task inside a span naming this pipeline and the stage kind.
    pub(crate) fn spawn<F>(&self, kind: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = tracing::debug_span!("stage", pipeline = %self.config.name, kind);
        self.tracker.spawn(task.instrument(span));
    }
}

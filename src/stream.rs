//! The [`Stream`] handle and its staging operations.
//!
//! A `Stream` is the receiving end of one hand-off channel. Its producer is a
//! single task (a source, a stage, or a fan-in) and the stream closes when
//! that task ends. Every staging call consumes the stream, spawns the task
//! that reads from it and returns the new downstream stream immediately.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::group::Group;
use crate::pipeline::Pipeline;
use crate::stage::{self, Filter, Map};
use crate::util::{recv_or_cancel, Recv};

/// A single-producer stream of values flowing between stages.
pub struct Stream<T> {
    // Shared only between the competing workers of one fan-out.
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
    pipeline: Pipeline,
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("pipeline", &self.pipeline.config().name)
            .finish_non_exhaustive()
    }
}

impl<T> Stream<T> {
    pub(crate) fn new(rx: mpsc::Receiver<T>, pipeline: Pipeline) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
            pipeline,
        }
    }

    /// Another handle on the same receiver, for competing consumers.
    pub(crate) fn share(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
            pipeline: self.pipeline.clone(),
        }
    }

    /// The pipeline this stream belongs to.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Take the next value, waiting for the receiver if a competing worker
    /// holds it. Both waits yield to cancellation.
    pub(crate) async fn next_item(&self, cancel: &CancellationToken) -> Recv<T> {
        let mut rx = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Recv::Cancelled,
            rx = self.rx.lock() => rx,
        };
        recv_or_cancel(&mut rx, cancel).await
    }

    /// Receive one value. Returns `None` once the stream is closed or
    /// `cancel` has fired.
    pub async fn recv(&mut self, cancel: &CancellationToken) -> Option<T> {
        match self.next_item(cancel).await {
            Recv::Item(item) => Some(item),
            Recv::Closed | Recv::Cancelled => None,
        }
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Stream the items of an iterator from a fresh default [`Pipeline`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn iter<I>(cancel: &CancellationToken, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Pipeline::new().iter(cancel, items)
    }

    /// Apply `f` to every value in arrival order.
    pub fn pipe<U, F>(self, cancel: &CancellationToken, f: F) -> Stream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        stage::spawn(self, Arc::new(Map(f)), cancel, "pipe")
    }

    /// Keep only the values for which `predicate` holds, in arrival order.
    pub fn filter<F>(self, cancel: &CancellationToken, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        stage::spawn(self, Arc::new(Filter(predicate)), cancel, "filter")
    }

    /// Spread this stream over `workers` competing stages, each applying `f`.
    ///
    /// Every value goes to exactly one worker, whichever is ready first.
    /// With zero workers the input is dropped, which releases its producer.
    pub fn fan_out<U, F>(self, cancel: &CancellationToken, workers: usize, f: F) -> Group<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let pipeline = self.pipeline.clone();
        let step = Arc::new(Map(f));
        let streams = (0..workers)
            .map(|_| stage::spawn(self.share(), Arc::clone(&step), cancel, "worker"))
            .collect();
        if workers == 0 {
            tracing::debug!(pipeline = %pipeline.config().name, "fan-out with no workers, dropping input");
        }
        Group::new(streams, pipeline)
    }

    /// [`fan_out`](Self::fan_out) followed by [`Group::fan_in`].
    pub fn fan<U, F>(self, cancel: &CancellationToken, workers: usize, f: F) -> Stream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.fan_out(cancel, workers, f).fan_in(cancel)
    }

    /// Adapt into a [`futures::Stream`] that ends when this stream closes.
    pub fn into_stream(self) -> impl futures::Stream<Item = T> + Send {
        futures::stream::unfold(self.rx, |rx| async move {
            let item = rx.lock().await.recv().await;
            item.map(|item| (item, rx))
        })
    }
}

//! Stream sources: the producers at the head of a pipeline.
//!
//! Every source is driven by one tracked producer task that hands values
//! off into a fresh [`Stream`]. The task stops when the source is exhausted
//! or fails, when the stream is dropped, or when cancellation fires.

mod feeder;

pub use feeder::Feeder;

use async_trait::async_trait;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::stream::Stream;
use crate::traits::Source;
use crate::util::{send_or_cancel, Exit, Sent};

impl Pipeline {
    /// Feed a stream from `source`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn source<S>(&self, cancel: &CancellationToken, source: S) -> Stream<S::Item>
    where
        S: Source + Send + 'static,
    {
        let (tx, stream) = self.open();
        self.spawn("source", drive(source, tx, cancel.clone()));
        stream
    }

    /// Feed a stream from the items of an iterator.
    pub fn iter<I>(&self, cancel: &CancellationToken, items: I) -> Stream<I::Item>
    where
        I: IntoIterator,
        I::Item: Send + 'static,
        I::IntoIter: Send + 'static,
    {
        self.source(cancel, IterSource(items.into_iter()))
    }

    /// Feed a stream from a [`futures::Stream`].
    pub fn from_stream<S>(&self, cancel: &CancellationToken, stream: S) -> Stream<S::Item>
    where
        S: futures::Stream + Send + 'static,
        S::Item: Send + 'static,
    {
        self.source(cancel, StreamSource(Box::pin(stream)))
    }

    /// A stream fed by hand through the returned [`Feeder`].
    ///
    /// The stream closes once every clone of the feeder is dropped.
    pub fn channel<T>(&self) -> (Feeder<T>, Stream<T>) {
        let (tx, stream) = self.open();
        (Feeder::new(tx), stream)
    }
}

async fn drive<S>(mut source: S, tx: mpsc::Sender<S::Item>, cancel: CancellationToken)
where
    S: Source + Send,
{
    let mut emitted = 0usize;
    let exit = loop {
        let produced = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Exit::Cancelled,
            produced = source.produce() => produced,
        };
        let item = match produced {
            Ok(Some(item)) => item,
            Ok(None) => break Exit::Exhausted,
            Err(err) => {
                tracing::error!(%err, emitted, "source failed, closing stream");
                break Exit::Failed;
            }
        };
        match send_or_cancel(&tx, item, &cancel).await {
            Sent::Delivered => emitted += 1,
            Sent::Closed => break Exit::DownstreamClosed,
            Sent::Cancelled => break Exit::Cancelled,
        }
    };
    tracing::debug!(emitted, reason = %exit, "source stopped");
}

/// Adapts any iterator into a source.
pub struct IterSource<I>(pub I);

#[async_trait]
impl<I> Source for IterSource<I>
where
    I: Iterator + Send,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.0.next())
    }
}

/// Adapts a boxed [`futures::Stream`] into a source.
pub struct StreamSource<S>(pub Pin<Box<S>>);

#[async_trait]
impl<S> Source for StreamSource<S>
where
    S: futures::Stream + Send,
    S::Item: Send + 'static,
{
    type Item = S::Item;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.0.next().await)
    }
}

/// A source that generates numbers from a range
pub struct RangeSource {
    range: Range<i64>,
}

impl RangeSource {
    pub fn new(range: Range<i64>) -> Self {
        Self { range }
    }
}

#[async_trait]
impl Source for RangeSource {
    type Item = i64;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.range.next())
    }
}

/// A source that yields the items of a vector in order
pub struct VecSource<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    /// Number of items not yet produced
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.len() == 0
    }
}

#[async_trait]
impl<T: Send + 'static> Source for VecSource<T> {
    type Item = T;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.items.next())
    }
}

/// A source that repeats a single value, forever or a fixed number of times
pub struct RepeatSource<T> {
    value: T,
    remaining: Option<usize>,
}

impl<T: Clone> RepeatSource<T> {
    /// Repeat a value indefinitely
    pub fn new(value: T) -> Self {
        Self {
            value,
            remaining: None,
        }
    }

    /// Repeat a value `count` times
    pub fn times(value: T, count: usize) -> Self {
        Self {
            value,
            remaining: Some(count),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Source for RepeatSource<T> {
    type Item = T;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        Ok(Some(self.value.clone()))
    }
}

/// A source that spaces out the items of another source
pub struct IntervalSource<S> {
    inner: S,
    interval: Duration,
    last_produced: Option<Instant>,
}

impl<S> IntervalSource<S> {
    pub fn new(inner: S, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last_produced: None,
        }
    }
}

#[async_trait]
impl<S: Source + Send> Source for IntervalSource<S> {
    type Item = S::Item;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        if let Some(last) = self.last_produced {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                sleep(self.interval - elapsed).await;
            }
        }

        let result = self.inner.produce().await;
        self.last_produced = Some(Instant::now());
        result
    }
}

/// Build a source from an async closure
pub fn from_fn<F, Fut, T>(f: F) -> FnSource<F, Fut, T>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Option<T>>> + Send,
    T: Send + 'static,
{
    FnSource {
        f,
        _phantom: std::marker::PhantomData,
    }
}

/// A source created from a function, see [`from_fn`]
pub struct FnSource<F, Fut, T> {
    f: F,
    _phantom: std::marker::PhantomData<fn() -> (Fut, T)>,
}

#[async_trait]
impl<F, Fut, T> Source for FnSource<F, Fut, T>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Option<T>>> + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        (self.f)().await
    }
}

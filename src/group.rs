//! Sets of sibling streams and the fan-in that merges them.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::pipeline::Pipeline;
use crate::stage::{self, Filter, Forward, Map};
use crate::stream::Stream;

/// An ordered set of streams, usually the workers of one fan-out.
///
/// Group-level `pipe` and `filter` wrap every member independently and keep
/// positions: element `i` of the result reads from element `i` of the input.
#[derive(Debug)]
pub struct Group<T> {
    streams: Vec<Stream<T>>,
    pipeline: Pipeline,
}

impl<T> Group<T> {
    pub(crate) fn new(streams: Vec<Stream<T>>, pipeline: Pipeline) -> Self {
        Self { streams, pipeline }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn into_streams(self) -> Vec<Stream<T>> {
        self.streams
    }
}

impl<T: Send + 'static> Group<T> {
    /// Apply `f` to every member stream.
    pub fn pipe<U, F>(self, cancel: &CancellationToken, f: F) -> Group<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let step = Arc::new(Map(f));
        let streams = self
            .streams
            .into_iter()
            .map(|stream| stage::spawn(stream, Arc::clone(&step), cancel, "pipe"))
            .collect();
        Group::new(streams, self.pipeline)
    }

    /// Filter every member stream with `predicate`.
    pub fn filter<F>(self, cancel: &CancellationToken, predicate: F) -> Group<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let step = Arc::new(Filter(predicate));
        let streams = self
            .streams
            .into_iter()
            .map(|stream| stage::spawn(stream, Arc::clone(&step), cancel, "filter"))
            .collect();
        Group::new(streams, self.pipeline)
    }

    /// Merge every member into one stream.
    ///
    /// One forwarder task per member copies values into the merged output.
    /// A closing task joins all forwarders and only then releases the last
    /// sender, so the merged stream closes after every member has closed or
    /// every forwarder has stopped on cancellation.
    pub fn fan_in(self, cancel: &CancellationToken) -> Stream<T> {
        let (tx, merged) = self.pipeline.open();
        let name = self.pipeline.config().name.clone();

        let mut forwarders = JoinSet::new();
        for (index, stream) in self.streams.into_iter().enumerate() {
            let span = tracing::debug_span!("stage", pipeline = %name, kind = "forward", index);
            let task = stage::run(stream, Arc::new(Forward), tx.clone(), cancel.clone(), "forward");
            forwarders.spawn(self.pipeline.track(task.instrument(span)));
        }

        self.pipeline.spawn("fan_in", async move {
            while let Some(joined) = forwarders.join_next().await {
                if let Err(err) = joined {
                    tracing::warn!(%err, "fan-in forwarder failed");
                }
            }
            drop(tx);
            tracing::debug!("all forwarders joined, closing merged stream");
        });

        merged
    }
}

impl<T> IntoIterator for Group<T> {
    type Item = Stream<T>;
    type IntoIter = std::vec::IntoIter<Stream<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.streams.into_iter()
    }
}

/// Group independent streams, e.g. to fan them in.
///
/// The group adopts the pipeline of its first stream. Tasks started from the
/// group, such as a fan-in, are tracked by that pipeline only, so `join` on
/// the pipelines of the other members does not wait for them.
impl<T> FromIterator<Stream<T>> for Group<T> {
    fn from_iter<I: IntoIterator<Item = Stream<T>>>(iter: I) -> Self {
        let streams: Vec<_> = iter.into_iter().collect();
        let pipeline = streams
            .first()
            .map(|stream| stream.pipeline().clone())
            .unwrap_or_default();
        Group::new(streams, pipeline)
    }
}

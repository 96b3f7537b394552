//! The stage loop shared by pipe, filter, fan-out workers and fan-in forwarders.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::stream::Stream;
use crate::util::{send_or_cancel, Exit, Recv, Sent};

/// What a stage does with each value it reads.
pub(crate) trait Step<T>: Send + Sync + 'static {
    type Output: Send + 'static;

    /// `None` discards the value.
    fn apply(&self, item: T) -> Option<Self::Output>;
}

pub(crate) struct Map<F>(pub F);

impl<T, U, F> Step<T> for Map<F>
where
    F: Fn(T) -> U + Send + Sync + 'static,
    U: Send + 'static,
{
    type Output = U;

    fn apply(&self, item: T) -> Option<U> {
        Some((self.0)(item))
    }
}

pub(crate) struct Filter<F>(pub F);

impl<T, F> Step<T> for Filter<F>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn apply(&self, item: T) -> Option<T> {
        (self.0)(&item).then_some(item)
    }
}

/// Pass-through used by fan-in forwarders.
pub(crate) struct Forward;

impl<T: Send + 'static> Step<T> for Forward {
    type Output = T;

    fn apply(&self, item: T) -> Option<T> {
        Some(item)
    }
}

/// Start one task running `step` over `input`, returning its output stream.
pub(crate) fn spawn<T, S>(
    input: Stream<T>,
    step: Arc<S>,
    cancel: &CancellationToken,
    kind: &'static str,
) -> Stream<S::Output>
where
    T: Send + 'static,
    S: Step<T>,
{
    let pipeline = input.pipeline().clone();
    let (tx, output) = pipeline.open();
    pipeline.spawn(kind, run(input, step, tx, cancel.clone(), kind));
    output
}

/// Read, apply, send until the input closes, the output is dropped, or
/// `cancel` fires. Dropping `tx` on return closes the output stream.
pub(crate) async fn run<T, S>(
    input: Stream<T>,
    step: Arc<S>,
    tx: mpsc::Sender<S::Output>,
    cancel: CancellationToken,
    kind: &'static str,
) where
    S: Step<T>,
{
    let mut emitted = 0usize;
    let exit = loop {
        let item = match input.next_item(&cancel).await {
            Recv::Item(item) => item,
            Recv::Closed => break Exit::Exhausted,
            Recv::Cancelled => break Exit::Cancelled,
        };
        let Some(output) = step.apply(item) else {
            continue;
        };
        match send_or_cancel(&tx, output, &cancel).await {
            Sent::Delivered => {
                emitted += 1;
                #[cfg(feature = "metrics")]
                crate::metrics::record_emitted(kind);
            }
            Sent::Closed => break Exit::DownstreamClosed,
            Sent::Cancelled => {
                #[cfg(feature = "metrics")]
                crate::metrics::record_dropped(kind);
                break Exit::Cancelled;
            }
        }
    };
    tracing::debug!(kind, emitted, reason = %exit, "stage stopped");
}

//! Cancellation-aware channel operations.
//!
//! Every suspension point in the crate goes through one of these helpers, so
//! a fired [`CancellationToken`] is always observed before any progress is
//! attempted.

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outcome of a receive raced against cancellation.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Recv<T> {
    Item(T),
    Closed,
    Cancelled,
}

/// Outcome of a send raced against cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sent {
    Delivered,
    /// The receiving stream was dropped
    Closed,
    Cancelled,
}

/// Why a task stopped, used in exit logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    Exhausted,
    Cancelled,
    DownstreamClosed,
    Failed,
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Exhausted => write!(f, "exhausted"),
            Exit::Cancelled => write!(f, "cancelled"),
            Exit::DownstreamClosed => write!(f, "downstream closed"),
            Exit::Failed => write!(f, "failed"),
        }
    }
}

pub(crate) async fn recv_or_cancel<T>(
    rx: &mut mpsc::Receiver<T>,
    cancel: &CancellationToken,
) -> Recv<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Recv::Cancelled,
        item = rx.recv() => match item {
            Some(item) => Recv::Item(item),
            None => Recv::Closed,
        },
    }
}

/// Send `item`, giving up if `cancel` fires first. A value lost to
/// cancellation is dropped.
pub(crate) async fn send_or_cancel<T>(
    tx: &mpsc::Sender<T>,
    item: T,
    cancel: &CancellationToken,
) -> Sent {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Sent::Cancelled,
        sent = tx.send(item) => match sent {
            Ok(()) => Sent::Delivered,
            Err(_) => Sent::Closed,
        },
    }
}

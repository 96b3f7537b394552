use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::util::{send_or_cancel, Sent};

/// Hand-driven producer for a stream opened with
/// [`Pipeline::channel`](crate::Pipeline::channel).
///
/// Clones feed the same stream, which closes when the last clone is dropped.
#[derive(Debug)]
pub struct Feeder<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for Feeder<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Feeder<T> {
    pub(crate) fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }

    /// Hand `item` to the stream, waiting for room.
    ///
    /// Fails with [`Error::Cancelled`] if `cancel` fires first, in which case
    /// the item is dropped, or [`Error::ChannelClosed`] if the stream is gone.
    pub async fn send(&self, cancel: &CancellationToken, item: T) -> Result<()> {
        match send_or_cancel(&self.tx, item, cancel).await {
            Sent::Delivered => Ok(()),
            Sent::Closed => Err(Error::ChannelClosed),
            Sent::Cancelled => Err(Error::Cancelled),
        }
    }

    /// Whether the stream this feeder writes to has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

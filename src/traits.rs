//! The trait implemented by fallible, pull-based stream sources.

use crate::error::Result;
use async_trait::async_trait;

/// A source generates the values at the head of a pipeline.
///
/// Sources are pulled: the producer task driving a source only calls
/// [`produce`](Source::produce) again once the previous value has been
/// handed off, so a slow pipeline naturally slows its source.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use faninout::error::Result;
/// use faninout::traits::Source;
///
/// struct Countdown {
///     remaining: u32,
/// }
///
/// #[async_trait]
/// impl Source for Countdown {
///     type Item = u32;
///
///     async fn produce(&mut self) -> Result<Option<Self::Item>> {
///         if self.remaining == 0 {
///             return Ok(None); // Signal completion
///         }
///         self.remaining -= 1;
///         Ok(Some(self.remaining))
///     }
/// }
/// ```
#[async_trait]
pub trait Source {
    /// The type of items this source generates
    type Item: Send + 'static;

    /// Produce the next item, or `None` once the source is exhausted.
    ///
    /// An error ends the stream fed by this source.
    async fn produce(&mut self) -> Result<Option<Self::Item>>;
}

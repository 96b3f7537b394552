//! # Cancellable fan-out / fan-in pipelines on tokio
//!
//! This crate composes chains of concurrent stages over a stream of values.
//! Every stage runs as its own tokio task, connected to its neighbours by
//! bounded hand-off channels, and every stage observes one shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! ## Core Concepts
//!
//! - **Stream**: the receiving end of one hand-off channel, fed by exactly one task
//! - **Stage**: `pipe` (map) or `filter`, one task per call
//! - **Fan-out**: N competing workers reading from one stream, returned as a **Group**
//! - **Fan-in**: merge a Group back into one stream, closed only after every member closes
//! - **Collector**: pull a bounded number of values on the caller's task
//!
//! Ordering is kept through single stages and lost across fan-out/fan-in.
//! Once cancellation fires every task stops at its next receive or send; a
//! value already taken from its input at that moment is dropped.
//!
//! ## Example
//!
//! ```rust
//! use faninout::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cancel = CancellationToken::new();
//!
//!     let mut doubled = Stream::iter(&cancel, 1..=6)
//!         .fan_out(&cancel, 2, |x| x * 2)
//!         .fan_in(&cancel);
//!
//!     let mut items = doubled.collect(&cancel, 6).await;
//!     items.sort();
//!     assert_eq!(items, vec![2, 4, 6, 8, 10, 12]);
//! }
//! ```

pub mod error;
pub mod group;
pub mod pipeline;
pub mod sources;
pub mod stream;
pub mod traits;

mod collect;
mod stage;
mod util;

#[cfg(feature = "metrics")]
mod metrics;

// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::group::Group;
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::sources::{
        from_fn, Feeder, IntervalSource, IterSource, RangeSource, RepeatSource, StreamSource,
        VecSource,
    };
    pub use crate::stream::Stream;
    pub use crate::traits::Source;
    pub use tokio_util::sync::CancellationToken;
}

pub use error::{Error, Result};
pub use group::Group;
pub use pipeline::{Pipeline, PipelineConfig};
pub use stream::Stream;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

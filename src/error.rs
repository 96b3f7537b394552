//! Error types for the pipeline edges.
//!
//! Stages, fan-out and fan-in never fail; cancellation is an early stop, not
//! an error. These variants only surface from sources, feeders and task joins.

use std::sync::Arc;

/// The main error type for the crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A source failed to produce an item
    #[error("Source error: {0}")]
    Source(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// The cancellation token fired before the operation completed
    #[error("Pipeline was cancelled")]
    Cancelled,

    /// The receiving side of a channel was dropped
    #[error("Channel was closed unexpectedly")]
    ChannelClosed,

    /// A spawned task panicked or was aborted
    #[error("Task failed: {0}")]
    Task(String),

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Create a source error from any error type
    pub fn source_failed<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Source(Arc::new(error))
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error is the result of cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting foreign errors into a source error
pub trait IntoSourceError<T> {
    fn into_source_error(self) -> Result<T>;
}

impl<T, E> IntoSourceError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_source_error(self) -> Result<T> {
        self.map_err(Error::source_failed)
    }
}

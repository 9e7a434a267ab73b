//! Error types for channel construction and queue plumbing

use std::time::Duration;

use thiserror::Error;

/// Errors raised while wiring a channel to its collaborators
///
/// Sending and disposing never fail; only construction (via the scheduler)
/// and enqueueing onto a stopped queue can.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Invalid interval: {0:?} (must be greater than zero)")]
    InvalidInterval(Duration),

    #[error("No tokio runtime available")]
    NoRuntime,

    #[error("Action queue is closed")]
    QueueClosed,
}

/// Result alias used throughout the library
pub type ChannelResult<T> = Result<T, ChannelError>;

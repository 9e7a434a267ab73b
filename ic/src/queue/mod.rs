//! Sequential action queue
//!
//! Consumer callbacks never run on producer or timer threads. They are
//! handed to an [`ActionQueue`] which executes them one at a time, in the
//! order they were enqueued.

mod sequential;

pub use sequential::{QueueStats, SequentialQueue};

use crate::error::ChannelResult;

/// A zero-argument unit of work submitted to a queue
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Executor that linearizes submitted actions
///
/// Implementations must not block the caller of `enqueue` and must preserve
/// FIFO order across all callers.
pub trait ActionQueue: Send + Sync {
    /// Append an action for later sequential execution
    fn enqueue(&self, action: Action) -> ChannelResult<()>;
}

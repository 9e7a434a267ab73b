//! Recurring action scheduling
//!
//! An [`ActionScheduler`] fires a recurring action onto an [`ActionQueue`]
//! and hands back a [`ScheduledAction`] that stops future firings.

mod timer;

pub use timer::{TimerHandle, TimerScheduler};

use std::sync::Arc;
use std::time::Duration;

use crate::error::ChannelResult;
use crate::queue::ActionQueue;

/// Callback fired on every period
pub type RecurringAction = Arc<dyn Fn() + Send + Sync + 'static>;

/// Cancelable token for a registered recurring action
pub trait ScheduledAction: Send + Sync {
    /// Stop future firings
    ///
    /// Idempotent. Firings already handed to the queue are not retracted.
    fn cancel(&self);

    /// Whether `cancel` has been called
    fn is_cancelled(&self) -> bool;
}

/// Registers recurring actions
pub trait ActionScheduler {
    /// Fire `action` through `queue` after `initial_delay`, then every `period`
    fn schedule(
        &self,
        initial_delay: Duration,
        period: Duration,
        queue: Arc<dyn ActionQueue>,
        action: RecurringAction,
    ) -> ChannelResult<Box<dyn ScheduledAction>>;
}

//! Tokio-backed scheduler: one timer task per registration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::{ActionScheduler, RecurringAction, ScheduledAction};
use crate::error::{ChannelError, ChannelResult};
use crate::queue::ActionQueue;

/// Scheduler that drives each registration from its own tokio task
#[derive(Debug, Clone)]
pub struct TimerScheduler {
    handle: Handle,
}

impl TimerScheduler {
    /// Create a scheduler bound to the current tokio runtime
    pub fn new() -> ChannelResult<Self> {
        let handle = Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;
        Ok(Self::with_handle(handle))
    }

    /// Create a scheduler bound to an explicit runtime
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl ActionScheduler for TimerScheduler {
    fn schedule(
        &self,
        initial_delay: Duration,
        period: Duration,
        queue: Arc<dyn ActionQueue>,
        action: RecurringAction,
    ) -> ChannelResult<Box<dyn ScheduledAction>> {
        debug!(?initial_delay, ?period, "TimerScheduler::schedule: called");
        if period.is_zero() {
            return Err(ChannelError::InvalidInterval(period));
        }

        // Captured here, not inside the task, so the first firing is measured
        // from registration rather than from whenever the task is first polled.
        let start = {
            let _guard = self.handle.enter();
            Instant::now() + initial_delay
        };
        let cancelled = Arc::new(AtomicBool::new(false));
        let task = self
            .handle
            .spawn(timer_loop(start, period, queue, action, Arc::clone(&cancelled)));

        Ok(Box::new(TimerHandle {
            cancelled,
            task: Mutex::new(Some(task)),
        }))
    }
}

async fn timer_loop(
    start: Instant,
    period: Duration,
    queue: Arc<dyn ActionQueue>,
    action: RecurringAction,
    cancelled: Arc<AtomicBool>,
) {
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if cancelled.load(Ordering::Acquire) {
            break;
        }

        trace!("timer_loop: firing");
        let action = Arc::clone(&action);
        if queue.enqueue(Box::new(move || action())).is_err() {
            warn!("timer_loop: queue closed, stopping timer");
            break;
        }
    }
    debug!("timer_loop: exiting");
}

/// Handle returned by [`TimerScheduler::schedule`]
///
/// Dropping the handle without cancelling leaves the timer running.
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduledAction for TimerHandle {
    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            trace!("TimerHandle::cancel: already cancelled");
            return;
        }

        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.abort();
        }
        debug!("TimerHandle::cancel: timer stopped");
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

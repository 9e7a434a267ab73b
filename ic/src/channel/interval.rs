//! LastIntervalChannel - last-value-wins sampling on a fixed interval
//!
//! Producers call [`Channel::send`] as often as they like; only the most
//! recent value survives. Once per interval the timer reads that value and
//! enqueues one consumer call onto the action queue. Values overwritten
//! between two ticks are never delivered.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::Channel;
use super::register::SamplingRegister;
use crate::error::ChannelResult;
use crate::queue::ActionQueue;
use crate::scheduler::{ActionScheduler, RecurringAction, ScheduledAction};

/// Callback receiving sampled values
pub type Consumer<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Counters describing channel activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Calls to `send`
    pub sent: u64,
    /// Ticks that enqueued a consumer call
    pub ticks: u64,
    /// Consumer calls that returned
    pub delivered: u64,
    /// Ticks that found the channel already disposed
    pub skipped_after_dispose: u64,
}

/// State reachable from both the channel and its timer
struct Shared<T> {
    register: SamplingRegister<T>,
    consumer: Consumer<T>,
    queue: Arc<dyn ActionQueue>,
    disposed: AtomicBool,
    sent: AtomicU64,
    ticks: AtomicU64,
    delivered: AtomicU64,
    skipped: AtomicU64,
}

impl<T: Clone + Send + 'static> Shared<T> {
    /// Tick handler: snapshot the register and hand one consumer call to the queue
    fn on_tick(self: &Arc<Self>) {
        if self.disposed.load(Ordering::Acquire) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            trace!("LastIntervalChannel::on_tick: disposed, skipping");
            return;
        }

        let message = self.register.snapshot();
        let shared = Arc::clone(self);
        let forward = Box::new(move || {
            (shared.consumer)(message);
            shared.delivered.fetch_add(1, Ordering::Relaxed);
        });

        match self.queue.enqueue(forward) {
            Ok(()) => {
                self.ticks.fetch_add(1, Ordering::Relaxed);
                trace!("LastIntervalChannel::on_tick: delivery enqueued");
            }
            Err(e) => warn!(error = %e, "LastIntervalChannel::on_tick: could not enqueue delivery"),
        }
    }
}

/// Channel delivering the most recently sent value once per interval
///
/// The first delivery happens one full interval after construction. Before
/// the first `send` the consumer receives `T::default()`.
///
/// Call [`dispose`](Self::dispose) when done. Dropping an active channel
/// disposes it too, but logs a warning: teardown timing then depends on
/// where the last owner happens to go out of scope.
///
/// After `dispose`, a delivery already sitting in the queue still runs, and
/// a tick that passed its disposed check just before `dispose` may still
/// enqueue one final delivery.
pub struct LastIntervalChannel<T> {
    shared: Arc<Shared<T>>,
    scheduled: Mutex<Option<Box<dyn ScheduledAction>>>,
    interval: Duration,
}

impl<T> LastIntervalChannel<T>
where
    T: Clone + Default + Send + 'static,
{
    /// Create a channel and start its timer
    ///
    /// `interval` is used as both the initial delay and the period. Errors
    /// from the scheduler are returned as-is and no channel is created.
    pub fn new<F>(
        queue: Arc<dyn ActionQueue>,
        scheduler: &dyn ActionScheduler,
        interval: Duration,
        consumer: F,
    ) -> ChannelResult<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        debug!(?interval, "LastIntervalChannel::new: called");
        let shared = Arc::new(Shared {
            register: SamplingRegister::default(),
            consumer: Arc::new(consumer),
            queue: Arc::clone(&queue),
            disposed: AtomicBool::new(false),
            sent: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        });

        let tick_shared = Arc::clone(&shared);
        let on_tick: RecurringAction = Arc::new(move || tick_shared.on_tick());
        let scheduled = scheduler.schedule(interval, interval, queue, on_tick)?;

        debug!(?interval, "LastIntervalChannel::new: timer registered");
        Ok(Self {
            shared,
            scheduled: Mutex::new(Some(scheduled)),
            interval,
        })
    }
}

impl<T> LastIntervalChannel<T> {
    /// Stop the timer
    ///
    /// Only the first call has an effect, however many threads race here.
    /// The handle slot's lock is held across `cancel`, so every call returns
    /// only after the timer has been cancelled. A delivery already sitting in
    /// the queue still runs.
    pub fn dispose(&self) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            trace!("LastIntervalChannel::dispose: already disposed");
            return;
        }

        if let Some(handle) = scheduled.take() {
            handle.cancel();
        }
        debug!(interval = ?self.interval, "LastIntervalChannel::dispose: timer cancelled");
    }

    /// Whether `dispose` has run
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Configured delivery interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Snapshot of the channel counters
    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            sent: self.shared.sent.load(Ordering::Relaxed),
            ticks: self.shared.ticks.load(Ordering::Relaxed),
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            skipped_after_dispose: self.shared.skipped.load(Ordering::Relaxed),
        }
    }
}

impl<T: Send> Channel<T> for LastIntervalChannel<T> {
    fn send(&self, message: T) {
        self.shared.register.write(message);
        self.shared.sent.fetch_add(1, Ordering::Relaxed);
    }
}

impl<T> Drop for LastIntervalChannel<T> {
    fn drop(&mut self) {
        if !self.is_disposed() {
            warn!(interval = ?self.interval, "LastIntervalChannel dropped without dispose, disposing now");
            self.dispose();
        }
    }
}

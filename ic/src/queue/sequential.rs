//! SequentialQueue - single worker task draining an unbounded mpsc channel
//!
//! The worker hands each action to tokio's blocking pool and waits for it
//! before taking the next one, so actions stay ordered while a slow or
//! blocking action never occupies a runtime worker thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

use super::{Action, ActionQueue};
use crate::error::{ChannelError, ChannelResult};

/// Counters describing queue throughput
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Actions accepted by `enqueue`
    pub enqueued: u64,
    /// Actions that have finished running (including ones that panicked)
    pub executed: u64,
    /// Actions that panicked while running
    pub panicked: u64,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    executed: AtomicU64,
    panicked: AtomicU64,
}

/// Messages processed by the worker task
enum Job {
    Run(Action),
    Flush(oneshot::Sender<()>),
}

/// Action queue backed by one tokio task
///
/// Every enqueued action runs on a blocking-pool thread, never concurrently
/// with another action from the same queue. A slow action delays the actions
/// behind it but not the tasks that enqueued them.
pub struct SequentialQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl SequentialQueue {
    /// Spawn the worker task on the current tokio runtime
    pub fn spawn() -> ChannelResult<Self> {
        let handle = Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;
        Ok(Self::spawn_on(&handle))
    }

    /// Spawn the worker task on an explicit runtime
    pub fn spawn_on(handle: &Handle) -> Self {
        debug!("SequentialQueue::spawn_on: called");
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = handle.spawn(worker_loop(rx, Arc::clone(&counters)));

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            counters,
        }
    }

    fn push(&self, job: Job) -> ChannelResult<()> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard.as_ref().ok_or(ChannelError::QueueClosed)?;
        tx.send(job).map_err(|_| ChannelError::QueueClosed)
    }

    /// Wait until every action enqueued before this call has run
    pub async fn flush(&self) -> ChannelResult<()> {
        debug!("SequentialQueue::flush: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.push(Job::Flush(reply_tx))?;
        reply_rx.await.map_err(|_| ChannelError::QueueClosed)
    }

    /// Close the queue, drain pending actions and wait for the worker to exit
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self) {
        debug!("SequentialQueue::shutdown: called");
        drop(self.tx.lock().unwrap_or_else(PoisonError::into_inner).take());

        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "SequentialQueue::shutdown: worker task ended abnormally");
            }
        }
    }

    /// Whether `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// Snapshot of the queue counters
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            executed: self.counters.executed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }
}

impl ActionQueue for SequentialQueue {
    fn enqueue(&self, action: Action) -> ChannelResult<()> {
        trace!("SequentialQueue::enqueue: called");
        self.push(Job::Run(action))?;
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

async fn worker_loop(mut rx: mpsc::UnboundedReceiver<Job>, counters: Arc<Counters>) {
    debug!("worker_loop: started");
    while let Some(job) = rx.recv().await {
        match job {
            Job::Run(action) => match task::spawn_blocking(action).await {
                Ok(()) => {
                    counters.executed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) if e.is_panic() => {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    counters.executed.fetch_add(1, Ordering::Relaxed);
                    error!("worker_loop: action panicked, continuing with next action");
                }
                Err(e) => {
                    warn!(error = %e, "worker_loop: runtime shutting down, dropping remaining actions");
                    break;
                }
            },
            Job::Flush(reply) => {
                // Receiver may have given up waiting
                let _ = reply.send(());
            }
        }
    }
    debug!("worker_loop: queue closed, exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_actions_run_in_submission_order() {
        let queue = SequentialQueue::spawn().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..50 {
            let seen = Arc::clone(&seen);
            queue.enqueue(Box::new(move || seen.lock().unwrap().push(i))).unwrap();
        }
        queue.flush().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), (0..50).collect::<Vec<_>>());
        let stats = queue.stats();
        assert_eq!(stats.enqueued, 50);
        assert_eq!(stats.executed, 50);
        assert_eq!(stats.panicked, 0);
    }

    #[tokio::test]
    async fn test_panicking_action_does_not_stop_worker() {
        let queue = SequentialQueue::spawn().unwrap();
        let ran = Arc::new(AtomicU64::new(0));

        queue.enqueue(Box::new(|| panic!("consumer failure"))).unwrap();
        let r = Arc::clone(&ran);
        queue
            .enqueue(Box::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        queue.flush().await.unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(queue.stats().panicked, 1);
        assert_eq!(queue.stats().executed, 2);
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_fails() {
        let queue = SequentialQueue::spawn().unwrap();
        queue.shutdown().await;
        queue.shutdown().await;

        assert!(queue.is_closed());
        let result = queue.enqueue(Box::new(|| {}));
        assert!(matches!(result, Err(ChannelError::QueueClosed)));
        assert!(matches!(queue.flush().await, Err(ChannelError::QueueClosed)));
        assert_eq!(queue.stats().enqueued, 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_actions() {
        let queue = SequentialQueue::spawn().unwrap();
        let ran = Arc::new(AtomicU64::new(0));

        for _ in 0..10 {
            let r = Arc::clone(&ran);
            queue
                .enqueue(Box::new(move || {
                    r.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        queue.shutdown().await;

        assert_eq!(ran.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_blocking_action_does_not_stall_runtime() {
        // Current-thread runtime: the only worker thread also drives this test
        let queue = SequentialQueue::spawn().unwrap();
        queue
            .enqueue(Box::new(|| std::thread::sleep(std::time::Duration::from_millis(300))))
            .unwrap();

        let started = std::time::Instant::now();
        let mut ticks = 0;
        while started.elapsed() < std::time::Duration::from_millis(200) {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            ticks += 1;
        }

        // Starved, the loop would wake once after the 300ms action returned
        assert!(ticks > 10, "runtime stalled: only {ticks} wakeups");
        queue.shutdown().await;
        assert_eq!(queue.stats().executed, 1);
    }

    #[test]
    fn test_spawn_outside_runtime() {
        assert!(matches!(SequentialQueue::spawn(), Err(ChannelError::NoRuntime)));
    }
}

//! Property tests for last-value-wins sampling
//!
//! A hand-fired scheduler and an inline queue make each tick deterministic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use intervalchannel::{
    Action, ActionQueue, ActionScheduler, Channel, ChannelResult, LastIntervalChannel, RecurringAction,
    ScheduledAction,
};
use proptest::prelude::*;

struct InlineQueue;

impl ActionQueue for InlineQueue {
    fn enqueue(&self, action: Action) -> ChannelResult<()> {
        action();
        Ok(())
    }
}

#[derive(Default)]
struct HandFiredScheduler {
    action: Mutex<Option<RecurringAction>>,
}

struct Flag(AtomicBool);

impl ScheduledAction for Flag {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl ActionScheduler for HandFiredScheduler {
    fn schedule(
        &self,
        _initial_delay: Duration,
        _period: Duration,
        _queue: Arc<dyn ActionQueue>,
        action: RecurringAction,
    ) -> ChannelResult<Box<dyn ScheduledAction>> {
        *self.action.lock().unwrap() = Some(action);
        Ok(Box::new(Flag(AtomicBool::new(false))))
    }
}

impl HandFiredScheduler {
    fn fire(&self) {
        let action = self.action.lock().unwrap().clone();
        if let Some(action) = action {
            action();
        }
    }
}

proptest! {
    #[test]
    fn prop_each_tick_delivers_last_send_of_its_window(
        windows in prop::collection::vec(prop::collection::vec(any::<i64>(), 0..20), 1..10)
    ) {
        let scheduler = HandFiredScheduler::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let channel = LastIntervalChannel::new(
            Arc::new(InlineQueue),
            &scheduler,
            Duration::from_millis(1),
            move |v: i64| sink.lock().unwrap().push(v),
        )
        .unwrap();

        let mut expected = Vec::new();
        let mut current = 0i64;
        for window in &windows {
            for v in window {
                channel.send(*v);
            }
            if let Some(last) = window.last() {
                current = *last;
            }
            expected.push(current);
            scheduler.fire();
        }

        channel.dispose();
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
        prop_assert_eq!(channel.stats().sent, windows.iter().map(|w| w.len() as u64).sum::<u64>());
    }

    #[test]
    fn prop_any_number_of_disposals_silences_channel(disposals in 1usize..8, ticks in 0usize..8) {
        let scheduler = HandFiredScheduler::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let channel = LastIntervalChannel::new(
            Arc::new(InlineQueue),
            &scheduler,
            Duration::from_millis(1),
            move |v: u8| sink.lock().unwrap().push(v),
        )
        .unwrap();

        channel.send(9);
        for _ in 0..disposals {
            channel.dispose();
        }
        for _ in 0..ticks {
            scheduler.fire();
        }

        prop_assert!(seen.lock().unwrap().is_empty());
        prop_assert_eq!(channel.stats().skipped_after_dispose, ticks as u64);
    }
}

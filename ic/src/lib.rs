//! IntervalChannel - last-value-wins sampling between fast producers and slow consumers
//!
//! A [`LastIntervalChannel`] remembers only the most recently sent value and
//! forwards it to a consumer once per interval. Anything sent and then
//! overwritten between two ticks is dropped.
//!
//! # Architecture
//!
//! ```text
//! producers ──send──▶ SamplingRegister ◀──snapshot── tick (TimerScheduler)
//!                                                       │
//!                                                       ▼
//!                                       SequentialQueue ──▶ consumer(value)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use intervalchannel::{Channel, LastIntervalChannel, SequentialQueue, TimerScheduler};
//!
//! let queue = Arc::new(SequentialQueue::spawn()?);
//! let scheduler = TimerScheduler::new()?;
//! let channel = LastIntervalChannel::new(queue, &scheduler, Duration::from_millis(100), |v: u64| {
//!     println!("sampled {v}");
//! })?;
//! channel.send(42);
//! channel.dispose();
//! ```
//!
//! # Modules
//!
//! - [`channel`] - channel trait, sampling register and the interval channel
//! - [`queue`] - sequential action queue
//! - [`scheduler`] - recurring action scheduling
//! - [`config`] - configuration for the `ic` binary
//! - [`cli`] - command-line interface
//! - [`demo`] - bursty producer demonstration

pub mod channel;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod queue;
pub mod scheduler;

pub use channel::{Channel, ChannelStats, Consumer, LastIntervalChannel, SamplingRegister};
pub use config::Config;
pub use error::{ChannelError, ChannelResult};
pub use queue::{Action, ActionQueue, QueueStats, SequentialQueue};
pub use scheduler::{ActionScheduler, RecurringAction, ScheduledAction, TimerHandle, TimerScheduler};

/// Default sampling interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 100;

//! Bursty producer demonstration driving a `LastIntervalChannel<u64>`
//!
//! Several producers race to send an ever-increasing counter while the
//! channel samples it once per interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use eyre::{Context, Result};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::channel::{Channel, ChannelStats, LastIntervalChannel};
use crate::config::Config;
use crate::queue::{QueueStats, SequentialQueue};
use crate::scheduler::TimerScheduler;

/// One value handed to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// 1-based delivery number
    pub tick: u64,
    /// Sampled value
    pub value: u64,
    /// Time since the channel was created
    pub elapsed: Duration,
}

/// Outcome of a demo run
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub deliveries: Vec<Delivery>,
    pub channel: ChannelStats,
    pub queue: QueueStats,
}

impl DemoReport {
    /// Sends that never reached the consumer
    pub fn superseded(&self) -> u64 {
        self.channel.sent.saturating_sub(self.channel.delivered)
    }
}

/// Run producers against a sampling channel for `config.run_for()`
///
/// The channel is disposed and the queue drained before returning.
pub async fn run(config: &Config) -> Result<DemoReport> {
    config.validate()?;
    info!(
        interval_ms = config.interval_ms,
        producers = config.producers,
        send_every_ms = config.send_every_ms,
        run_ms = config.run_ms,
        "demo::run: starting"
    );

    let queue = Arc::new(SequentialQueue::spawn().context("Failed to start action queue")?);
    let scheduler = TimerScheduler::new().context("Failed to create scheduler")?;

    let deliveries = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deliveries);
    let started = Instant::now();
    let channel = Arc::new(
        LastIntervalChannel::new(queue.clone(), &scheduler, config.interval(), move |value: u64| {
            let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
            let tick = sink.len() as u64 + 1;
            sink.push(Delivery {
                tick,
                value,
                elapsed: started.elapsed(),
            });
        })
        .context("Failed to create channel")?,
    );

    let counter = Arc::new(AtomicU64::new(0));
    let deadline = started + config.run_for();
    let mut producers = JoinSet::new();
    for id in 0..config.producers {
        let channel = Arc::clone(&channel);
        let counter = Arc::clone(&counter);
        let send_every = config.send_every();
        producers.spawn(async move {
            let mut sent = 0u64;
            while Instant::now() < deadline {
                channel.send(counter.fetch_add(1, Ordering::Relaxed) + 1);
                sent += 1;
                if send_every.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    time::sleep(send_every).await;
                }
            }
            debug!(id, sent, "demo::run: producer finished");
        });
    }

    while let Some(result) = producers.join_next().await {
        result.context("Producer task failed")?;
    }

    // Let the last period complete so the final value gets sampled
    time::sleep_until(deadline).await;
    channel.dispose();

    // Once for tick actions, once for the deliveries they enqueued
    queue.flush().await?;
    queue.flush().await?;
    queue.shutdown().await;

    let deliveries = std::mem::take(&mut *deliveries.lock().unwrap_or_else(PoisonError::into_inner));
    let report = DemoReport {
        deliveries,
        channel: channel.stats(),
        queue: queue.stats(),
    };
    info!(
        sent = report.channel.sent,
        delivered = report.channel.delivered,
        superseded = report.superseded(),
        "demo::run: finished"
    );
    Ok(report)
}

// src/pipeline/schedule.rs

//! Periodic trigger for crawl cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{DeliveryReport, ScheduleConfig};
use crate::pipeline::CrawlEngine;

/// Retry delay after failed cycles: doubles per consecutive failure,
/// capped at the regular interval.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
        }
    }

    /// Record a failure and return the delay before the next attempt.
    pub fn on_failure(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.failures);
        self.failures = self.failures.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Sleep unless cancelled first. Returns `false` on cancellation.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Runs a cycle every `interval` until cancelled.
pub struct Scheduler {
    engine: Arc<CrawlEngine>,
    interval: Duration,
    initial_delay: Duration,
    backoff: Backoff,
}

impl Scheduler {
    pub fn new(engine: Arc<CrawlEngine>, config: &ScheduleConfig) -> Self {
        let interval = Duration::from_secs(config.interval_secs);
        Self {
            engine,
            interval,
            initial_delay: Duration::from_secs(config.initial_delay_secs),
            backoff: Backoff::new(Duration::from_secs(config.failure_backoff_secs), interval),
        }
    }

    /// Run until `cancel` fires. Returns the number of cycles started.
    ///
    /// Cancellation only interrupts the waits between cycles; a running
    /// cycle always completes, including its final save.
    pub async fn run(mut self, cancel: CancellationToken) -> usize {
        log::info!(
            "Scheduler started: first check in {}s, then every {}s",
            self.initial_delay.as_secs(),
            self.interval.as_secs()
        );

        let mut cycles = 0;
        if !sleep_or_cancel(self.initial_delay, &cancel).await {
            log::info!("Scheduler cancelled before first check");
            return cycles;
        }

        loop {
            log::info!("Starting periodic check...");
            cycles += 1;
            let delay = self.next_delay(self.engine.try_run_cycle().await);

            if cancel.is_cancelled() {
                break;
            }
            log::debug!("Next check in {}s", delay.as_secs());
            if !sleep_or_cancel(delay, &cancel).await {
                break;
            }
        }

        log::info!("Scheduler stopped after {} cycles", cycles);
        cycles
    }

    fn next_delay(&mut self, result: Result<DeliveryReport>) -> Duration {
        match result {
            Ok(report) if report.is_failure() => {
                let delay = self.backoff.on_failure();
                log::warn!(
                    "Periodic check failed ({} in a row), retrying in {}s",
                    self.backoff.failures(),
                    delay.as_secs()
                );
                delay
            }
            Ok(_) => {
                self.backoff.reset();
                self.interval
            }
            Err(AppError::CycleInProgress) => {
                log::info!("Skipping periodic check: a manual check is running");
                self.interval
            }
            Err(e) => {
                log::error!("Periodic check error: {}", e);
                self.backoff.on_failure()
            }
        }
    }
}

// src/pipeline/schedule.rs

//! Fixed-cadence scheduling with an injectable clock.
//!
//! The job runs once immediately, then at the next interval boundary after
//! it finishes. Runs never overlap: the next run is only scheduled once the
//! current one has returned, and boundaries that passed while it was
//! running are skipped rather than queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::models::ScheduleConfig;

/// Source of time for the scheduler.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Wait until `deadline` (returns immediately if it has passed).
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        if let Ok(wait) = (deadline - Utc::now()).to_std() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        (**self).sleep_until(deadline).await
    }
}

/// Runs a job on a fixed cadence.
pub struct Scheduler<C: Clock> {
    clock: C,
    interval: Duration,
    align: bool,
}

impl Scheduler<SystemClock> {
    /// Scheduler on the wall clock using configured cadence.
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(
            SystemClock,
            Duration::from_secs(config.interval_secs),
            config.align_to_interval,
        )
    }
}

impl<C: Clock> Scheduler<C> {
    /// Create a scheduler. `align` snaps runs to multiples of `interval`
    /// since the Unix epoch (top of the hour for one hour).
    pub fn new(clock: C, interval: Duration, align: bool) -> Self {
        Self {
            clock,
            interval: interval.max(Duration::from_secs(1)),
            align,
        }
    }

    /// Next run time strictly after `after`.
    pub fn next_run(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let secs = i64::try_from(self.interval.as_secs()).unwrap_or(i64::MAX);
        if self.align {
            let next = (after.timestamp().div_euclid(secs) + 1).saturating_mul(secs);
            if let Some(at) = DateTime::from_timestamp(next, 0) {
                return at;
            }
        }
        TimeDelta::from_std(self.interval)
            .ok()
            .and_then(|step| after.checked_add_signed(step))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Run `job` forever.
    pub async fn run<F, Fut>(&self, job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.run_for(job, None).await;
    }

    /// Run `job` until it has run `limit` times (forever if `None`).
    ///
    /// Returns the number of runs.
    pub async fn run_for<F, Fut>(&self, mut job: F, limit: Option<usize>) -> usize
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut runs = 0;
        loop {
            job().await;
            runs += 1;
            if limit.is_some_and(|max| runs >= max) {
                return runs;
            }

            let next = self.next_run(self.clock.now());
            log::info!("Next cycle scheduled at {}", next.to_rfc3339());
            self.clock.sleep_until(next).await;
        }
    }
}

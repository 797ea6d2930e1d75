// src/pipeline/cycle.rs

//! One fetch → diff → notify → persist pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, Snapshot};
use crate::pipeline::collect::SnapshotCollector;
use crate::pipeline::diff::DiffCalculator;
use crate::pipeline::notify::{DispatchReport, Notifier};
use crate::services::{self, MetricFetcher, NotificationSink, YouTubeFetcher};
use crate::storage::{LocalStorage, SnapshotStore};
use crate::utils::http;

/// Whether a baseline existed when the cycle started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No previous snapshot: record a baseline, notify nothing
    Initial,
    /// Previous snapshot present: diff and notify
    Steady,
}

/// Summary of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub state: CycleState,
    pub channels: usize,
    pub videos: usize,
    /// `None` for initial cycles
    pub dispatch: Option<DispatchReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of asking the driver to run a cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle was still running
    Skipped,
}

/// Clears the running flag when a cycle ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs cycles against injected collaborators.
pub struct CycleDriver {
    fetcher: Arc<dyn MetricFetcher>,
    store: Arc<dyn SnapshotStore>,
    notifier: Notifier,
    request_delay: Duration,
    running: AtomicBool,
}

impl CycleDriver {
    pub fn new(
        fetcher: Arc<dyn MetricFetcher>,
        store: Arc<dyn SnapshotStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            request_delay: Duration::ZERO,
            running: AtomicBool::new(false),
        }
    }

    /// Pause `delay` after each metric request.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Build the production driver: YouTube fetcher, Discord/social sinks, JSON file store.
    ///
    /// Fails if the configuration does not validate.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = http::create_async_client(&config.api)?;

        let fetcher = Arc::new(YouTubeFetcher::new(client.clone(), config.api.clone()));
        let store = Arc::new(LocalStorage::new(&config.paths.snapshot_file));

        let primary = services::primary_from_config(&client, &config.notify)
            .map(|sink| Arc::new(sink) as Arc<dyn NotificationSink>);
        let secondary = services::secondary_from_config(&client, &config.notify)
            .map(|sink| Arc::new(sink) as Arc<dyn NotificationSink>);
        if primary.is_none() {
            log::warn!("notify.discord_webhook_url not set, notifications will be skipped");
        }

        let notifier = Notifier::new(primary, secondary)
            .with_delay(Duration::from_millis(config.notify.dispatch_delay_ms));

        Ok(Self::new(fetcher, store, notifier)
            .with_request_delay(Duration::from_millis(config.api.request_delay_ms)))
    }

    /// Run one cycle unless one is already in flight.
    pub async fn run_cycle(&self, config: &Config) -> Result<CycleOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            log::warn!("Previous cycle still running, skipping this one");
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = RunningGuard(&self.running);

        self.execute(config).await.map(CycleOutcome::Completed)
    }

    async fn execute(&self, config: &Config) -> Result<CycleReport> {
        let started_at = Utc::now();

        let previous = self.store.load().await.unwrap_or_else(|e| {
            log::warn!("Failed to load previous snapshot ({}), starting empty", e);
            Snapshot::default()
        });
        let state = if previous.is_empty() {
            CycleState::Initial
        } else {
            CycleState::Steady
        };

        let current = SnapshotCollector::new(self.fetcher.as_ref(), self.request_delay)
            .collect(config)
            .await;

        let dispatch = match state {
            CycleState::Initial => {
                log::info!("Initial run detected: recording baseline, skipping notifications");
                None
            }
            CycleState::Steady => Some(self.notify(&previous, &current, config).await),
        };

        self.store.save(&current).await?;

        let report = CycleReport {
            state,
            channels: current.channels.len(),
            videos: current.videos.len(),
            dispatch,
            started_at,
            finished_at: Utc::now(),
        };
        log_summary(&report);
        Ok(report)
    }

    async fn notify(
        &self,
        previous: &Snapshot,
        current: &Snapshot,
        config: &Config,
    ) -> DispatchReport {
        let thresholds = config.thresholds();
        if thresholds.subscribers.is_empty() {
            log::warn!("No 'subscriber_thresholds' in config, skipping subscriber checks");
        }
        if thresholds.views.is_empty() {
            log::warn!("No 'view_thresholds' in config, skipping view count checks");
        }

        let calculator = DiffCalculator::new(previous, current, &thresholds);
        self.notifier
            .dispatch_all(calculator.events(), &config.messages)
            .await
    }
}

fn log_summary(report: &CycleReport) {
    let elapsed = report.finished_at - report.started_at;
    match &report.dispatch {
        Some(dispatch) => log::info!(
            "Cycle complete in {}s: {} channels, {} videos, {} events ({} delivered, {} failed, {} skipped)",
            elapsed.num_seconds(),
            report.channels,
            report.videos,
            dispatch.events,
            dispatch.delivered,
            dispatch.failed,
            dispatch.skipped
        ),
        None => log::info!(
            "Baseline recorded in {}s: {} channels, {} videos",
            elapsed.num_seconds(),
            report.channels,
            report.videos
        ),
    }
}

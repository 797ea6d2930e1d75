// src/pipeline/notify.rs

//! Sequential, paced dispatch of notification events.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{MessageTemplates, NotificationEvent, SinkRole};
use crate::services::NotificationSink;

/// Counts from one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events pulled from the engine
    pub events: usize,
    /// Sink posts that succeeded
    pub delivered: usize,
    /// Sink posts that failed
    pub failed: usize,
    /// Sink posts skipped because the sink is not configured
    pub skipped: usize,
}

/// Dispatches events to the primary and, when enabled, the secondary sink.
pub struct Notifier {
    primary: Option<Arc<dyn NotificationSink>>,
    secondary: Option<Arc<dyn NotificationSink>>,
    delay: Duration,
}

impl Notifier {
    /// Create a notifier. Either sink may be absent.
    pub fn new(
        primary: Option<Arc<dyn NotificationSink>>,
        secondary: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        Self {
            primary,
            secondary,
            delay: Duration::ZERO,
        }
    }

    /// Pause `delay` after every sink call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Dispatch events one at a time, each fully before the next is pulled.
    ///
    /// Sink failures are logged and counted; they never stop the run.
    pub async fn dispatch_all<'a, I>(
        &self,
        events: I,
        templates: &MessageTemplates,
    ) -> DispatchReport
    where
        I: IntoIterator<Item = NotificationEvent<'a>>,
    {
        let mut report = DispatchReport::default();
        for event in events {
            report.events += 1;
            self.dispatch(&event, templates, &mut report).await;
        }
        report
    }

    async fn dispatch(
        &self,
        event: &NotificationEvent<'_>,
        templates: &MessageTemplates,
        report: &mut DispatchReport,
    ) {
        log::info!("Dispatching {} for {}", event.kind(), event.subject_id());

        match &self.primary {
            Some(sink) => {
                let text = templates.render(event, SinkRole::Primary);
                self.post(sink.as_ref(), &text, report).await;
            }
            None => {
                log::warn!("Primary sink not configured, skipping notification");
                report.skipped += 1;
            }
        }

        if !event.wants_secondary() {
            return;
        }
        match &self.secondary {
            Some(sink) => {
                let text = templates.render(event, SinkRole::Secondary);
                self.post(sink.as_ref(), &text, report).await;
            }
            None => {
                log::debug!("Secondary sink not configured, skipping notification");
                report.skipped += 1;
            }
        }
    }

    async fn post(&self, sink: &dyn NotificationSink, text: &str, report: &mut DispatchReport) {
        match sink.post(text).await {
            Ok(()) => {
                log::debug!("{} notification sent", sink.name());
                report.delivered += 1;
            }
            Err(e) => {
                log::error!("{} notification failed: {}", sink.name(), e);
                report.failed += 1;
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

//! Capture lifecycle and event aggregation
//!
//! `Capture` owns the configuration, subscribes an aggregator to the host
//! event source, and exposes the public logging and export surface. The
//! aggregator is the only path into the retention store, so the filter
//! applies identically to subscribed events and direct `write` calls.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::artifact::{self, ArtifactWriter};
use crate::config::{CaptureConfig, ConfigError};
use crate::event::{EventKind, EventSink, EventSource, RawEvent, SubscriptionId};
use crate::filter::EventFilter;
use crate::report;
use crate::severity::Severity;
use crate::store::{LogEntry, RetentionStore};

/// Routes filtered events into the retention store
struct Aggregator {
    filter: EventFilter,
    store: Arc<RetentionStore>,
}

impl Aggregator {
    fn ingest(&self, event: &RawEvent) {
        let Some(accepted) = self.filter.accept(event) else {
            return;
        };

        let mut entry = LogEntry::new(accepted.severity, accepted.category, accepted.message);
        if accepted.severity == Severity::Error {
            if let Some(trace) = &event.stack_trace {
                entry = entry.with_stack_trace(trace.clone());
            }
        }
        self.store.record(entry);
    }
}

impl EventSink for Aggregator {
    fn on_event(&self, event: &RawEvent) {
        self.ingest(event);
    }
}

/// Caller-owned capture instance
///
/// Construction subscribes to the injected event source; `shutdown` (or
/// drop) detaches. The retention store stays readable and exportable
/// after shutdown.
pub struct Capture {
    config: CaptureConfig,
    store: Arc<RetentionStore>,
    aggregator: Arc<Aggregator>,
    source: Arc<dyn EventSource>,
    writer: Arc<dyn ArtifactWriter>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl Capture {
    /// Validate the configuration and attach to the event source
    ///
    /// Fails before any capture state is built when the configuration is
    /// invalid, so a rejected call leaves nothing behind.
    pub fn initialize(
        config: CaptureConfig,
        source: Arc<dyn EventSource>,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let store = Arc::new(RetentionStore::new(config.general_capacity));
        let aggregator = Arc::new(Aggregator {
            filter: EventFilter::new(config.minimum_severity, config.category_filter.clone()),
            store: Arc::clone(&store),
        });

        let subscription = source.subscribe(Arc::clone(&aggregator) as Arc<dyn EventSink>);
        info!(
            "Log capture initialized (min severity {}, capacity {})",
            config.minimum_severity, config.general_capacity
        );

        Ok(Self {
            config,
            store,
            aggregator,
            source,
            writer,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Detach from the event source; idempotent
    pub fn shutdown(&self) {
        let id = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(id) = id {
            self.source.unsubscribe(id);
            debug!("Log capture unsubscribed from event source");
        }
    }

    /// Whether the aggregator is currently subscribed
    pub fn is_active(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Log directly, bypassing the event source
    ///
    /// Routed through the same filter as subscribed events, so severity
    /// threshold and category allow-list apply here too.
    pub fn write(&self, severity: Severity, category: &str, message: &str) {
        let kind = match severity {
            Severity::Info => EventKind::Message,
            Severity::Warning => EventKind::Warning,
            Severity::Error => EventKind::Error,
        };
        let event = RawEvent::new(kind, format!("[{}] {}", category, message));
        self.aggregator.ingest(&event);
    }

    /// Render the current store contents as a report document
    pub fn export_report(&self) -> String {
        report::render_report(&self.config, &self.store.snapshot(), Utc::now())
    }

    /// Export the current report through the artifact writer
    ///
    /// A failed write leaves the store untouched; the failure is recorded
    /// through the capture log itself and returned to the caller. Old
    /// report files past the retention period are swept after a
    /// successful export.
    pub fn flush(&self) -> Result<PathBuf> {
        let document = self.export_report();
        let name = artifact::report_file_name(&self.config.report_prefix);

        match self
            .writer
            .write(&name, document.as_bytes(), &self.config.reports_dir)
        {
            Ok(path) => {
                info!("Report exported to {}", path.display());
                match artifact::cleanup_old_reports(
                    &self.config.reports_dir,
                    &self.config.report_prefix,
                    self.config.report_retention_days,
                ) {
                    Ok(swept) if swept > 0 => debug!("Removed {} old report files", swept),
                    Ok(_) => {}
                    Err(err) => warn!("Failed to sweep old reports: {:#}", err),
                }
                Ok(path)
            }
            Err(err) => {
                warn!("Report export failed: {:#}", err);
                self.write(
                    Severity::Error,
                    "Capture",
                    &format!("report export failed: {:#}", err),
                );
                Err(err).context("Failed to export report")
            }
        }
    }

    /// Current `(error, general)` entry counts
    pub fn snapshot_counts(&self) -> (usize, usize) {
        self.store.counts()
    }

    /// Active configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        self.shutdown();
    }
}

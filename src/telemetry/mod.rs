//! Telemetry module
//!
//! Analytics events and error logs are appended to the hosted event store
//! and, for analytics, optionally forwarded to a third-party service.
//! Recording is fire-and-forget: failures are logged and never reach the
//! caller.

pub mod events;
pub mod forward;
pub mod store;

pub use events::{new_session_id, AnalyticsEvent, ErrorLogEntry, Severity};
pub use forward::AnalyticsForwarder;
pub use store::{DisabledStore, EventStore, RestEventStore, Table};

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::logger;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct Telemetry {
    store: Arc<dyn EventStore>,
    forwarder: Option<Arc<AnalyticsForwarder>>,
}

impl Telemetry {
    pub fn new(store: Arc<dyn EventStore>, forwarder: Option<AnalyticsForwarder>) -> Self {
        Self {
            store,
            forwarder: forwarder.map(Arc::new),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, TelemetryError> {
        let store: Arc<dyn EventStore> = match RestEventStore::from_config(&config.event_store)? {
            Some(rest) => Arc::new(rest),
            None => Arc::new(DisabledStore),
        };
        let forwarder = AnalyticsForwarder::from_config(&config.analytics)?;
        Ok(Self::new(store, forwarder))
    }

    /// Telemetry that drops everything
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledStore), None)
    }

    /// Record an analytics event in the background
    pub fn track_event(&self, event: AnalyticsEvent) {
        let telemetry = self.clone();
        tokio::spawn(async move { telemetry.record_event(event).await });
    }

    /// Record an error log entry in the background
    pub fn log_error(&self, entry: ErrorLogEntry) {
        let telemetry = self.clone();
        tokio::spawn(async move { telemetry.record_error(entry).await });
    }

    /// Stamp, store and forward one analytics event; failures are only logged
    pub async fn record_event(&self, mut event: AnalyticsEvent) {
        event.stamp(Utc::now());
        self.insert(Table::AnalyticsEvents, &event).await;

        if let Some(forwarder) = &self.forwarder {
            if let Err(e) = forwarder.forward(&event).await {
                logger::log_telemetry_failure("analytics forward", &e);
            }
        }
    }

    /// Stamp and store one error log entry; failures are only logged
    pub async fn record_error(&self, mut entry: ErrorLogEntry) {
        entry.stamp(Utc::now());
        self.insert(Table::ErrorLogs, &entry).await;
    }

    async fn insert(&self, table: Table, record: &impl Serialize) {
        let result = match serde_json::to_value(record) {
            Ok(row) => self.store.insert(table, &row).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            logger::log_telemetry_failure(table.as_str(), &e);
        }
    }
}

/// Test doubles for the event store
#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::mailer::BoxFuture;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct RecordingStore {
        rows: Mutex<Vec<(Table, Value)>>,
    }

    impl RecordingStore {
        pub fn rows(&self, table: Table) -> Vec<Value> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(t, _)| *t == table)
                .map(|(_, row)| row.clone())
                .collect()
        }
    }

    impl EventStore for RecordingStore {
        fn insert<'a>(&'a self, table: Table, row: &'a Value) -> BoxFuture<'a, Result<(), TelemetryError>> {
            self.rows.lock().unwrap().push((table, row.clone()));
            Box::pin(async { Ok(()) })
        }
    }

    /// Store that rejects every row
    #[derive(Debug, Default)]
    pub struct FailingStore;

    impl EventStore for FailingStore {
        fn insert<'a>(&'a self, _table: Table, _row: &'a Value) -> BoxFuture<'a, Result<(), TelemetryError>> {
            Box::pin(async {
                Err(TelemetryError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FailingStore, RecordingStore};
    use super::*;

    #[tokio::test]
    async fn test_record_event_stamps_and_stores() {
        let store = Arc::new(RecordingStore::default());
        let telemetry = Telemetry::new(store.clone(), None);

        telemetry
            .record_event(AnalyticsEvent::new(events::PAGE_VIEW, "https://preaudit.example/"))
            .await;

        let rows = store.rows(Table::AnalyticsEvents);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["event_name"], "page_view");
        assert!(rows[0]["properties"]["timestamp"].is_string());
        assert!(store.rows(Table::ErrorLogs).is_empty());
    }

    #[tokio::test]
    async fn test_record_error_goes_to_error_logs() {
        let store = Arc::new(RecordingStore::default());
        let telemetry = Telemetry::new(store.clone(), None);

        telemetry
            .record_error(ErrorLogEntry::new("ChunkLoadError", Severity::High).with_metadata("type", "javascript_error"))
            .await;

        let rows = store.rows(Table::ErrorLogs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["severity"], "high");
        assert_eq!(rows[0]["metadata"]["type"], "javascript_error");
        assert!(rows[0]["metadata"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let telemetry = Telemetry::new(Arc::new(FailingStore), None);
        // Completes without panicking or returning an error
        telemetry.record_event(AnalyticsEvent::new("cta_click", "")).await;
        telemetry.record_error(ErrorLogEntry::new("boom", Severity::Low)).await;
    }

    #[tokio::test]
    async fn test_track_event_runs_in_background() {
        let store = Arc::new(RecordingStore::default());
        let telemetry = Telemetry::new(store.clone(), None);

        telemetry.track_event(AnalyticsEvent::new("cta_click", ""));
        for _ in 0..10 {
            if !store.rows(Table::AnalyticsEvents).is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.rows(Table::AnalyticsEvents).len(), 1);
    }
}

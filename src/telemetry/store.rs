// Event store module
// Insert-only writes to the hosted `analytics_events` / `error_logs` tables

use serde_json::Value;
use std::fmt;
use std::time::Duration;

use super::TelemetryError;
use crate::config::EventStoreConfig;
use crate::mailer::BoxFuture;

const STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    AnalyticsEvents,
    ErrorLogs,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnalyticsEvents => "analytics_events",
            Self::ErrorLogs => "error_logs",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only sink for telemetry rows
pub trait EventStore: Send + Sync {
    fn insert<'a>(&'a self, table: Table, row: &'a Value) -> BoxFuture<'a, Result<(), TelemetryError>>;
}

/// Store used when no event store URL is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl EventStore for DisabledStore {
    fn insert<'a>(&'a self, table: Table, _row: &'a Value) -> BoxFuture<'a, Result<(), TelemetryError>> {
        crate::logger::log_debug(&format!("[Telemetry] Event store disabled, dropping {table} row"));
        Box::pin(async { Ok(()) })
    }
}

/// PostgREST-style store: `POST <base>/rest/v1/<table>`
#[derive(Debug, Clone)]
pub struct RestEventStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestEventStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder().timeout(STORE_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build the configured store, or `None` when telemetry storage is off
    pub fn from_config(config: &EventStoreConfig) -> Result<Option<Self>, TelemetryError> {
        config
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| Self::new(url, config.api_key.clone()))
            .transpose()
    }

    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    async fn post_row(&self, table: Table, row: &Value) -> Result<(), TelemetryError> {
        let mut req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row);
        if let Some(key) = self.api_key.as_deref() {
            req = req.header("apikey", key).bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(TelemetryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl EventStore for RestEventStore {
    fn insert<'a>(&'a self, table: Table, row: &'a Value) -> BoxFuture<'a, Result<(), TelemetryError>> {
        Box::pin(self.post_row(table, row))
    }
}

//! Analytics and error-log records

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Analytics event name for a page view
pub const PAGE_VIEW: &str = "page_view";

/// One row of `analytics_events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_name: String,
    #[serde(default)]
    pub page_url: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl AnalyticsEvent {
    pub fn new(event_name: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            page_url: page_url.into(),
            session_id: String::new(),
            user_agent: String::new(),
            referrer: None,
            properties: Map::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Record the capture time in `properties.timestamp`
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.properties
            .insert("timestamp".to_string(), Value::String(rfc3339(now)));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// One row of `error_logs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub error_message: String,
    #[serde(default)]
    pub error_stack: Option<String>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ErrorLogEntry {
    pub fn new(error_message: impl Into<String>, severity: Severity) -> Self {
        Self {
            error_message: error_message.into(),
            error_stack: None,
            user_agent: String::new(),
            url: String::new(),
            session_id: String::new(),
            severity,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Record the capture time in `metadata.timestamp`
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.metadata
            .insert("timestamp".to_string(), Value::String(rfc3339(now)));
    }
}

fn rfc3339(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a session id of the form `session_<unix-millis>_<9 chars>`
pub fn new_session_id() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect();
    format!("session_{}_{suffix}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_id_shape() {
        let id = new_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(new_session_id(), id);
    }

    #[test]
    fn test_stamp_overwrites_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let mut event = AnalyticsEvent::new(PAGE_VIEW, "https://preaudit.example/")
            .with_property("timestamp", "client supplied")
            .with_property("pathname", "/");
        event.stamp(now);
        assert_eq!(event.properties["timestamp"], "2026-10-18T09:30:00.000Z");
        assert_eq!(event.properties["pathname"], "/");
    }

    #[test]
    fn test_error_entry_defaults() {
        let entry: ErrorLogEntry =
            serde_json::from_str(r#"{"error_message":"ChunkLoadError"}"#).unwrap();
        assert_eq!(entry.severity, Severity::Medium);
        assert!(entry.error_stack.is_none());

        let row = serde_json::to_value(ErrorLogEntry::new("boom", Severity::Critical)).unwrap();
        assert_eq!(row["severity"], "critical");
        assert!(row["error_stack"].is_null());
    }

    #[test]
    fn test_analytics_row_shape() {
        let row = serde_json::to_value(AnalyticsEvent::new("cta_click", "https://x/")).unwrap();
        assert!(row["referrer"].is_null());
        assert!(row["properties"].is_object());
    }
}

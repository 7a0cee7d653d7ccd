//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::{DateTime, Local};

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Peer socket address
    pub remote_addr: String,
    /// Caller identity from `X-Forwarded-For`, if present
    pub forwarded_for: Option<String>,
    /// Request timestamp
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            forwarded_for: None,
            time: Local::now(),
            method,
            path,
            query: None,
            status: 200,
            body_bytes: 0,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// Address shown in text formats: forwarded client first, peer otherwise
    fn client(&self) -> &str {
        self.forwarded_for.as_deref().unwrap_or(&self.remote_addr)
    }

    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/1.1\" {} {}",
            self.client(),
            self.time.format(CLF_TIME),
            self.method,
            self.request_uri(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_combined(&self) -> String {
        format!(
            "{} \"-\" \"{}\" {}us",
            self.format_common(),
            self.user_agent.as_deref().unwrap_or("-"),
            self.request_time_us,
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "forwarded_for": self.forwarded_for,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$forwarded_for`, `$time_local`,
    /// `$time_iso8601`, `$request_time`, `$request_method`, `$request_uri`,
    /// `$status`, `$body_bytes_sent`, `$http_user_agent`.
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace("$forwarded_for", self.forwarded_for.as_deref().unwrap_or("-"))
            .replace("$time_local", &self.time.format(CLF_TIME).to_string())
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_time", &format!("{request_time:.3}"))
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.request_uri())
            .replace("$status", &self.status.to_string())
            .replace("$body_bytes_sent", &self.body_bytes.to_string())
            .replace("$http_user_agent", self.user_agent.as_deref().unwrap_or("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "10.0.0.7:50412".to_string(),
            "POST".to_string(),
            "/".to_string(),
        );
        entry.forwarded_for = Some("203.0.113.9".to_string());
        entry.status = 429;
        entry.body_bytes = 57;
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 12_000;
        entry
    }

    #[test]
    fn test_format_common_prefers_forwarded_client() {
        let log = create_test_entry().format("common");
        assert!(log.starts_with("203.0.113.9 - - ["));
        assert!(log.contains("\"POST / HTTP/1.1\" 429 57"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.contains("\"POST / HTTP/1.1\" 429 57"));
        assert!(log.contains("\"Mozilla/5.0\""));
        assert!(log.ends_with("12000us"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "10.0.0.7:50412");
        assert_eq!(value["forwarded_for"], "203.0.113.9");
        assert_eq!(value["status"], 429);
        assert!(value["query"].is_null());
    }

    #[test]
    fn test_format_custom() {
        let mut entry = create_test_entry();
        entry.query = Some("ref=home".to_string());
        let log = entry.format("$forwarded_for $request_method $request_uri $status $request_time");
        assert_eq!(log, "203.0.113.9 POST /?ref=home 429 0.012");
    }
}

// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub contact: ContactConfig,
    pub rate_limit: RateLimitConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub event_store: EventStoreConfig,
    pub analytics: AnalyticsConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` response header; empty omits it
    pub server_name: String,
    pub max_body_size: u64,
}

/// Contact endpoint behavior
#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    /// Sanitize input, rate limit callers and attach hardening headers.
    /// `false` selects the older pass-through behavior.
    pub hardened: bool,
    /// Fixed `From` address of the notification email
    pub sender: String,
    /// Fixed recipients of the notification email
    pub recipients: Vec<String>,
    pub subject_prefix: String,
}

/// Per-caller request throttling for the contact endpoint
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

/// Transactional email API
#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    /// Falls back to `RESEND_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Hosted event store receiving `analytics_events` and `error_logs` rows.
/// Telemetry rows are dropped when no URL is configured.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EventStoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Third-party analytics forwarding
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub events_url: String,
    pub domain: String,
}

// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AnalyticsConfig, Config, ContactConfig, EmailConfig, EventStoreConfig, HttpConfig,
    LoggingConfig, PerformanceConfig, RateLimitConfig, ServerConfig,
};

/// Environment variable consulted when `email.api_key` is not configured
pub const EMAIL_API_KEY_ENV: &str = "RESEND_API_KEY";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("PREAUDIT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("contact.recipients"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "preaudit-contact")?
            .set_default("http.max_body_size", 65_536)? // 64KB
            .set_default("contact.hardened", true)?
            .set_default("contact.sender", "Contact Form <onboarding@resend.dev>")?
            .set_default("contact.recipients", vec!["dev.solidity.eth@gmail.com"])?
            .set_default("contact.subject_prefix", "New contact message from")?
            .set_default("rate_limit.window_secs", 900)? // 15 minutes
            .set_default("rate_limit.max_requests", 5)?
            .set_default("email.api_url", "https://api.resend.com/emails")?
            .set_default("email.timeout_secs", 30)?
            .set_default("analytics.enabled", false)?
            .set_default("analytics.events_url", "https://plausible.io/api/event")?
            .set_default("analytics.domain", "preaudit.lovable.app")?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.apply_env_fallbacks(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Fill settings that have a conventional environment variable of their own
    pub fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.email.api_key.as_deref().map_or(true, str::is_empty) {
            self.email.api_key = lookup(EMAIL_API_KEY_ENV).filter(|k| !k.is_empty());
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.contact.recipients.is_empty() {
            return Err(config::ConfigError::Message(
                "contact.recipients must list at least one address".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 || self.rate_limit.max_requests == 0 {
            return Err(config::ConfigError::Message(
                "rate_limit.window_secs and rate_limit.max_requests must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_defaults() -> Config {
        Config::load_from("does-not-exist/config").expect("defaults should load")
    }

    #[test]
    fn test_defaults() {
        let cfg = load_defaults();
        assert!(cfg.contact.hardened);
        assert_eq!(cfg.rate_limit.window_secs, 900);
        assert_eq!(cfg.rate_limit.max_requests, 5);
        assert_eq!(cfg.contact.recipients, vec!["dev.solidity.eth@gmail.com"]);
        assert_eq!(cfg.email.api_url, "https://api.resend.com/emails");
        assert!(!cfg.analytics.enabled);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = load_defaults();
        cfg.server.host = "0.0.0.0".to_string();
        cfg.server.port = 9090;
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9090);

        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_api_key_fallback() {
        let mut cfg = load_defaults();
        cfg.email.api_key = None;
        cfg.apply_env_fallbacks(|key| (key == EMAIL_API_KEY_ENV).then(|| "re_test".to_string()));
        assert_eq!(cfg.email.api_key.as_deref(), Some("re_test"));

        // An explicit key wins over the environment
        cfg.email.api_key = Some("re_configured".to_string());
        cfg.apply_env_fallbacks(|_| Some("re_env".to_string()));
        assert_eq!(cfg.email.api_key.as_deref(), Some("re_configured"));
    }

    #[test]
    fn test_validate_rejects_empty_recipients() {
        let mut cfg = load_defaults();
        cfg.contact.recipients.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut cfg = load_defaults();
        cfg.rate_limit.window_secs = 0;
        assert!(cfg.validate().is_err());
    }
}

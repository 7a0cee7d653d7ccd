// Application state module
// Holds configuration, the rate limiter and outbound service handles

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::contact::rate_limit::RateLimiter;
use crate::mailer::{EmailSender, MailError, ResendMailer};
use crate::telemetry::{Telemetry, TelemetryError};

/// Failure while constructing outbound clients at startup
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email client: {0}")]
    Mail(#[from] MailError),
    #[error("telemetry client: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Application state
pub struct AppState {
    pub config: Config,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,

    /// Per-caller throttle for the contact endpoint (process-local)
    pub rate_limiter: RateLimiter,
    pub mailer: Arc<dyn EmailSender>,
    pub telemetry: Telemetry,
}

impl AppState {
    /// Create `AppState` with the HTTP email API and event store clients
    pub fn new(config: &Config) -> Result<Self, StateError> {
        let mailer = Arc::new(ResendMailer::new(&config.email)?);
        let telemetry = Telemetry::from_config(config)?;
        Ok(Self::with_services(config, mailer, telemetry))
    }

    /// Create `AppState` around caller-supplied services
    pub fn with_services(
        config: &Config,
        mailer: Arc<dyn EmailSender>,
        telemetry: Telemetry,
    ) -> Self {
        let rate_limiter = RateLimiter::new(
            Duration::from_secs(config.rate_limit.window_secs),
            config.rate_limit.max_requests,
        );

        Self {
            config: config.clone(),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
            rate_limiter,
            mailer,
            telemetry,
        }
    }

    /// Replace the rate limiter (tests drive it with a manual clock)
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Whether the hardened contact behavior is active
    pub const fn hardened(&self) -> bool {
        self.config.contact.hardened
    }
}

//! Per-caller request throttling
//!
//! Each caller key gets a window that opens on its first request and lasts
//! `window`. Up to `max_requests` requests are admitted inside the window;
//! the first request at or after the reset time opens a fresh window and
//! counts as one. Counters live in process memory only.

use hyper::HeaderMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Key used when the caller sent no `X-Forwarded-For`
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Expired windows are swept once the map grows past this many keys
const SWEEP_THRESHOLD: usize = 10_000;

/// Time source for the limiter
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug)]
struct Windows {
    entries: HashMap<String, WindowEntry>,
    /// Earliest time the next sweep may run
    next_sweep: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clock: Arc<dyn Clock>,
    windows: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self::with_clock(window, max_requests, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, max_requests: u32, clock: Arc<dyn Clock>) -> Self {
        let next_sweep = clock.now();
        Self {
            window,
            max_requests,
            clock,
            windows: Mutex::new(Windows {
                entries: HashMap::new(),
                next_sweep,
            }),
        }
    }

    /// Count one request for `key` and decide whether it may proceed
    pub fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        // A poisoned map only loses counters; keep serving with its contents
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // At most one sweep per window
        if windows.entries.len() > SWEEP_THRESHOLD && now >= windows.next_sweep {
            windows.entries.retain(|_, entry| now < entry.reset_at);
            windows.next_sweep = now + self.window;
        }
        let entries = &mut windows.entries;

        if let Some(entry) = entries.get_mut(key).filter(|e| now < e.reset_at) {
            if entry.count >= self.max_requests {
                return RateDecision::Limited {
                    retry_after: entry.reset_at - now,
                };
            }
            entry.count += 1;
            return RateDecision::Allowed {
                remaining: self.max_requests - entry.count,
            };
        }

        entries.insert(
            key.to_string(),
            WindowEntry {
                count: 1,
                reset_at: now + self.window,
            },
        );
        RateDecision::Allowed {
            remaining: self.max_requests.saturating_sub(1),
        }
    }

    /// Number of caller keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().entries.len(), |w| w.entries.len())
    }
}

/// Caller identity: first `X-Forwarded-For` hop, else `"unknown"`
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), ToString::to_string)
}

/// Manually advanced clock for tests
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (RateLimiter::with_clock(WINDOW, 5, clock.clone()), clock)
    }

    #[test]
    fn test_sixth_request_is_limited() {
        let (limiter, _clock) = limiter();
        for expected_remaining in (0..5).rev() {
            assert_eq!(
                limiter.check("203.0.113.9"),
                RateDecision::Allowed {
                    remaining: expected_remaining
                }
            );
        }
        assert!(!limiter.check("203.0.113.9").is_allowed());
    }

    #[test]
    fn test_window_reset_admits_again() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            assert!(limiter.check("a").is_allowed());
        }
        clock.advance(Duration::from_secs(60));
        match limiter.check("a") {
            RateDecision::Limited { retry_after } => {
                assert_eq!(retry_after, WINDOW - Duration::from_secs(60));
            }
            RateDecision::Allowed { .. } => panic!("expected limit inside the window"),
        }

        clock.advance(WINDOW);
        assert_eq!(limiter.check("a"), RateDecision::Allowed { remaining: 4 });
    }

    #[test]
    fn test_reset_exactly_at_window_end() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            limiter.check("a");
        }
        clock.advance(WINDOW);
        assert!(limiter.check("a").is_allowed());
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _clock) = limiter();
        for _ in 0..5 {
            limiter.check("a");
        }
        assert!(!limiter.check("a").is_allowed());
        assert!(limiter.check("b").is_allowed());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_expired_windows_are_swept_past_threshold() {
        let (limiter, clock) = limiter();
        for i in 0..=SWEEP_THRESHOLD {
            limiter.check(&format!("10.0.{}.{}", i / 256, i % 256));
        }
        assert_eq!(limiter.tracked_keys(), SWEEP_THRESHOLD + 1);

        clock.advance(WINDOW + Duration::from_secs(1));
        assert!(limiter.check("203.0.113.9").is_allowed());
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_sweep_runs_at_most_once_per_window() {
        let (limiter, clock) = limiter();
        let half = WINDOW / 2;
        for i in 0..=SWEEP_THRESHOLD {
            limiter.check(&format!("a{i}"));
        }

        // Nothing has expired yet; the sweep still runs and books the next one
        clock.advance(half);
        limiter.check("x");
        assert_eq!(limiter.tracked_keys(), SWEEP_THRESHOLD + 2);

        // The first batch is expired but the next sweep is not due
        clock.advance(half);
        limiter.check("y");
        assert_eq!(limiter.tracked_keys(), SWEEP_THRESHOLD + 3);

        clock.advance(half);
        limiter.check("z");
        // "y" is still inside its window, "z" was just added
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), UNKNOWN_CLIENT);

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&headers), "203.0.113.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_key(&headers), UNKNOWN_CLIENT);
    }
}

//! Contact form domain
//!
//! Validation schema, email rendering and sanitization, the per-caller
//! rate limiter and the submission client.

pub mod client;
pub mod email;
pub mod form;
pub mod rate_limit;
pub mod sanitize;

pub use client::{ClientError, ContactClient, SubmitOutcome};
pub use form::{ContactForm, ContactSubmission, Field, ValidationErrors};
pub use rate_limit::{RateDecision, RateLimiter};

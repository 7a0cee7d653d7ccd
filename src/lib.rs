//! PreAudit contact service
//!
//! HTTP backend for the PreAudit marketing site: the contact-email
//! endpoint, telemetry ingestion and the submission client.

pub mod config;
pub mod contact;
pub mod handler;
pub mod http;
pub mod logger;
pub mod mailer;
pub mod server;
pub mod telemetry;

//! Request handler module
//!
//! Responsible for request routing dispatch and endpoint processing:
//! the contact-email pipeline and telemetry ingestion.

pub mod contact;
pub mod ingest;
pub mod router;

// Re-export main entry point
pub use router::handle_request;

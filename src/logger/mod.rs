//! Logger module
//!
//! Provides logging utilities for the contact service including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Leveled info, warning and error logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    /// Parse a configured level name, falling back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            2 => Self::Warn,
            3 => Self::Error,
            _ => Self::Info,
        }
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    set_level(Level::parse(&config.logging.level));
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

pub fn set_level(level: Level) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn enabled(level: Level) -> bool {
    level >= Level::from_u8(MIN_LEVEL.load(Ordering::Relaxed))
}

/// Write to info/access log
fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    if writer::is_initialized() {
        writer::get().write_access(message);
    } else {
        println!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Contact service started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info(&format!(
        "Contact mode: {}",
        if config.contact.hardened { "hardened" } else { "legacy" }
    ));
    write_info(&format!(
        "Rate limit: {} requests / {}s per caller",
        config.rate_limit.max_requests, config.rate_limit.window_secs
    ));
    write_info(&format!(
        "Event store: {}",
        config.event_store.url.as_deref().unwrap_or("disabled")
    ));
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_debug(message: &str) {
    if enabled(Level::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(Level::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

/// Submission arrival; visitor-supplied text stays out of the log
pub fn log_contact_received(has_organization: bool, has_budget: bool) {
    log_info(&contact_received_line(has_organization, has_budget));
}

fn contact_received_line(has_organization: bool, has_budget: bool) -> String {
    format!("[Contact] Submission received (organization: {has_organization}, budget: {has_budget})")
}

pub fn log_email_sent(id: Option<&str>) {
    log_info(&format!("[Contact] Email sent successfully (id: {})", id.unwrap_or("-")));
}

pub fn log_rate_limited(client_key: &str) {
    log_warning(&format!("[Contact] Rate limit exceeded for {client_key}"));
}

pub fn log_telemetry_failure(table: &str, err: &impl std::fmt::Display) {
    log_warning(&format!("[Telemetry] Failed to record {table} row: {err}"));
}

pub fn log_shutdown() {
    write_info("\n[Shutdown] Stopped accepting connections");
}

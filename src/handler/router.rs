//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body collection, path dispatch
//! and access logging.

use crate::config::AppState;
use crate::contact::rate_limit::client_key;
use crate::handler::{contact, ingest};
use crate::http::{self, BodyError};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{HeaderMap, Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Paths served by the contact-email endpoint
pub const CONTACT_PATHS: [&str; 2] = ["/", "/send-contact-email"];
pub const ANALYTICS_PATH: &str = "/analytics";
pub const ERRORS_PATH: &str = "/errors";
pub const HEALTH_PATH: &str = "/healthz";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let access_log = state.cached_access_log.load(Ordering::Relaxed);
    let mut entry = access_log.then(|| access_entry(&parts, peer_addr));

    let body = http::read_limited(body, state.config.http.max_body_size).await;
    let mut response = dispatch(&parts.method, parts.uri.path(), &parts.headers, body, &state).await;
    http::apply_server_header(&mut response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route a collected request to its endpoint
pub async fn dispatch(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: Result<Bytes, BodyError>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let hardened = state.hardened();

    match path {
        p if CONTACT_PATHS.contains(&p) => contact::handle(method, headers, body, state).await,
        ANALYTICS_PATH => {
            ingest::handle(ingest::IngestKind::Analytics, method, headers, body, state).await
        }
        ERRORS_PATH => ingest::handle(ingest::IngestKind::Errors, method, headers, body, state).await,
        _ if method == Method::OPTIONS => http::build_preflight_response(hardened),
        HEALTH_PATH if method == Method::GET || method == Method::HEAD => {
            http::build_health_response("ok")
        }
        HEALTH_PATH => http::build_405_response("GET, HEAD", hardened),
        _ => {
            logger::log_debug(&format!("No route for {method} {path}"));
            http::build_404_response(hardened)
        }
    }
}

fn access_entry(parts: &hyper::http::request::Parts, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.forwarded_for = parts
        .headers
        .contains_key("x-forwarded-for")
        .then(|| client_key(&parts.headers));
    entry.user_agent = parts
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

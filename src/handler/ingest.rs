//! Telemetry ingestion endpoints
//!
//! `POST /analytics` and `POST /errors` accept rows from the site and hand
//! them to the fire-and-forget recorder. The response never waits for the
//! event store.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::contact::session_from;
use crate::config::AppState;
use crate::http::{self, BodyError};
use crate::logger;
use crate::telemetry::{AnalyticsEvent, ErrorLogEntry};

/// Which table an ingestion path feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestKind {
    Analytics,
    Errors,
}

pub async fn handle(
    kind: IngestKind,
    method: &Method,
    headers: &HeaderMap,
    body: Result<Bytes, BodyError>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let hardened = state.hardened();

    if method == Method::OPTIONS {
        return http::build_preflight_response(hardened);
    }
    if method != Method::POST {
        return http::build_405_response("POST, OPTIONS", hardened);
    }

    let result = match kind {
        IngestKind::Analytics => parse::<AnalyticsEvent>(body).map(|mut event| {
            fill_client_fields(&mut event.session_id, &mut event.user_agent, headers);
            if event.referrer.as_deref() == Some("") {
                event.referrer = None;
            }
            state.telemetry.track_event(event);
        }),
        IngestKind::Errors => parse::<ErrorLogEntry>(body).map(|mut entry| {
            fill_client_fields(&mut entry.session_id, &mut entry.user_agent, headers);
            state.telemetry.log_error(entry);
        }),
    };

    match result {
        Ok(()) => http::json_response(
            StatusCode::ACCEPTED,
            &serde_json::json!({ "success": true }),
            hardened,
        ),
        Err(message) => {
            logger::log_warning(&format!("[Telemetry] Rejected {kind:?} payload: {message}"));
            http::error_response(StatusCode::BAD_REQUEST, &message, hardened)
        }
    }
}

fn parse<T: DeserializeOwned>(body: Result<Bytes, BodyError>) -> Result<T, String> {
    let body = body.map_err(|e| e.to_string())?;
    serde_json::from_slice(&body).map_err(|e| format!("Invalid request payload: {e}"))
}

/// Default session and user agent from the request when the row omits them
fn fill_client_fields(session_id: &mut String, user_agent: &mut String, headers: &HeaderMap) {
    if session_id.is_empty() {
        *session_id = session_from(headers);
    }
    if user_agent.is_empty() {
        if let Some(ua) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
            *user_agent = ua.to_string();
        }
    }
}

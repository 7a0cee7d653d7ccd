//! Contact-email endpoint
//!
//! Preflight, rate limit, parse, render, send. Every failure past the rate
//! limit becomes a 500 carrying the failure message.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Response, StatusCode};
use serde::Serialize;

use crate::config::AppState;
use crate::contact::email;
use crate::contact::form::ContactSubmission;
use crate::contact::rate_limit::{client_key, RateDecision};
use crate::http::{self, BodyError};
use crate::logger;
use crate::mailer::MailError;
use crate::telemetry::{AnalyticsEvent, ErrorLogEntry, Severity};

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const SUCCESS_MESSAGE: &str = "Email sent successfully";

/// Analytics event recorded for every delivered submission
pub const SUBMITTED_EVENT: &str = "contact_form_submitted";

/// Failure after the request was admitted
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error(transparent)]
    Body(#[from] BodyError),
    #[error("Invalid request payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Mail(#[from] MailError),
}

#[derive(Debug, Serialize)]
struct SuccessBody {
    success: bool,
    message: &'static str,
}

/// Handle one request on the contact path
pub async fn handle(
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

    if hardened {
        let key = client_key(headers);
        if let RateDecision::Limited { retry_after } = state.rate_limiter.check(&key) {
            logger::log_rate_limited(&key);
            let mut resp =
                http::error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE, hardened);
            let retry_secs = retry_after.as_secs().max(1).to_string();
            if let Ok(value) = retry_secs.parse::<hyper::header::HeaderValue>() {
                resp.headers_mut().insert("Retry-After", value);
            }
            return resp;
        }
    }

    match send_contact_email(body, headers, state).await {
        Ok(()) => http::json_response(
            StatusCode::OK,
            &SuccessBody {
                success: true,
                message: SUCCESS_MESSAGE,
            },
            hardened,
        ),
        Err(e) => {
            logger::log_error(&format!("[Contact] Error in contact email handler: {e}"));
            state.telemetry.log_error(failure_entry(&e, headers));
            http::error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), hardened)
        }
    }
}

async fn send_contact_email(
    body: Result<Bytes, BodyError>,
    headers: &HeaderMap,
    state: &AppState,
) -> Result<(), ContactError> {
    let body = body?;
    let submission: ContactSubmission = serde_json::from_slice(&body)?;
    logger::log_contact_received(submission.organization().is_some(), submission.budget().is_some());

    let outgoing = email::render(&submission, &state.config.contact, state.hardened());
    let receipt = state.mailer.send(&outgoing).await?;
    logger::log_email_sent(receipt.id.as_deref());

    state.telemetry.track_event(submitted_event(&submission, headers));
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn submitted_event(submission: &ContactSubmission, headers: &HeaderMap) -> AnalyticsEvent {
    let mut event = AnalyticsEvent::new(SUBMITTED_EVENT, header_str(headers, "origin"))
        .with_property("has_organization", submission.organization().is_some())
        .with_property("has_budget", submission.budget().is_some());
    event.session_id = session_from(headers);
    event.user_agent = header_str(headers, "user-agent").to_string();
    event.referrer = Some(header_str(headers, "referer"))
        .filter(|r| !r.is_empty())
        .map(ToString::to_string);
    event
}

fn failure_entry(err: &ContactError, headers: &HeaderMap) -> ErrorLogEntry {
    let kind = match err {
        ContactError::Body(_) => "request_body",
        ContactError::Parse(_) => "invalid_payload",
        ContactError::Mail(_) => "email_dispatch",
    };
    let mut entry = ErrorLogEntry::new(err.to_string(), Severity::High)
        .with_metadata("type", kind)
        .with_metadata("source", "send-contact-email");
    entry.session_id = session_from(headers);
    entry.user_agent = header_str(headers, "user-agent").to_string();
    entry.url = header_str(headers, "origin").to_string();
    entry
}

/// Session id supplied by the site, or a fresh one
pub fn session_from(headers: &HeaderMap) -> String {
    Some(header_str(headers, "x-session-id"))
        .filter(|s| !s.is_empty())
        .map_or_else(crate::telemetry::new_session_id, ToString::to_string)
}

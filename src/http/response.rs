//! HTTP response building module
//!
//! Every response of the service carries the CORS headers; hardened mode
//! adds the browser hardening headers on top.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Cross-origin headers attached to every response
pub const CORS_HEADERS: [(&str, &str); 2] = [
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "authorization, x-client-info, apikey, content-type",
    ),
];

/// Hardening headers attached in hardened mode
pub const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
];

/// Start a response with CORS (and optionally hardening) headers applied
pub fn base_builder(status: StatusCode, hardened: bool) -> Builder {
    let mut builder = Response::builder().status(status);
    for (name, value) in CORS_HEADERS {
        builder = builder.header(name, value);
    }
    if hardened {
        for (name, value) in SECURITY_HEADERS {
            builder = builder.header(name, value);
        }
    }
    builder
}

/// Build the CORS preflight response: 204, headers only
pub fn build_preflight_response(hardened: bool) -> Response<Full<Bytes>> {
    base_builder(StatusCode::NO_CONTENT, hardened)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build JSON response
pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    hardened: bool,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return error_fallback(hardened);
        }
    };

    base_builder(status, hardened)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build `{"error": message}` JSON response
pub fn error_response(status: StatusCode, message: &str, hardened: bool) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }), hardened)
}

/// Build 404 Not Found response
pub fn build_404_response(hardened: bool) -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found", hardened)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str, hardened: bool) -> Response<Full<Bytes>> {
    let body = r#"{"error":"Method Not Allowed"}"#;
    base_builder(StatusCode::METHOD_NOT_ALLOWED, hardened)
        .header("Content-Type", "application/json")
        .header("Allow", allow)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Build health check response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from(status.to_string())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from(status.to_string())))
        })
}

/// Stamp the `Server` header from `http.server_name`; an unusable name is skipped
pub fn apply_server_header(resp: &mut Response<Full<Bytes>>, server_name: &str) {
    if server_name.is_empty() {
        return;
    }
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            resp.headers_mut().insert(SERVER, value);
        }
        Err(e) => crate::logger::log_debug(&format!("Invalid server_name {server_name:?}: {e}")),
    }
}

fn error_fallback(hardened: bool) -> Response<Full<Bytes>> {
    let body = r#"{"error":"Internal server error"}"#;
    base_builder(StatusCode::INTERNAL_SERVER_ERROR, hardened)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from(body))))
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

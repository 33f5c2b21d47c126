//! HTTP response building module
//!
//! Builders for the status-code responses the edge emits itself, decoupled
//! from specific business logic. Builder failures degrade to a bare response
//! instead of panicking.

use crate::http::body::{self, BoxBody};
use hyper::{Response, StatusCode};

/// Build 404 Not Found response (the chain terminator)
pub fn not_found() -> Response<BoxBody> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(body::full("404 Not Found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(body::full("404 Not Found"))
        })
}

/// Build 416 Range Not Satisfiable response with no body
pub fn range_not_satisfiable(size: u64) -> Response<BoxBody> {
    Response::builder()
        .status(416)
        .header("Content-Range", format!("bytes */{size}"))
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(body::empty())
        })
}

/// Build 308 Permanent Redirect response
pub fn permanent_redirect(location: &str) -> Response<BoxBody> {
    Response::builder()
        .status(308)
        .header("Location", location)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("308", &e);
            Response::new(body::empty())
        })
}

/// Build 500 Internal Server Error response with a generic body
pub fn server_error() -> Response<BoxBody> {
    status_message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Build a plain-text response with an arbitrary status
pub fn status_message(status: StatusCode, message: &str) -> Response<BoxBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(body::full(message.to_string()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(body::full(message.to_string()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

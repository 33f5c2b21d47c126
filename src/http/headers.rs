//! Response header composition module
//!
//! Derives the cacheable header set for an indexed file. Composed once at
//! index build time and reused for every request against that file; only a
//! range or rewrite overrides Content-Length afterwards.

use crate::http::mime;
use chrono::{DateTime, Utc};
use hyper::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use std::time::SystemTime;

/// Compose the precomputed header set for a file.
///
/// Content-Type comes from the extension lookup; `text/html` gains a UTF-8
/// charset parameter. Last-Modified is the HTTP-date form of the mtime.
pub fn compose(
    extension: Option<&str>,
    size: u64,
    mtime: SystemTime,
    cache_control: &str,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let ctype = match mime::content_type(extension) {
        "text/html" => "text/html; charset=utf-8",
        other => other,
    };
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(ctype));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(
        LAST_MODIFIED,
        HeaderValue::from_str(&http_date(mtime))
            .unwrap_or_else(|_| HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT")),
    );
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=0")),
    );

    headers
}

/// Format a timestamp as an RFC 7231 fixdate (e.g. `Tue, 15 Nov 1994 08:12:31 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

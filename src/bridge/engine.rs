//! Upstream engine interface module
//!
//! The response-producing engine is an external collaborator; this module
//! pins down the boundary: a normalized request descriptor in, a
//! status/headers/body triple out, with the body as a lazily produced chunk
//! sequence that is consumed at most once.

use crate::http::body::BoxError;
use crate::middleware::BoxFuture;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{Method, StatusCode};
use std::collections::VecDeque;
use std::fmt;

/// Lazily produced body chunk sequence.
pub trait BodySource: Send {
    /// Next chunk; `None` when the body is exhausted.
    fn next(&mut self) -> BoxFuture<'_, Option<Result<Bytes, BoxError>>>;

    /// Stop producing chunks, optionally carrying the error that triggered
    /// the teardown. The bridge calls this at most once per body.
    fn cancel(&mut self, reason: Option<BoxError>);
}

/// Body of an upstream response.
pub enum UpstreamBody {
    /// No body; the response is closed right after the headers.
    None,
    /// Live chunk sequence, consumed exactly once by the pump.
    Stream(Box<dyn BodySource>),
    /// The body was read before reaching the bridge. A programming-contract
    /// violation surfaced to the client as a diagnostic, not a crash.
    Consumed,
}

/// Response produced once per request by the upstream engine.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

/// Normalized request descriptor handed to the engine.
pub struct EngineRequest {
    pub method: Method,
    /// Absolute URL: resolved origin plus the request path and query.
    pub url: String,
    pub headers: HeaderMap,
    /// Request body, already collected under the configured size cap.
    pub body: Bytes,
    /// Resolved client address (trusted header or transport peer).
    pub client_addr: String,
}

/// Structured engine rejection carrying an HTTP status.
#[derive(Debug)]
pub struct EngineError {
    pub status: StatusCode,
    pub message: String,
}

impl EngineError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for EngineError {}

/// The upstream engine. Shared read-only across concurrent requests; it must
/// be safe for concurrent invocation.
pub trait UpstreamEngine: Send + Sync {
    fn respond<'a>(
        &'a self,
        req: EngineRequest,
    ) -> BoxFuture<'a, Result<UpstreamResponse, EngineError>>;
}

/// In-memory chunk sequence, used by [`StaticOnly`] and convenient in tests.
pub struct ChunkSource {
    chunks: VecDeque<Bytes>,
}

impl ChunkSource {
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

impl BodySource for ChunkSource {
    fn next(&mut self) -> BoxFuture<'_, Option<Result<Bytes, BoxError>>> {
        Box::pin(async move { self.chunks.pop_front().map(Ok) })
    }

    fn cancel(&mut self, _reason: Option<BoxError>) {
        self.chunks.clear();
    }
}

/// Engine used when the binary runs without an embedded application: every
/// request that reaches the bridge answers 404.
pub struct StaticOnly;

impl UpstreamEngine for StaticOnly {
    fn respond<'a>(
        &'a self,
        _req: EngineRequest,
    ) -> BoxFuture<'a, Result<UpstreamResponse, EngineError>> {
        Box::pin(async {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            Ok(UpstreamResponse {
                status: StatusCode::NOT_FOUND,
                headers,
                body: UpstreamBody::Stream(Box::new(ChunkSource::new([Bytes::from_static(
                    b"404 Not Found",
                )]))),
            })
        })
    }
}

//! Static file serving module
//!
//! Composes the file index, candidate resolution, range evaluation, and
//! content rewriting into a chain handler. A miss falls through to the next
//! handler; this handler never emits a 404 itself.

pub mod index;
pub mod resolve;
pub mod rewrite;

pub use index::{FileIndex, IndexEntry};
pub use rewrite::ContentRewriter;

use crate::http::range::{evaluate_range, RangeOutcome};
use crate::http::body::{self, BoxBody};
use crate::http::{self, decode_path};
use crate::logger;
use crate::middleware::{Attempt, BoxFuture, Handler};
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
};
use hyper::{Method, Request, Response, StatusCode};

/// Hook invoked on every hit to customize the precomputed headers, e.g. to
/// mark content-hashed build output as immutable.
pub type HeaderHook = Box<dyn Fn(&mut HeaderMap, &str) + Send + Sync>;

pub struct StaticServer {
    index: FileIndex,
    extensions: Vec<String>,
    fallback: String,
    rewriter: ContentRewriter,
    header_hook: Option<HeaderHook>,
}

impl StaticServer {
    pub fn new(
        index: FileIndex,
        extensions: Vec<String>,
        fallback: impl Into<String>,
        rewriter: ContentRewriter,
    ) -> Self {
        Self {
            index,
            extensions,
            fallback: fallback.into(),
            rewriter,
            header_hook: None,
        }
    }

    #[must_use]
    pub fn with_header_hook(mut self, hook: HeaderHook) -> Self {
        self.header_hook = Some(hook);
        self
    }

    /// Probe the candidates for `path`, then the same generation against the
    /// configured fallback path.
    pub fn lookup(&self, path: &str) -> Option<&IndexEntry> {
        for key in resolve::candidates(path, &self.extensions) {
            if let Some(entry) = self.index.lookup(&key) {
                return Some(entry);
            }
        }
        for key in resolve::candidates(&self.fallback, &self.extensions) {
            if let Some(entry) = self.index.lookup(&key) {
                return Some(entry);
            }
        }
        None
    }

    /// Resolve and serve a decoded request path. `None` means the request is
    /// not ours and control passes to the next handler.
    pub async fn serve(
        &self,
        path: &str,
        range_header: Option<&str>,
        is_head: bool,
    ) -> Option<Response<BoxBody>> {
        let entry = self.lookup(path)?;

        let mut headers = entry.headers.clone();
        if let Some(hook) = &self.header_hook {
            hook(&mut headers, path);
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Translatable types take the rewrite path; range math operates on
        // disk offsets that rewriting would invalidate, so a Range header is
        // ignored here.
        if self.rewriter.applies_to(&content_type) {
            return Some(self.serve_rewritten(entry, headers, is_head).await);
        }

        match evaluate_range(range_header, entry.size) {
            RangeOutcome::Unsatisfiable => Some(http::response::range_not_satisfiable(entry.size)),
            RangeOutcome::Full => Some(stream_entry(
                StatusCode::OK,
                headers,
                entry,
                0,
                entry.size,
                is_head,
            )),
            RangeOutcome::Partial(window) => {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(window.byte_len()));
                let range = format!("bytes {}-{}/{}", window.start, window.end, entry.size);
                headers.insert(
                    CONTENT_RANGE,
                    HeaderValue::from_str(&range)
                        .unwrap_or_else(|_| HeaderValue::from_static("bytes */0")),
                );
                headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
                Some(stream_entry(
                    StatusCode::PARTIAL_CONTENT,
                    headers,
                    entry,
                    window.start,
                    window.byte_len(),
                    is_head,
                ))
            }
        }
    }

    /// Full read, one substitution pass, Content-Length recomputed from the
    /// rewritten byte length.
    async fn serve_rewritten(
        &self,
        entry: &IndexEntry,
        mut headers: HeaderMap,
        is_head: bool,
    ) -> Response<BoxBody> {
        match tokio::fs::read_to_string(&entry.abs).await {
            Ok(text) => {
                let rewritten = self.rewriter.apply(&text);
                headers.insert(CONTENT_LENGTH, HeaderValue::from(rewritten.len() as u64));
                let body = if is_head {
                    body::empty()
                } else {
                    body::full(Bytes::from(rewritten.into_bytes()))
                };
                with_headers(StatusCode::OK, headers, body)
            }
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    entry.abs.display()
                ));
                http::response::server_error()
            }
        }
    }
}



fn stream_entry(
    status: StatusCode,
    headers: HeaderMap,
    entry: &IndexEntry,
    start: u64,
    len: u64,
    is_head: bool,
) -> Response<BoxBody> {
    let body = if is_head {
        body::empty()
    } else {
        body::file_stream(entry.abs.clone(), start, len)
    };
    with_headers(status, headers, body)
}

fn with_headers(
    status: StatusCode,
    headers: HeaderMap,
    body: BoxBody,
) -> Response<BoxBody> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    *resp.headers_mut() = headers;
    resp
}

impl<B: Send + 'static> Handler<B> for StaticServer {
    fn attempt<'a>(&'a self, req: Request<B>) -> BoxFuture<'a, Attempt<B>> {
        Box::pin(async move {
            let method = req.method();
            if method != Method::GET && method != Method::HEAD {
                return Err(req);
            }
            let is_head = method == Method::HEAD;
            let path = decode_path(req.uri().path());
            let range_header = req
                .headers()
                .get(hyper::header::RANGE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);

            match self.serve(&path, range_header.as_deref(), is_head).await {
                Some(resp) => Ok(resp),
                None => Err(req),
            }
        })
    }
}

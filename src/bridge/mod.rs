//! Streaming response bridge module
//!
//! Adapts an upstream engine response to the outbound transport: request
//! normalization under a body-size cap, client address resolution, header
//! translation, and the chunk pump. The terminal handler of the chain.

pub mod addr;
pub mod engine;
pub mod pump;

pub use engine::{
    BodySource, ChunkSource, EngineError, EngineRequest, StaticOnly, UpstreamBody,
    UpstreamEngine, UpstreamResponse,
};

use crate::config::EdgeConfig;
use crate::http::body::{self, BoxBody, BoxError};
use crate::http::response;
use crate::logger;
use crate::middleware::{Attempt, BoxFuture, Handler};
use crate::static_files::ContentRewriter;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;

/// Peer address of the accepted connection, injected as a request extension
/// by the connection loop.
#[derive(Clone, Copy, Debug)]
pub struct PeerAddr(pub SocketAddr);

pub struct Bridge<E> {
    engine: Arc<E>,
    cfg: EdgeConfig,
    rewriter: ContentRewriter,
}

impl<E: UpstreamEngine> Bridge<E> {
    pub fn new(engine: Arc<E>, cfg: EdgeConfig, rewriter: ContentRewriter) -> Self {
        Self {
            engine,
            cfg,
            rewriter,
        }
    }

    /// Base origin for the normalized request URL: the configured override,
    /// or protocol/host derived from trusted headers.
    fn origin(&self, headers: &HeaderMap) -> String {
        if let Some(origin) = &self.cfg.origin {
            return origin.clone();
        }
        let protocol = self
            .cfg
            .protocol_header
            .as_deref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        let host = headers
            .get(self.cfg.host_header.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        format!("{protocol}://{host}")
    }

    async fn serve<B>(&self, req: Request<B>) -> Response<BoxBody>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let peer = req.extensions().get::<PeerAddr>().map(|p| p.0);
        let (parts, inbound_body) = req.into_parts();

        // The only bridge-local termination before the engine is invoked:
        // the request body cannot be read under the configured cap.
        let collected = match Limited::new(inbound_body, self.cfg.body_size_limit)
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                logger::log_warning(&format!("failed to read request body: {e}"));
                let status = if e.is::<LengthLimitError>() {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                return response::status_message(status, "Invalid request body");
            }
        };

        let client_addr = match addr::resolve_client_addr(
            &parts.headers,
            peer,
            self.cfg.address_header.as_deref(),
            self.cfg.xff_depth,
        ) {
            Ok(addr) => addr,
            Err(violation) => {
                logger::log_error(&violation);
                return response::server_error();
            }
        };

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", hyper::http::uri::PathAndQuery::as_str);
        let url = format!("{}{path_and_query}", self.origin(&parts.headers));

        let engine_req = EngineRequest {
            method: parts.method,
            url,
            headers: parts.headers,
            body: collected,
            client_addr,
        };

        match self.engine.respond(engine_req).await {
            Ok(upstream) => self.translate(upstream),
            Err(e) => {
                logger::log_warning(&format!("upstream engine rejected request: {e}"));
                response::status_message(e.status, "Invalid request body")
            }
        }
    }

    /// Copy status and headers onto the outbound response and wire up the
    /// body pump.
    fn translate(&self, upstream: UpstreamResponse) -> Response<BoxBody> {
        let mut headers = upstream.headers;
        // the body is re-streamed, not passed through verbatim, so the
        // transport recomputes framing
        headers.remove(CONTENT_LENGTH);

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let outbound = match upstream.body {
            UpstreamBody::None => body::empty(),
            UpstreamBody::Consumed => {
                logger::log_defect(
                    "upstream response body was already consumed before streaming",
                );
                body::full(
                    "Fatal error: response body was already read and cannot be streamed",
                )
            }
            UpstreamBody::Stream(source) => {
                let rewriter = self
                    .rewriter
                    .applies_to(&content_type)
                    .then(|| self.rewriter.clone());
                let (tx, channel_body) = body::channel();
                tokio::spawn(pump::pump(source, tx, rewriter));
                channel_body.boxed()
            }
        };

        let mut resp = Response::new(outbound);
        *resp.status_mut() = upstream.status;
        *resp.headers_mut() = headers;
        resp
    }
}

impl<B, E> Handler<B> for Bridge<E>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    E: UpstreamEngine + 'static,
{
    fn attempt<'a>(&'a self, req: Request<B>) -> BoxFuture<'a, Attempt<B>> {
        Box::pin(async move { Ok(self.serve(req).await) })
    }
}

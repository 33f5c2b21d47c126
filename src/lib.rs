//! edgeserve — the request-handling edge of a server process.
//!
//! For every inbound HTTP request the edge either serves a pre-built static
//! asset (immutable file index, byte-range support, selective content
//! rewriting) or hands the request to an upstream response-producing engine
//! and streams the engine's output back under backpressure.

pub mod bridge;
pub mod config;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod prerendered;
pub mod static_files;

//! Handler chain module
//!
//! Ordered dispatch across request handlers. Each handler either produces a
//! response (short-circuiting the chain) or hands the request back untouched
//! for the next handler. Ordering is the only composition primitive.

use crate::http::body::BoxBody;
use crate::http::response;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `Ok` carries the response; `Err` gives the request back so the next
/// handler can try it.
pub type Attempt<B> = Result<Response<BoxBody>, Request<B>>;

/// A link in the chain. Generic over the request body so handlers that never
/// touch the body are testable without a live connection.
pub trait Handler<B>: Send + Sync {
    fn attempt<'a>(&'a self, req: Request<B>) -> BoxFuture<'a, Attempt<B>>;
}

/// Ordered sequence of handlers with a 404 terminator.
pub struct Chain<B> {
    handlers: Vec<Box<dyn Handler<B>>>,
}

impl<B> Chain<B> {
    pub fn new(handlers: Vec<Box<dyn Handler<B>>>) -> Self {
        Self { handlers }
    }

    /// Invoke handlers strictly in order; the first response wins. After the
    /// last handler the terminator answers 404.
    pub async fn dispatch(&self, mut req: Request<B>) -> Response<BoxBody> {
        for handler in &self.handlers {
            match handler.attempt(req).await {
                Ok(resp) => return resp,
                Err(back) => req = back,
            }
        }
        response::not_found()
    }
}

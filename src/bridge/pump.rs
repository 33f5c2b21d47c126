//! Body pump module
//!
//! The read-transform-write cycle that moves an upstream body to the outbound
//! channel. Channel capacity is reserved *before* the next upstream chunk is
//! pulled, so a full outbound buffer suspends the upstream read until the
//! client drains. Cancellation runs exactly once, whichever side fails first.

use super::engine::BodySource;
use crate::http::body::FrameResult;
use crate::static_files::ContentRewriter;
use hyper::body::Frame;
use tokio::sync::mpsc;

/// Pump the upstream body into the outbound frame channel.
///
/// Chunks pass through `rewriter` when one is supplied (the response content
/// type was judged translatable by the caller); everything else is forwarded
/// byte-identical. Chunk order is preserved.
pub async fn pump(
    mut source: Box<dyn BodySource>,
    tx: mpsc::Sender<FrameResult>,
    rewriter: Option<ContentRewriter>,
) {
    loop {
        // Backpressure: acquire outbound capacity before reading upstream.
        let permit = match tx.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                // client went away between chunks
                source.cancel(None);
                return;
            }
        };

        let chunk = tokio::select! {
            () = tx.closed() => {
                source.cancel(None);
                return;
            }
            chunk = source.next() => chunk,
        };

        match chunk {
            None => return, // body exhausted
            Some(Ok(data)) => {
                let data = match &rewriter {
                    Some(r) => r.apply_chunk(&data),
                    None => data,
                };
                permit.send(Ok(Frame::data(data)));
            }
            Some(Err(e)) => {
                source.cancel(None);
                permit.send(Err(e));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::{self, BoxError, CHANNEL_DEPTH};
    use hyper::body::{Body, Bytes};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll, Waker};

    /// Source that counts reads and cancellations.
    struct Counting {
        chunks: Vec<Bytes>,
        reads: Arc<AtomicUsize>,
        cancels: Arc<AtomicUsize>,
        fail_at: Option<usize>,
    }

    impl Counting {
        fn new(n: usize) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let reads = Arc::new(AtomicUsize::new(0));
            let cancels = Arc::new(AtomicUsize::new(0));
            let chunks = (0..n)
                .map(|i| Bytes::from(format!("chunk-{i}")))
                .collect();
            (
                Self {
                    chunks,
                    reads: reads.clone(),
                    cancels: cancels.clone(),
                    fail_at: None,
                },
                reads,
                cancels,
            )
        }
    }

    impl BodySource for Counting {
        fn next(
            &mut self,
        ) -> Pin<Box<dyn Future<Output = Option<Result<Bytes, BoxError>>> + Send + '_>> {
            Box::pin(async move {
                let n = self.reads.fetch_add(1, Ordering::SeqCst);
                if self.fail_at == Some(n) {
                    return Some(Err("simulated upstream fault".into()));
                }
                if n < self.chunks.len() {
                    Some(Ok(self.chunks[n].clone()))
                } else {
                    None
                }
            })
        }

        fn cancel(&mut self, _reason: Option<BoxError>) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn poll_once<F: Future<Output = ()>>(fut: &mut Pin<Box<F>>) -> Poll<()> {
        let mut cx = Context::from_waker(Waker::noop());
        fut.as_mut().poll(&mut cx)
    }

    fn recv_frame(rx: &mut body::ChannelBody) -> Option<Bytes> {
        let mut cx = Context::from_waker(Waker::noop());
        match Pin::new(rx).poll_frame(&mut cx) {
            Poll::Ready(Some(Ok(frame))) => frame.into_data().ok(),
            _ => None,
        }
    }

    #[test]
    fn test_backpressure_suspends_upstream_reads() {
        let (source, reads, _) = Counting::new(CHANNEL_DEPTH + 10);
        let (tx, mut rx) = body::channel();
        let mut fut = Box::pin(pump(Box::new(source), tx, None));

        // the pump fills the outbound queue and then suspends on reserve,
        // before pulling another upstream chunk
        assert!(poll_once(&mut fut).is_pending());
        assert_eq!(reads.load(Ordering::SeqCst), CHANNEL_DEPTH);

        // repolling without draining reads nothing more
        assert!(poll_once(&mut fut).is_pending());
        assert_eq!(reads.load(Ordering::SeqCst), CHANNEL_DEPTH);

        // draining one frame frees exactly one slot: consumption resumes at
        // the next chunk, not a re-read of the last one
        let first = recv_frame(&mut rx).unwrap();
        assert_eq!(&first[..], b"chunk-0");
        assert!(poll_once(&mut fut).is_pending());
        assert_eq!(reads.load(Ordering::SeqCst), CHANNEL_DEPTH + 1);
        let second = recv_frame(&mut rx).unwrap();
        assert_eq!(&second[..], b"chunk-1");
    }

    #[test]
    fn test_client_gone_cancels_exactly_once() {
        let (source, _, cancels) = Counting::new(5);
        let (tx, mut rx) = body::channel();
        let mut fut = Box::pin(pump(Box::new(source), tx, None));

        assert!(poll_once(&mut fut).is_pending());
        // consume 3 of 5, then simulate the transport dying
        for _ in 0..3 {
            recv_frame(&mut rx).unwrap();
        }
        drop(rx);

        assert!(poll_once(&mut fut).is_ready());
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completed_body_never_cancels() {
        let (source, reads, cancels) = Counting::new(2);
        let (tx, mut rx) = body::channel();
        let mut fut = Box::pin(pump(Box::new(source), tx, None));

        assert!(poll_once(&mut fut).is_ready());
        assert_eq!(reads.load(Ordering::SeqCst), 3); // 2 chunks + end-of-body
        assert_eq!(cancels.load(Ordering::SeqCst), 0);
        assert_eq!(&recv_frame(&mut rx).unwrap()[..], b"chunk-0");
        assert_eq!(&recv_frame(&mut rx).unwrap()[..], b"chunk-1");
    }

    #[test]
    fn test_upstream_fault_cancels_and_forwards_error() {
        let (mut source, _, cancels) = Counting::new(5);
        source.fail_at = Some(1);
        let (tx, mut rx) = body::channel();
        let mut fut = Box::pin(pump(Box::new(source), tx, None));

        assert!(poll_once(&mut fut).is_ready());
        assert_eq!(cancels.load(Ordering::SeqCst), 1);

        // first frame is data, second is the forwarded error
        assert!(recv_frame(&mut rx).is_some());
        let mut cx = Context::from_waker(Waker::noop());
        match Pin::new(&mut rx).poll_frame(&mut cx) {
            Poll::Ready(Some(Err(_))) => {}
            other => panic!("expected forwarded error, got {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_pass_applies_to_chunks() {
        let source = ChunkListSource(vec![Bytes::from_static(b"Email me")]);
        let (tx, mut rx) = body::channel();
        let rewriter = ContentRewriter::new(vec!["text/html".to_string()], "Email", "E-mail");
        let mut fut = Box::pin(pump(Box::new(source), tx, Some(rewriter)));

        assert!(poll_once(&mut fut).is_ready());
        assert_eq!(&recv_frame(&mut rx).unwrap()[..], b"E-mail me");
    }

    struct ChunkListSource(Vec<Bytes>);

    impl BodySource for ChunkListSource {
        fn next(
            &mut self,
        ) -> Pin<Box<dyn Future<Output = Option<Result<Bytes, BoxError>>> + Send + '_>> {
            Box::pin(async move {
                if self.0.is_empty() {
                    None
                } else {
                    Some(Ok(self.0.remove(0)))
                }
            })
        }

        fn cancel(&mut self, _reason: Option<BoxError>) {
            self.0.clear();
        }
    }
}

//! Streaming body plumbing
//!
//! Response bodies are either fully materialized (`full`/`empty`) or fed
//! through a bounded channel whose receiving half implements
//! [`hyper::body::Body`]. The channel is the backpressure boundary: senders
//! must reserve capacity before producing, so a slow client suspends the
//! producer instead of growing a buffer.

use http_body_util::combinators;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Bytes, Frame};
use std::io::SeekFrom;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type BoxBody = combinators::BoxBody<Bytes, BoxError>;

/// Outbound chunk queue depth. Producers suspend once this many frames are
/// waiting for the client.
pub const CHANNEL_DEPTH: usize = 4;

/// Read chunk size for disk streaming.
const FILE_CHUNK: usize = 64 * 1024;

pub type FrameResult = Result<Frame<Bytes>, BoxError>;

/// Fully materialized body.
pub fn full(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Body with no frames at all.
pub fn empty() -> BoxBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Create a bounded frame channel and the response body that drains it.
pub fn channel() -> (mpsc::Sender<FrameResult>, ChannelBody) {
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    (tx, ChannelBody { rx })
}

/// Response body backed by a bounded frame channel.
///
/// Dropping the body closes the channel, which is how producers learn that
/// the client went away.
pub struct ChannelBody {
    rx: mpsc::Receiver<FrameResult>,
}

impl ChannelBody {
    pub fn boxed(self) -> BoxBody {
        BodyExt::boxed(self)
    }
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<FrameResult>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Stream `len` bytes of a file starting at byte `start`, without
/// materializing the file in memory. Serving cost is independent of file
/// size.
pub fn file_stream(path: PathBuf, start: u64, len: u64) -> BoxBody {
    let (tx, body) = channel();

    tokio::spawn(async move {
        let mut file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) => {
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        };

        if start > 0 {
            if let Err(e) = file.seek(SeekFrom::Start(start)).await {
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        }

        let mut remaining = len;
        let mut buf = vec![0u8; FILE_CHUNK];
        while remaining > 0 {
            let want = usize::try_from(remaining).map_or(FILE_CHUNK, |r| r.min(FILE_CHUNK));
            match file.read(&mut buf[..want]).await {
                Ok(0) => break,
                Ok(n) => {
                    remaining -= n as u64;
                    let frame = Frame::data(Bytes::copy_from_slice(&buf[..n]));
                    if tx.send(Ok(frame)).await.is_err() {
                        break; // client went away
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e.into())).await;
                    break;
                }
            }
        }
    });

    body.boxed()
}

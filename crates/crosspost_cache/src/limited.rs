//! Reader that refuses to yield more than a fixed number of bytes.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Wraps a reader and fails with `InvalidData` once more than `limit` bytes
/// have been read, instead of silently truncating.
///
/// Bytes handed to the consumer are tallied in a shared counter that stays
/// readable after the reader itself has been given away.
pub(crate) struct LimitedReader<R> {
    inner: R,
    limit: u64,
    seen: u64,
    delivered: Arc<AtomicU64>,
}

impl<R> LimitedReader<R> {
    pub(crate) fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            seen: 0,
            delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Tally of bytes delivered so far.
    pub(crate) fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.delivered)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LimitedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                this.seen += (buf.filled().len() - before) as u64;
                if this.seen > this.limit {
                    // Hide the over-limit chunk from the consumer.
                    buf.set_filled(before);
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("body exceeds {} bytes", this.limit),
                    )));
                }
                this.delivered.store(this.seen, Ordering::Release);
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn passes_bodies_within_limit() {
        let mut reader = LimitedReader::new(&b"hello"[..], 5);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn counter_tracks_delivered_bytes() {
        let reader = LimitedReader::new(&b"twelve bytes"[..], 64);
        let counter = reader.counter();
        let mut boxed = Box::pin(reader);
        let mut out = Vec::new();
        boxed.read_to_end(&mut out).await.unwrap();
        drop(boxed);
        assert_eq!(counter.load(Ordering::Acquire), 12);
    }

    #[tokio::test]
    async fn fails_past_limit() {
        let body = vec![1u8; 1024];
        let mut reader = LimitedReader::new(&body[..], 100);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(out.len() <= 100);
    }
}

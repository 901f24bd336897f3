//! A sink that gzip-compresses everything written to it before handing the
//! compressed bytes to an inner byte sink (normally a file).
//!
//! Writes go to the compressor, never straight to the inner sink. Closing
//! finishes the compressor, forwards the trailer, and then closes the inner
//! sink; the composite reports completion only after the inner sink has
//! confirmed its own close. A failure in either stage is returned as the
//! composite's error, including inner failures that happen after the
//! compressor has already accepted the bytes.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::Sink;

use feature_stream_file::compression::GzipEncoder;

pub struct CompressingSink<S> {
    encoder: GzipEncoder,
    inner: S,
    /// Compressed chunks not yet accepted by `inner`.
    pending: VecDeque<Bytes>,
}

impl<S> CompressingSink<S>
where
    S: Sink<Bytes, Error = io::Error> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            encoder: GzipEncoder::default(),
            inner,
            pending: VecDeque::new(),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    fn queue(&mut self, chunk: Bytes) {
        if !chunk.is_empty() {
            self.pending.push_back(chunk);
        }
    }

    /// Push queued compressed chunks into the inner sink.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.pending.is_empty() {
            ready!(Pin::new(&mut self.inner).poll_ready(cx))?;
            if let Some(chunk) = self.pending.pop_front() {
                Pin::new(&mut self.inner).start_send(chunk)?;
            }
        }
        Poll::Ready(Ok(()))
    }
}

impl<S> Sink<Bytes> for CompressingSink<S>
where
    S: Sink<Bytes, Error = io::Error> + Unpin,
{
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().poll_drain(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        let this = self.get_mut();
        let compressed = this.encoder.encode(&item)?;
        this.queue(compressed);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.encoder.is_finished() {
            let trailer = this.encoder.finish()?;
            this.queue(trailer);
        }
        ready!(this.poll_drain(cx))?;
        ready!(Pin::new(&mut this.inner).poll_close(cx))?;
        tracing::debug!("Compressed sink closed");
        Poll::Ready(Ok(()))
    }
}

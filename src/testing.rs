//! Test doubles for plugins and sinks.
//!
//! [`MemoryPlugin`] serves a scheme from an in-memory map, which makes
//! registry priority and pipeline wiring observable without touching the
//! filesystem or the network. [`RecordingSink`] records what reaches it and
//! when it closes, into an [`EventLog`] shared with the test.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{stream, Sink, StreamExt};

use crate::config::ConnectionOptions;
use crate::connection::connection_type;
use crate::error::{Error, Result};
use crate::plugin::Plugin;
use crate::stream::{ByteSink, ByteStream};
use feature_stream_file::ResponseCallback;

/// Ordered list of events shared between a test and its doubles.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Byte sink that keeps everything written to it.
///
/// Its close can be delayed by a number of polls, or made to fail, to
/// exercise the completion behavior of sinks layered on top of it.
pub struct RecordingSink {
    log: EventLog,
    data: Vec<u8>,
    close_polls_left: usize,
    fail_on_close: bool,
}

impl RecordingSink {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            data: Vec::new(),
            close_polls_left: 0,
            fail_on_close: false,
        }
    }

    /// Report `Pending` from the first `polls` calls to `poll_close`.
    pub fn close_after_polls(mut self, polls: usize) -> Self {
        self.close_polls_left = polls;
        self
    }

    pub fn fail_on_close(mut self) -> Self {
        self.fail_on_close = true;
        self
    }

    pub fn written(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl Sink<Bytes> for RecordingSink {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        self.get_mut().data.extend_from_slice(&item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.close_polls_left > 0 {
            this.close_polls_left -= 1;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        if this.fail_on_close {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "device full",
            )));
        }
        this.log.push("inner closed");
        Poll::Ready(Ok(()))
    }
}

type Store = Arc<Mutex<HashMap<String, Vec<u8>>>>;

/// Plugin serving one scheme (`<scheme>://...`) from memory.
///
/// Reads yield the stored bytes in chunks of `chunk_size` (default 4, set
/// through the `chunk_size` registration option); writes replace the stored
/// bytes when the sink closes.
pub struct MemoryPlugin {
    name: String,
    scheme: String,
    chunk_size: AtomicUsize,
    store: Store,
}

impl MemoryPlugin {
    pub fn new(scheme: &str) -> Self {
        Self::named("memory", scheme)
    }

    pub fn named(name: &str, scheme: &str) -> Self {
        Self {
            name: name.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            chunk_size: AtomicUsize::new(4),
            store: Store::default(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.load(Ordering::Relaxed)
    }

    pub fn insert(&self, id: &str, data: impl Into<Vec<u8>>) {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), data.into());
    }

    pub fn contents(&self, id: &str) -> Option<Vec<u8>> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl Plugin for MemoryPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, options: &ConnectionOptions) -> Result<()> {
        if let Some(value) = options.get("chunk_size") {
            let size: usize = value
                .parse()
                .map_err(|e| Error::invalid_option("chunk_size", value, e))?;
            self.chunk_size.store(size.max(1), Ordering::Relaxed);
        }
        Ok(())
    }

    fn handles(&self, id: &str, _options: &ConnectionOptions) -> bool {
        connection_type(id) == self.scheme
    }

    fn create_read_source(&self, id: &str, options: &ConnectionOptions) -> Result<ByteStream> {
        self.ensure_handles(id, options)?;
        let data = self.contents(id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no entry for {id}"))
        })?;
        let chunks: Vec<io::Result<Bytes>> = data
            .chunks(self.chunk_size())
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    fn create_write_stream(
        &self,
        id: &str,
        options: &ConnectionOptions,
        _on_response: Option<ResponseCallback>,
    ) -> Result<ByteSink> {
        self.ensure_handles(id, options)?;
        Ok(Box::pin(MemorySink {
            id: id.to_string(),
            data: Vec::new(),
            store: self.store.clone(),
        }))
    }
}

struct MemorySink {
    id: String,
    data: Vec<u8>,
    store: Store,
}

impl Sink<Bytes> for MemorySink {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        self.get_mut().data.extend_from_slice(&item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let data = std::mem::take(&mut this.data);
        this.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(this.id.clone(), data);
        Poll::Ready(Ok(()))
    }
}

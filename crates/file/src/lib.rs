//! Byte-level primitives for feature-stream: local files, HTTP/HTTPS, and gzip.
//!
//! This crate provides the capabilities the feature-stream core calls through
//! narrow interfaces. Everything here moves raw bytes; nothing interprets them.
//!
//! # Primitives
//!
//! - **Local**: open a byte source or byte sink for a filesystem path
//! - **HTTP/HTTPS**: issue a request and await the response
//! - **Gzip**: compress or decompress a chunk stream
//! - **Channel sink**: a sink whose items are drained by a spawned task
//!
//! # Example
//!
//! ```ignore
//! use feature_stream_file::{compression, local, FileOptions};
//! use futures::StreamExt;
//!
//! let source = local::open_source("data.json.gz".as_ref(), &FileOptions::default())?;
//! let mut plain = compression::gunzip(source);
//! while let Some(chunk) = plain.next().await {
//!     let chunk = chunk?;
//!     // Process chunk...
//! }
//! ```

pub mod compression;
pub mod http;
pub mod local;
mod sink;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::Sink;
use std::pin::Pin;

pub use http::{HttpRequest, ResponseCallback};
pub use local::FileOptions;
pub use sink::ChannelSink;

/// Default chunk capacity for reading operations (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Number of chunks a channel-backed sink buffers before applying backpressure
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A pull-based source of raw byte chunks
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// A push-based consumer of raw byte chunks
pub type ByteSink = Pin<Box<dyn Sink<Bytes, Error = std::io::Error> + Send>>;

//! Stream types shared by every pipeline stage.

use crate::error::Error;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::Sink;
use std::pin::Pin;

pub use feature_stream_file::{ByteSink, ByteStream};

/// An opaque unit of data flowing through a pipeline.
pub type Record = Bytes;

/// A pull-based producer of records. The stream ends after its first error.
pub type RecordStream = BoxStream<'static, Result<Record, Error>>;

/// A push-based consumer of records.
///
/// `poll_close` completes only once every record has reached its final
/// destination.
pub type RecordSink = Pin<Box<dyn Sink<Record, Error = Error> + Send>>;

/// A stage that turns one record stream into another.
///
/// Plugins use transforms to decode raw bytes into records on the read side
/// and to encode records into bytes on the write side. Callers can insert
/// their own between pipelines, see [`make_transform`](crate::make_transform).
pub trait Transform: Send {
    fn apply(self: Box<Self>, input: RecordStream) -> RecordStream;
}

/// Pass-through stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn apply(self: Box<Self>, input: RecordStream) -> RecordStream {
        input
    }
}

/// Run `input` through `transform`.
pub fn pipe<T: Transform + 'static>(input: RecordStream, transform: T) -> RecordStream {
    Box::new(transform).apply(input)
}

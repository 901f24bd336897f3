//! Feature Stream
//!
//! A uniform streaming interface for reading and writing feature records
//! over local files and HTTP/HTTPS, with pluggable backends and per-record
//! transform stages.
//!
//! # Overview
//!
//! - A [`Registry`] holds [`Plugin`]s. Resolution asks them from the most
//!   recently registered to the first, so later plugins shadow earlier ones.
//! - [`Registry::from`] builds a record stream: the plugin's byte source
//!   followed by its read transform.
//! - [`Registry::to`] builds a record sink: the plugin's write transform
//!   followed by its byte sink.
//! - [`make_transform`] turns a mapping function into a stage that can be
//!   inserted between the two with [`pipe`].
//!
//! The [`DefaultPlugin`] handles plain paths (with transparent gzip for
//! `.gz` / `.gzip` files) and `http://` / `https://` URLs (with transparent
//! gzip for `Content-Encoding: gzip` responses).
//!
//! # Example
//!
//! ```rust,ignore
//! use feature_stream::{make_transform, pipe, ConnectionOptions, Mapped, Registry};
//! use futures::StreamExt;
//!
//! let registry = Registry::with_defaults();
//! let options = ConnectionOptions::new();
//!
//! let source = registry.from("https://example.com/features.json", &options)?;
//! let non_empty = pipe(source, make_transform(|record| async move {
//!     Ok::<_, std::io::Error>(if record.is_empty() { Mapped::Drop } else { Mapped::Keep(record) })
//! }));
//! non_empty.forward(registry.to("features.json.gz", &options)?).await?;
//! ```

pub mod compressing_sink;
pub mod config;
pub mod connection;
pub mod default_plugin;
pub mod error;
pub mod http_source;
mod pipeline;
pub mod plugin;
pub mod registry;
pub mod stream;
pub mod testing;
pub mod transform;

pub use compressing_sink::CompressingSink;
pub use config::{CompressionMode, ConnectionOptions};
pub use connection::{connection_type, has_authority};
pub use default_plugin::DefaultPlugin;
pub use error::{BoxError, Error, Result};
pub use feature_stream_file::ResponseCallback;
pub use http_source::{HttpSource, HttpSourceState};
pub use plugin::Plugin;
pub use registry::Registry;
pub use stream::{pipe, ByteSink, ByteStream, Identity, Record, RecordSink, RecordStream, Transform};
pub use transform::{make_transform, Mapped, RecordTransform};

//! The capability contract every backend implements.

use crate::config::ConnectionOptions;
use crate::error::{Error, Result};
use crate::stream::{ByteSink, ByteStream, Identity, Transform};
use feature_stream_file::ResponseCallback;

/// A backend that reads and writes some family of connections.
///
/// Plugins hold no per-connection state: every call receives the connection
/// identifier and options afresh. All four creation operations must fail
/// with [`Error::UnsupportedConnection`] when [`handles`](Self::handles) is
/// false for their arguments, even when called directly rather than through a
/// [`Registry`](crate::Registry). The provided transform methods already do;
/// implementors call [`ensure_handles`](Self::ensure_handles) in the others.
pub trait Plugin: Send + Sync {
    /// Name used in errors and logs.
    fn name(&self) -> &str;

    /// One-time setup, called by [`Registry::register`](crate::Registry::register).
    fn init(&self, _options: &ConnectionOptions) -> Result<()> {
        Ok(())
    }

    /// Whether this plugin takes responsibility for the connection.
    ///
    /// Must be a pure predicate: no I/O and no panics.
    fn handles(&self, id: &str, options: &ConnectionOptions) -> bool;

    /// Open the read side and return its raw byte source.
    fn create_read_source(&self, id: &str, options: &ConnectionOptions) -> Result<ByteStream>;

    /// Stage decoding the raw bytes of the read side into records.
    fn create_read_transform(
        &self,
        id: &str,
        options: &ConnectionOptions,
    ) -> Result<Box<dyn Transform>> {
        self.ensure_handles(id, options)?;
        Ok(Box::new(Identity))
    }

    /// Stage encoding records into raw bytes for the write side.
    fn create_write_transform(
        &self,
        id: &str,
        options: &ConnectionOptions,
    ) -> Result<Box<dyn Transform>> {
        self.ensure_handles(id, options)?;
        Ok(Box::new(Identity))
    }

    /// Open the write side and return its raw byte sink.
    ///
    /// `on_response` is invoked once a transport-level response exists; sinks
    /// without one (files) ignore it.
    fn create_write_stream(
        &self,
        id: &str,
        options: &ConnectionOptions,
        on_response: Option<ResponseCallback>,
    ) -> Result<ByteSink>;

    /// Fail with [`Error::UnsupportedConnection`] unless this plugin handles `id`.
    fn ensure_handles(&self, id: &str, options: &ConnectionOptions) -> Result<()> {
        if self.handles(id, options) {
            Ok(())
        } else {
            Err(Error::UnsupportedConnection {
                plugin: self.name().to_string(),
                connection: id.to_string(),
            })
        }
    }
}

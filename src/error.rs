//! Error types for feature streams.

use thiserror::Error;

/// Boxed error reported by a record transform callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building or running a feature stream pipeline.
///
/// `NoPluginFound`, `UnsupportedConnection`, `UnsupportedProtocol` and
/// `InvalidOption` are returned synchronously when a pipeline is built.
/// `Transform` and `Transport` arrive later as a stream's error item and end
/// that stream.
#[derive(Error, Debug)]
pub enum Error {
    /// No registered plugin claims the connection.
    #[error("No suitable plugin found for connection: {0}")]
    NoPluginFound(String),

    /// A plugin was asked to act on a connection it does not handle.
    #[error("Plugin '{plugin}' does not handle connection: {connection}")]
    UnsupportedConnection { plugin: String, connection: String },

    /// The connection names a scheme the plugin does not implement.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// A recognized connection option has an unusable value.
    #[error("Invalid value '{value}' for option '{key}': {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    /// A record transform callback reported failure.
    #[error("Record transform failed: {0}")]
    Transform(#[source] BoxError),

    /// The underlying file or network primitive failed.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_option(
        key: &str,
        value: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Built-in plugin for local files and HTTP/HTTPS.
//!
//! Dispatch is by connection type:
//!
//! - `file`: a filesystem byte source or sink. Paths ending in `.gz` or
//!   `.gzip` (any case) are transparently decompressed on read and compressed
//!   on write; the `compression` option can force or disable this.
//! - `http` / `https`: reads go through [`HttpSource`] (default `GET`),
//!   writes stream the request body (default `POST`) and deliver the response
//!   to the caller's callback.
//!
//! Any other scheme is left to other plugins: [`DefaultPlugin::handles`]
//! returns false for it.

use std::path::Path;

use reqwest::Method;

use feature_stream_file::{compression, local, HttpRequest, ResponseCallback};

use crate::compressing_sink::CompressingSink;
use crate::config::{CompressionMode, ConnectionOptions};
use crate::connection::{self, connection_type, has_authority};
use crate::error::{Error, Result};
use crate::http_source::HttpSource;
use crate::plugin::Plugin;
use crate::stream::{ByteSink, ByteStream};

const HTTP: &str = "http";
const HTTPS: &str = "https";

/// The plugin a [`Registry::with_defaults`](crate::Registry::with_defaults) starts with.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlugin;

impl DefaultPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// The outbound request for `id`; option overrides may not leave HTTP(S).
fn http_request(id: &str, options: &ConnectionOptions, method: Method) -> Result<HttpRequest> {
    let request = options.http_request(id, method)?;
    match request.url.scheme() {
        HTTP | HTTPS => Ok(request),
        other => Err(Error::UnsupportedProtocol(other.to_string())),
    }
}

fn is_compressed(id: &str, options: &ConnectionOptions) -> Result<bool> {
    Ok(match options.compression()? {
        CompressionMode::Auto => compression::is_gzip_path(id),
        CompressionMode::Gzip => true,
        CompressionMode::None => false,
    })
}

impl Plugin for DefaultPlugin {
    fn name(&self) -> &str {
        "default"
    }

    fn handles(&self, id: &str, _options: &ConnectionOptions) -> bool {
        if !has_authority(id) {
            return true;
        }
        let kind = connection_type(id);
        kind == HTTP || kind == HTTPS
    }

    fn create_read_source(&self, id: &str, options: &ConnectionOptions) -> Result<ByteStream> {
        self.ensure_handles(id, options)?;
        match connection_type(id).as_str() {
            connection::FILE => {
                let source = local::open_source(Path::new(id), &options.file_options()?)?;
                if is_compressed(id, options)? {
                    tracing::debug!("Decompressing gzip file {id}");
                    Ok(compression::gunzip(source))
                } else {
                    Ok(source)
                }
            }
            HTTP | HTTPS => {
                let request = http_request(id, options, Method::GET)?;
                Ok(Box::pin(HttpSource::open(request)?))
            }
            other => Err(Error::UnsupportedProtocol(other.to_string())),
        }
    }

    fn create_write_stream(
        &self,
        id: &str,
        options: &ConnectionOptions,
        on_response: Option<ResponseCallback>,
    ) -> Result<ByteSink> {
        self.ensure_handles(id, options)?;
        match connection_type(id).as_str() {
            connection::FILE => {
                let file = local::open_sink(Path::new(id), &options.file_options()?)?;
                if is_compressed(id, options)? {
                    tracing::debug!("Compressing gzip file {id}");
                    Ok(Box::pin(CompressingSink::new(file)))
                } else {
                    Ok(Box::pin(file))
                }
            }
            HTTP | HTTPS => {
                let request = http_request(id, options, Method::POST)?;
                Ok(Box::pin(request.open_sink(on_response)?))
            }
            other => Err(Error::UnsupportedProtocol(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, TryStreamExt};
    use tempfile::TempDir;

    #[test]
    fn test_handles_paths_and_http() {
        let plugin = DefaultPlugin::new();
        let options = ConnectionOptions::new();
        assert!(plugin.handles("./foo.txt", &options));
        assert!(plugin.handles("c:\\foo bar", &options));
        assert!(plugin.handles("http://example.com/foo.txt", &options));
        assert!(plugin.handles("https://example.com/foo.txt", &options));
        assert!(plugin.handles("HTTPS://example.com/foo.txt", &options));
        assert!(!plugin.handles("ftp://example.com/foo.txt", &options));
        assert!(!plugin.handles("s3://bucket/key", &options));
    }

    #[test]
    fn test_direct_calls_revalidate_handles() {
        let plugin = DefaultPlugin::new();
        let options = ConnectionOptions::new();
        let id = "ftp://example.com/foo.txt";

        assert!(matches!(
            plugin.create_read_source(id, &options),
            Err(Error::UnsupportedConnection { .. })
        ));
        assert!(matches!(
            plugin.create_read_transform(id, &options),
            Err(Error::UnsupportedConnection { .. })
        ));
        assert!(matches!(
            plugin.create_write_transform(id, &options),
            Err(Error::UnsupportedConnection { .. })
        ));
        assert!(matches!(
            plugin.create_write_stream(id, &options, None),
            Err(Error::UnsupportedConnection { plugin, connection })
                if plugin == "default" && connection == id
        ));
    }

    #[tokio::test]
    async fn test_protocol_override_must_stay_http() {
        let plugin = DefaultPlugin::new();
        let options = ConnectionOptions::new().with("protocol", "ftp");
        let id = "http://127.0.0.1:9/features.json";

        assert!(matches!(
            plugin.create_read_source(id, &options),
            Err(Error::UnsupportedProtocol(scheme)) if scheme == "ftp"
        ));
        assert!(matches!(
            plugin.create_write_stream(id, &options, None),
            Err(Error::UnsupportedProtocol(scheme)) if scheme == "ftp"
        ));

        let https = ConnectionOptions::new().with("protocol", "https");
        assert!(plugin.create_read_source(id, &https).is_ok());
    }

    #[test]
    fn test_missing_file_is_transport_error() {
        let plugin = DefaultPlugin::new();
        let result =
            plugin.create_read_source("/nonexistent/feature.json", &ConnectionOptions::new());
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_forced_compression_ignores_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("packed.bin");
        let id = path.to_str().unwrap();
        let plugin = DefaultPlugin::new();
        let gzip = ConnectionOptions::new().with("compression", "gzip");

        let mut sink = plugin.create_write_stream(id, &gzip, None).unwrap();
        sink.send(bytes::Bytes::from_static(b"payload")).await.unwrap();
        sink.close().await.unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let chunks: Vec<bytes::Bytes> = plugin
            .create_read_source(id, &gzip)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"payload");
    }

    #[tokio::test]
    async fn test_disabled_compression_keeps_raw_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.json.gz");
        std::fs::write(&path, b"not actually gzip").unwrap();
        let id = path.to_str().unwrap();

        let options = ConnectionOptions::new().with("compression", "none");
        let chunks: Vec<bytes::Bytes> = DefaultPlugin::new()
            .create_read_source(id, &options)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"not actually gzip");
    }
}

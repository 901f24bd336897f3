//! Composition of plugin stages into record pipelines.
//!
//! `from` joins a plugin's read source to its read transform; `to` joins a
//! write transform to the plugin's write sink. Both resolve the plugin
//! through the [`Registry`] on every call, and fail synchronously (before
//! any data flows) when resolution or stage construction fails.

use futures::{SinkExt, StreamExt, TryStreamExt};

use feature_stream_file::{ChannelSink, ResponseCallback, DEFAULT_CHANNEL_CAPACITY};

use crate::config::ConnectionOptions;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::stream::{RecordSink, RecordStream};

impl Registry {
    /// Create a readable record stream for a connection.
    ///
    /// The connection string is either a file path (`./foo.json`,
    /// `c:\foo bar`) or a URI with an authority (`http://example.com/foo`).
    ///
    /// # Errors
    ///
    /// [`Error::NoPluginFound`] if no plugin claims the connection, or any
    /// error the plugin reports while opening the source.
    pub fn from(&self, id: &str, options: &ConnectionOptions) -> Result<RecordStream> {
        let plugin = self.resolve(id, options)?;
        let source = plugin.create_read_source(id, options)?;
        let transform = plugin.create_read_transform(id, options)?;
        Ok(transform.apply(source.map_err(Error::Transport).boxed()))
    }

    /// Create a writable record sink for a connection.
    ///
    /// Records pass through the plugin's write transform on a background
    /// task, so this must be called from within a Tokio runtime. Closing the
    /// returned sink completes only after the underlying sink has closed;
    /// dropping it unclosed abandons the write.
    pub fn to(&self, id: &str, options: &ConnectionOptions) -> Result<RecordSink> {
        self.to_with_response(id, options, None)
    }

    /// Like [`to`](Self::to), additionally handing the transport response
    /// (for HTTP connections) to `on_response` once it arrives.
    pub fn to_with_response(
        &self,
        id: &str,
        options: &ConnectionOptions,
        on_response: Option<ResponseCallback>,
    ) -> Result<RecordSink> {
        let plugin = self.resolve(id, options)?;
        let transform = plugin.create_write_transform(id, options)?;
        let sink = plugin.create_write_stream(id, options, on_response)?;

        let target = id.to_string();
        let writer = ChannelSink::spawn(DEFAULT_CHANNEL_CAPACITY, move |records| async move {
            let encoded = transform.apply(records.map(Ok).boxed());
            encoded.forward(sink.sink_map_err(Error::Transport)).await?;
            tracing::debug!("Finished writing {target}");
            Ok::<(), Error>(())
        })?;
        Ok(Box::pin(writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryPlugin;
    use bytes::Bytes;
    use std::sync::Arc;

    fn memory_registry() -> (Registry, Arc<MemoryPlugin>) {
        let plugin = Arc::new(MemoryPlugin::new("mem"));
        let mut registry = Registry::new();
        registry
            .register(plugin.clone(), &ConnectionOptions::new())
            .unwrap();
        (registry, plugin)
    }

    #[tokio::test]
    async fn test_from_yields_source_chunks() {
        let (registry, plugin) = memory_registry();
        plugin.insert("mem://a", b"abcdefghij".to_vec());

        let chunks: Vec<Bytes> = registry
            .from("mem://a", &ConnectionOptions::new())
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), b"abcdefghij");
    }

    #[tokio::test]
    async fn test_to_completes_after_inner_sink() {
        let (registry, plugin) = memory_registry();
        let mut sink = registry.to("mem://out", &ConnectionOptions::new()).unwrap();
        sink.send(Bytes::from_static(b"one,")).await.unwrap();
        sink.send(Bytes::from_static(b"two")).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(plugin.contents("mem://out").unwrap(), b"one,two");
    }

    #[tokio::test]
    async fn test_from_to_forward() {
        let (registry, plugin) = memory_registry();
        plugin.insert("mem://in", b"0123456789".repeat(10));

        let options = ConnectionOptions::new();
        let source = registry.from("mem://in", &options).unwrap();
        let sink = registry.to("mem://copy", &options).unwrap();
        source.forward(sink).await.unwrap();

        assert_eq!(plugin.contents("mem://copy").unwrap(), b"0123456789".repeat(10));
    }

    #[tokio::test]
    async fn test_unresolved_connections_fail_before_data_flows() {
        let (registry, _plugin) = memory_registry();
        let options = ConnectionOptions::new();
        assert!(matches!(
            registry.from("/local/file.json", &options),
            Err(Error::NoPluginFound(_))
        ));
        assert!(matches!(
            registry.to("ftp://host/file.json", &options),
            Err(Error::NoPluginFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dropped_sink_does_not_commit() {
        let (registry, plugin) = memory_registry();
        let mut sink = registry.to("mem://partial", &ConnectionOptions::new()).unwrap();
        sink.send(Bytes::from_static(b"half")).await.unwrap();
        drop(sink);
        tokio::task::yield_now().await;

        assert!(plugin.contents("mem://partial").is_none());
    }
}

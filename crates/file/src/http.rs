//! HTTP/HTTPS request primitives

use crate::{ChannelSink, DEFAULT_CHANNEL_CAPACITY};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response, Url};
use std::io;
use std::time::Duration;

/// Callback receiving the response to an outbound write request
pub type ResponseCallback = Box<dyn FnOnce(Response) + Send + 'static>;

/// A fully resolved outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    fn builder(&self) -> reqwest::RequestBuilder {
        let client = reqwest::Client::new();
        let mut builder = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// Send the request without a body and await the response headers
    ///
    /// # Example
    /// ```ignore
    /// let request = HttpRequest::new(Method::GET, "https://example.com/data.json".parse()?);
    /// let response = request.send().await?;
    /// ```
    pub async fn send(self) -> io::Result<Response> {
        let url = self.url.clone();
        tracing::debug!("Sending {} {}", self.method, url);
        self.builder()
            .send()
            .await
            .map_err(|e| io::Error::other(format!("Failed to fetch URL: {url}: {e}")))
    }

    /// Open a sink whose chunks are streamed as this request's body
    ///
    /// The request is issued immediately. Closing the sink ends the body and
    /// completes once the response has arrived and `on_response` has run.
    pub fn open_sink(
        self,
        on_response: Option<ResponseCallback>,
    ) -> io::Result<ChannelSink<Bytes, io::Error>> {
        ChannelSink::spawn(DEFAULT_CHANNEL_CAPACITY, move |chunks| async move {
            let url = self.url.clone();
            let body = reqwest::Body::wrap_stream(chunks.map(Ok::<Bytes, io::Error>));
            tracing::debug!("Streaming {} request body to {}", self.method, url);
            let response = self
                .builder()
                .body(body)
                .send()
                .await
                .map_err(|e| io::Error::other(format!("Failed to send to URL: {url}: {e}")))?;
            tracing::debug!("Received {} from {}", response.status(), url);
            if let Some(callback) = on_response {
                callback(response);
            }
            Ok(())
        })
    }
}

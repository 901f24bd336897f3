//! Pull-based byte source over an HTTP/HTTPS request.
//!
//! [`HttpSource::open`] issues the request immediately and returns before
//! the response exists, so the read side of an HTTP connection can be built
//! synchronously just like a file's. The source moves through these states:
//!
//! ```text
//! Pending --response--> Streaming --body exhausted--> Done
//!    \                      \
//!     +------- any transport failure ------> Error
//! ```
//!
//! While `Pending`, polling yields `Poll::Pending` (no data yet), never an
//! end-of-stream. A response declaring `Content-Encoding: gzip` is read
//! through a decompression stage; any other body is passed through untouched.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_ENCODING;
use reqwest::Response;
use tokio::task::JoinHandle;

use feature_stream_file::{compression, ByteStream, HttpRequest};

/// Observable lifecycle of an [`HttpSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpSourceState {
    /// Request sent, no response yet
    Pending,
    /// Response headers received, body readable
    Streaming,
    /// Body exhausted
    Done,
    /// Transport failure; the stream has ended
    Error,
}

enum State {
    Pending(JoinHandle<io::Result<Response>>),
    Streaming(ByteStream),
    Done,
    Error,
}

pub struct HttpSource {
    url: String,
    state: State,
}

impl HttpSource {
    /// Issue `request` on the current Tokio runtime and return its source.
    ///
    /// Fails only when called outside a runtime; transport failures arrive
    /// later as the stream's error item.
    pub fn open(request: HttpRequest) -> io::Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(io::Error::other)?;
        let url = request.url.to_string();
        let task = runtime.spawn(request.send());
        Ok(Self {
            url,
            state: State::Pending(task),
        })
    }

    pub fn state(&self) -> HttpSourceState {
        match self.state {
            State::Pending(_) => HttpSourceState::Pending,
            State::Streaming(_) => HttpSourceState::Streaming,
            State::Done => HttpSourceState::Done,
            State::Error => HttpSourceState::Error,
        }
    }

    fn fail(&mut self, err: io::Error) -> Poll<Option<io::Result<Bytes>>> {
        tracing::debug!("HTTP source {} failed: {err}", self.url);
        self.state = State::Error;
        Poll::Ready(Some(Err(err)))
    }

    /// The body stream to read from, decompressed when the response says so.
    fn body(&self, response: Response) -> io::Result<ByteStream> {
        let status = response.status();
        if !status.is_success() {
            return Err(io::Error::other(format!(
                "HTTP request failed with status {status} for URL: {}",
                self.url
            )));
        }

        let gzip = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));
        let body = response.bytes_stream().map_err(io::Error::other).boxed();

        tracing::debug!(
            "HTTP source {} streaming (status {status}, gzip: {gzip})",
            self.url
        );
        Ok(if gzip { compression::gunzip(body) } else { body })
    }
}

impl Stream for HttpSource {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                State::Pending(task) => {
                    let response = match ready!(Pin::new(task).poll(cx)) {
                        Ok(Ok(response)) => response,
                        Ok(Err(e)) => return this.fail(e),
                        Err(e) => return this.fail(io::Error::other(e)),
                    };
                    match this.body(response) {
                        Ok(body) => this.state = State::Streaming(body),
                        Err(e) => return this.fail(e),
                    }
                }
                State::Streaming(body) => match ready!(body.poll_next_unpin(cx)) {
                    // An empty chunk is "nothing yet", not end-of-stream.
                    Some(Ok(chunk)) if chunk.is_empty() => continue,
                    Some(Ok(chunk)) => return Poll::Ready(Some(Ok(chunk))),
                    Some(Err(e)) => return this.fail(e),
                    None => {
                        tracing::debug!("HTTP source {} done", this.url);
                        this.state = State::Done;
                        return Poll::Ready(None);
                    }
                },
                State::Done | State::Error => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for HttpSource {
    fn drop(&mut self) {
        if let State::Pending(task) = &self.state {
            task.abort();
        }
    }
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

//! Gzip compression over chunk streams.
//!
//! The codecs here are push-driven: each input chunk is fed to a `flate2`
//! write-side coder backed by an in-memory buffer, and whatever output the
//! coder produced is drained as the next chunk. This keeps compression a
//! pure transform stage that never blocks on I/O itself.
//!
//! Suffix detection is case-insensitive and covers `.gz` and `.gzip`.

use crate::ByteStream;
use bytes::Bytes;
use flate2::write::{GzEncoder, MultiGzDecoder};
use flate2::Compression;
use futures::stream::{self, StreamExt};
use std::io::{self, Write};

/// File suffixes that mark gzip-compressed content.
pub const GZIP_EXTENSIONS: &[&str] = &[".gz", ".gzip"];

/// Whether a path or URL names gzip-compressed content by its suffix.
pub fn is_gzip_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    GZIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Incremental gzip compressor.
///
/// Feed chunks with [`encode`](Self::encode); call [`finish`](Self::finish)
/// exactly once to obtain the trailer. Encoding after `finish` is an error.
pub struct GzipEncoder {
    inner: Option<GzEncoder<Vec<u8>>>,
}

impl GzipEncoder {
    pub fn new(level: Compression) -> Self {
        Self {
            inner: Some(GzEncoder::new(Vec::new(), level)),
        }
    }

    /// Compress one chunk, returning whatever compressed bytes are ready.
    ///
    /// The result is frequently empty: deflate buffers input internally.
    pub fn encode(&mut self, chunk: &[u8]) -> io::Result<Bytes> {
        let encoder = self.inner.as_mut().ok_or_else(finished)?;
        encoder.write_all(chunk)?;
        Ok(Bytes::from(std::mem::take(encoder.get_mut())))
    }

    /// Flush the remaining compressed data and the gzip trailer.
    pub fn finish(&mut self) -> io::Result<Bytes> {
        let encoder = self.inner.take().ok_or_else(finished)?;
        Ok(Bytes::from(encoder.finish()?))
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }
}

impl Default for GzipEncoder {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

/// Incremental gzip decompressor, the mirror of [`GzipEncoder`].
///
/// Concatenated gzip members (`gzip -c a >> f`) decode as one continuous
/// stream.
pub struct GzipDecoder {
    inner: Option<MultiGzDecoder<Vec<u8>>>,
}

impl GzipDecoder {
    pub fn new() -> Self {
        Self {
            inner: Some(MultiGzDecoder::new(Vec::new())),
        }
    }

    /// Decompress one chunk, returning whatever plain bytes are ready.
    pub fn decode(&mut self, chunk: &[u8]) -> io::Result<Bytes> {
        let decoder = self.inner.as_mut().ok_or_else(finished)?;
        decoder.write_all(chunk)?;
        Ok(Bytes::from(std::mem::take(decoder.get_mut())))
    }

    /// Flush any plain bytes still held by the decoder.
    pub fn finish(&mut self) -> io::Result<Bytes> {
        let decoder = self.inner.take().ok_or_else(finished)?;
        Ok(Bytes::from(decoder.finish()?))
    }
}

impl Default for GzipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn finished() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "gzip stream already finished")
}

/// One step of a chunk-to-chunk coder.
trait ChunkCoder: Send + 'static {
    fn push(&mut self, chunk: &[u8]) -> io::Result<Bytes>;
    fn end(&mut self) -> io::Result<Bytes>;
}

impl ChunkCoder for GzipEncoder {
    fn push(&mut self, chunk: &[u8]) -> io::Result<Bytes> {
        self.encode(chunk)
    }

    fn end(&mut self) -> io::Result<Bytes> {
        self.finish()
    }
}

impl ChunkCoder for GzipDecoder {
    fn push(&mut self, chunk: &[u8]) -> io::Result<Bytes> {
        self.decode(chunk)
    }

    fn end(&mut self) -> io::Result<Bytes> {
        self.finish()
    }
}

/// Wrap a byte stream so it yields the gzip compression of its contents.
pub fn gzip(input: ByteStream) -> ByteStream {
    code_stream(input, GzipEncoder::default())
}

/// Wrap a byte stream of gzip data so it yields the decompressed contents.
///
/// Errors from the input and corrupt gzip data both surface as stream errors;
/// the stream ends after the first error.
pub fn gunzip(input: ByteStream) -> ByteStream {
    code_stream(input, GzipDecoder::new())
}

struct CoderState<C> {
    input: ByteStream,
    coder: C,
    done: bool,
}

fn code_stream<C: ChunkCoder>(input: ByteStream, coder: C) -> ByteStream {
    let state = CoderState {
        input,
        coder,
        done: false,
    };
    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            let produced = match state.input.next().await {
                Some(Ok(chunk)) => state.coder.push(&chunk),
                Some(Err(e)) => Err(e),
                None => {
                    state.done = true;
                    state.coder.end()
                }
            };
            match produced {
                // Empty output just means the coder is buffering.
                Ok(out) if out.is_empty() && !state.done => continue,
                Ok(out) if out.is_empty() => return None,
                Ok(out) => return Some((Ok(out), state)),
                Err(e) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}

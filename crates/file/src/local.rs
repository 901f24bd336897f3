//! Local filesystem byte source and sink

use crate::{ByteStream, DEFAULT_BUFFER_SIZE};
use futures::StreamExt;
use std::io;
use std::path::Path;
use tokio_util::codec::{BytesCodec, FramedWrite};
use tokio_util::io::ReaderStream;

/// Sink that writes byte chunks to a local file
pub type FileSink = FramedWrite<tokio::fs::File, BytesCodec>;

/// Options understood by the local file primitives
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Capacity of each chunk read from the file
    pub buffer_size: usize,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            append: false,
        }
    }
}

/// Open a local file and return a stream of its chunks
///
/// The file is opened eagerly so that a missing path fails here rather than
/// on the first pull.
///
/// # Example
/// ```ignore
/// let source = open_source(Path::new("data.csv"), &FileOptions::default())?;
/// ```
pub fn open_source(path: &Path, options: &FileOptions) -> io::Result<ByteStream> {
    // Blocking open: pipeline construction is synchronous, even on a runtime thread.
    let file = std::fs::File::open(path).map_err(|e| annotate(e, "open", path))?;
    tracing::debug!(
        "Opened {} for reading (chunk size {})",
        path.display(),
        options.buffer_size
    );
    let file = tokio::fs::File::from_std(file);
    Ok(ReaderStream::with_capacity(file, options.buffer_size.max(1)).boxed())
}

/// Create (or append to) a local file and return a sink for its chunks
///
/// Closing the sink flushes every pending write; it completes only once the
/// file has accepted all bytes.
pub fn open_sink(path: &Path, options: &FileOptions) -> io::Result<FileSink> {
    let mut open = std::fs::OpenOptions::new();
    if options.append {
        open.append(true).create(true);
    } else {
        open.write(true).create(true).truncate(true);
    }
    // Blocking open, as in `open_source`.
    let file = open.open(path).map_err(|e| annotate(e, "create", path))?;
    tracing::debug!(
        "Opened {} for writing (append: {})",
        path.display(),
        options.append
    );
    Ok(FramedWrite::new(
        tokio::fs::File::from_std(file),
        BytesCodec::new(),
    ))
}

fn annotate(err: io::Error, action: &str, path: &Path) -> io::Error {
    io::Error::new(
        err.kind(),
        format!("Failed to {action} file {}: {err}", path.display()),
    )
}

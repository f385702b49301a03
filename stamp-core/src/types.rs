//! Domain types for files flowing through a stamp pipeline.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! `relative` is never stored: it is derived from `path` and `base` on every access.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Chunk size used when turning an async reader into a content stream.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A live byte stream. Errors raised by the producer are yielded as items.
pub type ContentStream = BoxStream<'static, io::Result<Vec<u8>>>;

/// Open-ended per-file data attached by upstream producers.
pub type DataBag = Map<String, Value>;

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// The content of a [`File`]: nothing, a finite buffer, or a live stream.
#[derive(Default)]
pub enum Contents {
    #[default]
    Null,
    Buffer(Vec<u8>),
    Stream(ContentStream),
}

impl Contents {
    /// Wrap an async reader as a chunked content stream.
    ///
    /// The reader is only polled as the stream is consumed.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::from_reader_with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn from_reader_with_chunk_size<R>(reader: R, chunk_size: usize) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let chunk_size = chunk_size.max(1);
        let chunks = stream::try_unfold(reader, move |mut reader| async move {
            let mut buf = vec![0u8; chunk_size];
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);
            Ok::<_, io::Error>(Some((buf, reader)))
        });
        Contents::Stream(chunks.boxed())
    }

    /// Stream the given chunks in order.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
        I::IntoIter: Send + 'static,
    {
        Contents::Stream(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Contents::Null)
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, Contents::Buffer(_))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Contents::Stream(_))
    }

    /// Drain the contents into a single buffer.
    ///
    /// `Null` yields an empty buffer. A stream error aborts the drain.
    pub async fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Contents::Null => Ok(Vec::new()),
            Contents::Buffer(bytes) => Ok(bytes),
            Contents::Stream(mut chunks) => {
                let mut out = Vec::new();
                while let Some(chunk) = chunks.next().await {
                    out.extend_from_slice(&chunk?);
                }
                Ok(out)
            }
        }
    }
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Null => f.write_str("Null"),
            Contents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Contents::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Vec<u8>> for Contents {
    fn from(bytes: Vec<u8>) -> Self {
        Contents::Buffer(bytes)
    }
}

impl From<&str> for Contents {
    fn from(s: &str) -> Self {
        Contents::Buffer(s.as_bytes().to_vec())
    }
}

impl From<String> for Contents {
    fn from(s: String) -> Self {
        Contents::Buffer(s.into_bytes())
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// One unit of work: identity metadata plus contents.
///
/// Identity fields are fixed once the file is built; only the contents can be
/// replaced afterwards.
#[derive(Debug)]
pub struct File {
    cwd: PathBuf,
    base: PathBuf,
    path: PathBuf,
    contents: Contents,
    data: DataBag,
}

impl File {
    /// A file at `path` with no contents. `base` defaults to `cwd`, which
    /// defaults to empty.
    pub fn new(path: impl AsRef<Path>) -> Self {
        File {
            cwd: PathBuf::new(),
            base: PathBuf::new(),
            path: normalize(path.as_ref()),
            contents: Contents::Null,
            data: DataBag::new(),
        }
    }

    /// Set the working directory. A base equal to the old cwd follows it.
    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        let cwd = normalize(cwd.as_ref());
        if self.base == self.cwd {
            self.base = cwd.clone();
        }
        self.cwd = cwd;
        self
    }

    pub fn with_base(mut self, base: impl AsRef<Path>) -> Self {
        self.base = normalize(base.as_ref());
        self
    }

    pub fn with_contents(mut self, contents: impl Into<Contents>) -> Self {
        self.contents = contents.into();
        self
    }

    pub fn with_data(mut self, data: DataBag) -> Self {
        self.data = data;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// `path` relative to `base`; the full path when it lies outside `base`.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }

    /// Final path component, e.g. `file.txt`.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Basename without its extension, e.g. `file`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extension including the leading dot, e.g. `.txt`; empty when absent.
    pub fn extname(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }

    pub fn dirname(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Swap in new contents, returning the old ones.
    pub fn replace_contents(&mut self, contents: Contents) -> Contents {
        std::mem::replace(&mut self.contents, contents)
    }

    pub fn data(&self) -> &DataBag {
        &self.data
    }

    /// Attach a data entry. Intended for producers, before the file enters a stage.
    pub fn insert_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Serializable snapshot of the identity fields.
    pub fn view(&self) -> FileView {
        FileView {
            path: display(&self.path),
            base: display(&self.base),
            cwd: display(&self.cwd),
            relative: display(self.relative()),
            basename: self.basename(),
            stem: self.stem(),
            extname: self.extname(),
            dirname: display(self.dirname()),
        }
    }
}

/// String view of a [`File`]'s identity, as exposed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileView {
    pub path: String,
    pub base: String,
    pub cwd: String,
    pub relative: String,
    pub basename: String,
    pub stem: String,
    pub extname: String,
    pub dirname: String,
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Lexical normalisation: drops `.` components and resolves `..` against
/// preceding normal components. Never touches the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

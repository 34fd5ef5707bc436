use bytes::Bytes;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

enum Source {
    Memory(Cursor<Bytes>),
    File(File),
    Reader(Box<dyn Read + Send>),
}

/// Message body stream.
///
/// In-memory and file-backed streams are seekable and know their size;
/// streams over an arbitrary reader are neither.
///
/// ```
/// use brrtrouter_bridge::message::Stream;
///
/// let mut body = Stream::from("hello world");
/// assert_eq!(&body.read(5).unwrap()[..], b"hello");
/// assert!(!body.eof());
/// assert_eq!(&body.contents().unwrap()[..], b" world");
/// assert!(body.eof());
/// ```
pub struct Stream {
    source: Source,
    eof: bool,
}

impl Stream {
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Memory(Cursor::new(bytes.into())),
            eof: false,
        }
    }

    pub fn from_file(file: File) -> Self {
        Self {
            source: Source::File(file),
            eof: false,
        }
    }

    /// Open a file as a seekable stream.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        File::open(path).map(Self::from_file)
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            source: Source::Reader(Box::new(reader)),
            eof: false,
        }
    }

    pub fn is_seekable(&self) -> bool {
        !matches!(self.source, Source::Reader(_))
    }

    /// Seek back to the first byte.
    ///
    /// # Errors
    ///
    /// Fails with `ErrorKind::Unsupported` on non-seekable streams.
    pub fn rewind(&mut self) -> io::Result<()> {
        match &mut self.source {
            Source::Memory(cursor) => cursor.set_position(0),
            Source::File(file) => {
                file.seek(SeekFrom::Start(0))?;
            }
            Source::Reader(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "stream is not seekable",
                ))
            }
        }
        self.eof = false;
        Ok(())
    }

    /// Total size in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        match &self.source {
            Source::Memory(cursor) => Some(cursor.get_ref().len() as u64),
            Source::File(file) => file.metadata().ok().map(|m| m.len()),
            Source::Reader(_) => None,
        }
    }

    /// Whether the stream is exhausted.
    ///
    /// Exact for in-memory streams; other streams report it after a read comes up short
    /// or reaches the known size.
    pub fn eof(&self) -> bool {
        match &self.source {
            Source::Memory(cursor) => cursor.position() >= cursor.get_ref().len() as u64,
            _ => self.eof,
        }
    }

    /// Read up to `max` bytes.
    ///
    /// Fewer than `max` bytes are only returned when the stream runs out.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn read(&mut self, max: usize) -> io::Result<Bytes> {
        match &mut self.source {
            Source::Memory(cursor) => {
                let len = cursor.get_ref().len();
                let start = (cursor.position() as usize).min(len);
                let end = start.saturating_add(max).min(len);
                cursor.set_position(end as u64);
                Ok(cursor.get_ref().slice(start..end))
            }
            Source::File(file) => {
                let chunk = fill(file, max)?;
                let at_end = match (file.stream_position(), file.metadata()) {
                    (Ok(pos), Ok(meta)) => pos >= meta.len(),
                    _ => false,
                };
                self.eof = chunk.len() < max || at_end;
                Ok(chunk)
            }
            Source::Reader(reader) => {
                let chunk = fill(reader, max)?;
                self.eof = chunk.len() < max;
                Ok(chunk)
            }
        }
    }

    /// Read everything that is left.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn contents(&mut self) -> io::Result<Bytes> {
        match &mut self.source {
            Source::Memory(cursor) => {
                let len = cursor.get_ref().len();
                let start = (cursor.position() as usize).min(len);
                cursor.set_position(len as u64);
                Ok(cursor.get_ref().slice(start..))
            }
            Source::File(file) => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                self.eof = true;
                Ok(Bytes::from(buf))
            }
            Source::Reader(reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                self.eof = true;
                Ok(Bytes::from(buf))
            }
        }
    }
}

fn fill<R: Read + ?Sized>(reader: &mut R, max: usize) -> io::Result<Bytes> {
    let mut buf = Vec::new();
    reader.take(max as u64).read_to_end(&mut buf)?;
    Ok(Bytes::from(buf))
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = match &mut self.source {
            Source::Memory(cursor) => cursor.read(buf)?,
            Source::File(file) => file.read(buf)?,
            Source::Reader(reader) => reader.read(buf)?,
        };
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(n)
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.source {
            Source::Memory(_) => "memory",
            Source::File(_) => "file",
            Source::Reader(_) => "reader",
        };
        f.debug_struct("Stream")
            .field("kind", &kind)
            .field("size", &self.size())
            .field("eof", &self.eof())
            .finish()
    }
}

impl From<Bytes> for Stream {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Stream {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Stream {
    fn from(s: String) -> Self {
        Self::from_bytes(s)
    }
}

impl From<&'static str> for Stream {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(s)
    }
}

impl From<File> for Stream {
    fn from(file: File) -> Self {
        Self::from_file(file)
    }
}

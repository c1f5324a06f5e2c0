//! Byte channels bound to column codecs.
//!
//! A channel is one logical byte stream inside a page. The page layer owns
//! multiplexing and persistence; codecs only need to append bytes, read back
//! what was committed, and (for the replay resume path) take the committed
//! bytes out so they can be re-encoded.
//!
//! # Implementations
//!
//! - [`MemoryChannel`]: growable in-memory buffer
//! - [`FileChannel`]: append-mode file
//! - [`CompressedChannel`]: deflate wrapper over another channel; opaque to
//!   the codec and therefore not appendable

mod compressed;

pub use compressed::CompressedChannel;

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A logical byte sink/source that a codec writes to and resumes from.
pub trait Channel: Write {
    /// Returns true when bytes written after the committed content extend the
    /// logical stream byte-for-byte.
    ///
    /// Entropy-coded channels return false: their committed form cannot be
    /// extended, so writers resuming on them must replay.
    fn supports_append(&self) -> bool;

    /// Opens a reader over the committed logical content without consuming it.
    fn open_reader(&mut self) -> io::Result<Box<dyn Read + '_>>;

    /// Removes the committed logical content and returns it, leaving the
    /// channel empty and ready for writing.
    fn take_contents(&mut self) -> io::Result<Box<dyn Read + Send>>;

    /// Finalizes the channel's physical form. Called by the page layer once
    /// the owning codec has committed.
    fn finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Type-erased channel used by the dynamic codec registry.
pub type BoxedChannel = Box<dyn Channel + Send>;

/// Type-erased byte source used by the dynamic codec registry.
pub type BoxedSource = Box<dyn Read + Send>;

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn supports_append(&self) -> bool {
        (**self).supports_append()
    }

    fn open_reader(&mut self) -> io::Result<Box<dyn Read + '_>> {
        (**self).open_reader()
    }

    fn take_contents(&mut self) -> io::Result<Box<dyn Read + Send>> {
        (**self).take_contents()
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// In-memory channel backed by a `Vec<u8>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryChannel {
    buf: Vec<u8>,
}

impl MemoryChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel holding previously committed bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { buf: bytes }
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the channel, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Write for MemoryChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for MemoryChannel {
    fn supports_append(&self) -> bool {
        true
    }

    fn open_reader(&mut self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.buf.as_slice()))
    }

    fn take_contents(&mut self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(std::mem::take(&mut self.buf))))
    }
}

/// Channel stored in its own append-mode file.
#[derive(Debug)]
pub struct FileChannel {
    path: PathBuf,
    file: File,
}

impl FileChannel {
    /// Opens (creating if needed) the channel file at `path`. Existing
    /// content is kept and treated as committed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the backing file in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Returns true if the backing file is empty.
    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Write for FileChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Channel for FileChannel {
    fn supports_append(&self) -> bool {
        true
    }

    fn open_reader(&mut self) -> io::Result<Box<dyn Read + '_>> {
        self.file.flush()?;
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }

    fn take_contents(&mut self) -> io::Result<Box<dyn Read + Send>> {
        self.file.flush()?;
        let bytes = fs::read(&self.path)?;
        self.file.set_len(0)?;
        debug!(
            "Took {} committed bytes from channel file {}",
            bytes.len(),
            self.path.display()
        );
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}

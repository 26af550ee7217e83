//! Large output buffer in front of the destination writer.

use std::io::{self, BufWriter, Write};

/// Default output buffer size (10 MiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 10 * 1024 * 1024;

/// Buffered writer that counts the bytes appended to it.
///
/// Many small field writes are batched into few large writes on the
/// destination. Write errors from the destination are always returned; the
/// buffer is flushed explicitly with [`Write::flush`] and, best effort, on drop.
#[derive(Debug)]
pub struct BufferedSink<W: Write> {
    inner: BufWriter<W>,
    bytes: u64,
}

impl<W: Write> BufferedSink<W> {
    /// Wraps `inner` with the default buffer size.
    pub fn new(inner: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, inner)
    }

    /// Wraps `inner` with a buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize, inner: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, inner),
            bytes: 0,
        }
    }

    /// Appends all of `bytes`.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    /// Total bytes appended so far, flushed or not.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Bytes currently held in the buffer.
    pub fn pending(&self) -> usize {
        self.inner.buffer().len()
    }

    /// Buffer size.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// The destination writer.
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Flushes the buffer and returns the destination writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|err| err.into_error())
    }
}

impl<W: Write> Write for BufferedSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

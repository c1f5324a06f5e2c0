//! Buffered byte access between codecs and their channels.

use crate::error::Result;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};

/// Buffered output side of one channel.
///
/// Tracks how many bytes the codec has emitted so that `reset` can refuse to
/// run once data has left the encoder state.
pub(crate) struct ByteSink<W: Write> {
    inner: BufWriter<W>,
    emitted: u64,
}

impl<W: Write> ByteSink<W> {
    pub(crate) fn new(channel: W, capacity: usize) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity.max(1), channel),
            emitted: 0,
        }
    }

    #[inline]
    pub(crate) fn put(&mut self, byte: u8) -> Result<()> {
        self.inner.write_all(&[byte])?;
        self.emitted += 1;
        Ok(())
    }

    #[inline]
    pub(crate) fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.emitted += bytes.len() as u64;
        Ok(())
    }

    /// Bytes handed to this sink since it was created.
    pub(crate) fn emitted(&self) -> u64 {
        self.emitted
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes buffered bytes and returns the channel.
    pub(crate) fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| err.into_error().into())
    }
}

/// Buffered input side of one channel.
///
/// Reads never fail on end of data: callers learn about truncation from the
/// `None`/`false`/short-count results.
pub(crate) struct ByteSource<R: Read> {
    inner: BufReader<R>,
}

impl<R: Read> ByteSource<R> {
    pub(crate) fn new(source: R, capacity: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), source),
        }
    }

    /// Reads one byte, or `None` at end of data.
    #[inline]
    pub(crate) fn read_byte(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok([]) => return Ok(None),
                Ok(buf) => {
                    let byte = buf[0];
                    self.inner.consume(1);
                    return Ok(Some(byte));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Fills `out` completely. Returns false if data ran out first.
    #[inline]
    pub(crate) fn read_full(&mut self, out: &mut [u8]) -> Result<bool> {
        Ok(self.read_some(out)? == out.len())
    }

    /// Reads exactly `len` bytes into a new buffer, or `None` if data ran out
    /// first. The buffer grows with the bytes that actually arrive.
    pub(crate) fn read_vec(&mut self, len: u64) -> Result<Option<Vec<u8>>> {
        let mut out = Vec::new();
        let n = (&mut self.inner).take(len).read_to_end(&mut out)?;
        Ok((n as u64 == len).then_some(out))
    }

    /// Reads until `out` is full or data runs out, returning the byte count.
    pub(crate) fn read_some(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < out.len() {
            match self.inner.read(&mut out[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that hands out one byte per call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_sink_counts_emitted_bytes() {
        let mut sink = ByteSink::new(Vec::new(), 4);
        sink.put(1).unwrap();
        sink.put_slice(&[2, 3, 4, 5, 6]).unwrap();
        assert_eq!(sink.emitted(), 6);
        assert_eq!(sink.into_inner().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_source_reassembles_short_reads() {
        let data = [10u8, 20, 30, 40, 50];
        let mut source = ByteSource::new(Trickle(&data), 2);
        assert_eq!(source.read_byte().unwrap(), Some(10));

        let mut buf = [0u8; 3];
        assert!(source.read_full(&mut buf).unwrap());
        assert_eq!(buf, [20, 30, 40]);

        assert_eq!(source.read_vec(0).unwrap(), Some(Vec::new()));
        let mut tail = [0u8; 4];
        assert!(!source.read_full(&mut tail).unwrap());
        assert_eq!(source.read_byte().unwrap(), None);
    }

    #[test]
    fn test_read_vec_stops_at_end_of_data() {
        let data = [1u8, 2, 3, 4, 5];
        let mut source = ByteSource::new(Trickle(&data), 2);
        assert_eq!(source.read_vec(2).unwrap(), Some(vec![1, 2]));
        assert_eq!(source.read_vec(u64::MAX).unwrap(), None);
        assert_eq!(source.read_byte().unwrap(), None);
    }
}

//! Deflate-compressed channel wrapper.
//!
//! The codec above this wrapper sees plain bytes. Below it, the inner channel
//! holds one deflate stream that is only complete once the channel is
//! finished, so committed content cannot be extended in place: a writer that
//! resumes here takes the decompressed content out and replays it.

use super::Channel;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use std::mem;

enum State<C: Channel> {
    /// Accepting writes into an open deflate stream.
    Open(DeflateEncoder<C>),
    /// The deflate stream is complete.
    Finished(C),
    /// A finish failed part-way; the channel is unusable.
    Poisoned,
}

/// A channel that deflate-compresses everything written to it.
pub struct CompressedChannel<C: Channel> {
    state: State<C>,
    level: Compression,
}

impl<C: Channel> CompressedChannel<C> {
    /// Wraps `inner` with the default compression level.
    pub fn new(inner: C) -> Self {
        Self::with_level(inner, Compression::default().level())
    }

    /// Wraps `inner` with a compression level from 0 (store) to 9 (best).
    pub fn with_level(inner: C, level: u32) -> Self {
        let level = Compression::new(level.min(9));
        Self {
            state: State::Open(DeflateEncoder::new(inner, level)),
            level,
        }
    }

    /// Completes the deflate stream and returns the inner channel.
    pub fn into_inner(mut self) -> io::Result<C> {
        self.finish_stream()?;
        match mem::replace(&mut self.state, State::Poisoned) {
            State::Finished(inner) => Ok(inner),
            _ => Err(poisoned()),
        }
    }

    fn finish_stream(&mut self) -> io::Result<&mut C> {
        let state = mem::replace(&mut self.state, State::Poisoned);
        self.state = match state {
            State::Open(encoder) => State::Finished(encoder.finish()?),
            other => other,
        };
        match &mut self.state {
            State::Finished(inner) => Ok(inner),
            _ => Err(poisoned()),
        }
    }
}

fn poisoned() -> io::Error {
    io::Error::other("compressed channel is poisoned by an earlier failure")
}

impl<C: Channel> Write for CompressedChannel<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            State::Open(encoder) => encoder.write(buf),
            State::Finished(_) => Err(io::Error::other(
                "compressed channel is finished; take its contents before writing again",
            )),
            State::Poisoned => Err(poisoned()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            State::Open(encoder) => encoder.flush(),
            State::Finished(inner) => inner.flush(),
            State::Poisoned => Err(poisoned()),
        }
    }
}

impl<C: Channel> Channel for CompressedChannel<C> {
    fn supports_append(&self) -> bool {
        false
    }

    fn open_reader(&mut self) -> io::Result<Box<dyn Read + '_>> {
        let inner = self.finish_stream()?;
        Ok(Box::new(DeflateDecoder::new(inner.open_reader()?)))
    }

    fn take_contents(&mut self) -> io::Result<Box<dyn Read + Send>> {
        let compressed = self.finish_stream()?.take_contents()?;
        if let State::Finished(inner) = mem::replace(&mut self.state, State::Poisoned) {
            self.state = State::Open(DeflateEncoder::new(inner, self.level));
        }
        Ok(Box::new(DeflateDecoder::new(compressed)))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finish_stream()?.finish()
    }
}

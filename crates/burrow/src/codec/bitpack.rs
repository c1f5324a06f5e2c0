//! Sub-byte bit packing at a fixed width.
//!
//! Values are OR'd into a 64-bit accumulator at increasing bit offsets
//! (LSB-first) and the accumulator is written as 8 little-endian bytes each
//! time it fills. There is no per-value overhead and no padding between
//! values; only `commit` pads the final partial byte.
//!
//! ```text
//! width 2, values [1, 2, 3, 0, 1]:
//!   byte 0 = 0b00_11_10_01   byte 1 = 0b000000_01
//! ```
//!
//! Width 8 skips the accumulator and copies bytes directly. The item count
//! lives outside the stream, so a reader asked for more values than were
//! written hands back pad values from the last byte.

use crate::channel::{BoxedSource, Channel};
use crate::codec::io::{ByteSink, ByteSource};
use crate::codec::{single, Codec, ColumnCodec, ColumnDecoder, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::resume::{self, ResumeStrategy};
use bitvec::prelude::*;
use std::io::Read;
use tracing::debug;

/// A value that can be packed into at most 16 bits.
pub trait Packable: Copy + Default {
    /// Raw bits of the value, right-aligned.
    fn to_bits(self) -> u16;

    /// Rebuilds a value from right-aligned bits.
    fn from_bits(bits: u16) -> Self;
}

impl Packable for bool {
    #[inline]
    fn to_bits(self) -> u16 {
        self as u16
    }

    #[inline]
    fn from_bits(bits: u16) -> Self {
        bits != 0
    }
}

macro_rules! impl_packable {
    ($($ty:ty => $unsigned:ty),*) => {$(
        impl Packable for $ty {
            #[inline]
            fn to_bits(self) -> u16 {
                self as $unsigned as u16
            }

            #[inline]
            fn from_bits(bits: u16) -> Self {
                bits as $unsigned as $ty
            }
        }
    )*};
}

impl_packable!(u8 => u8, i8 => u8, u16 => u16, i16 => u16);

const ACC_BITS: u32 = u64::BITS;

/// Bit-packing writer for values `W` bits wide.
pub struct BitPackWriter<C: Channel, const W: u32> {
    sink: ByteSink<C>,
    acc: u64,
    /// Bits of `acc` in use.
    filled: u32,
    /// Set once a commit padded a partial byte; the stream cannot grow after that.
    sealed: bool,
    /// Byte buffer for width-8 batches.
    scratch: Vec<u8>,
}

impl<C: Channel, const W: u32> BitPackWriter<C, W> {
    const VALID_WIDTH: () = assert!(
        W == 1 || W == 2 || W == 4 || W == 8 || W == 16,
        "bit width must be 1, 2, 4, 8 or 16"
    );

    const PER_WORD: usize = (ACC_BITS / W) as usize;

    /// Creates a writer bound to `channel`.
    pub fn new(channel: C, config: &CodecConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_WIDTH;
        Self {
            sink: ByteSink::new(channel, config.buffer_capacity),
            acc: 0,
            filled: 0,
            sealed: false,
            scratch: Vec::new(),
        }
    }

    /// Flushes buffered bytes and returns the channel.
    pub fn into_channel(self) -> Result<C> {
        self.sink.into_inner()
    }

    #[inline]
    fn check_open(&self) -> Result<()> {
        if self.sealed {
            Err(CodecError::InvalidState(
                "write after a commit that padded a partial byte",
            ))
        } else {
            Ok(())
        }
    }

    #[inline]
    fn check_width(bits: u16) -> Result<()> {
        if W < 16 && bits >> W != 0 {
            return Err(CodecError::OutOfRange { bits, width: W });
        }
        Ok(())
    }

    #[inline]
    fn push_bits(&mut self, bits: u16) -> Result<()> {
        if W == 8 {
            return self.sink.put(bits as u8);
        }
        self.acc |= u64::from(bits) << self.filled;
        self.filled += W;
        if self.filled == ACC_BITS {
            self.sink.put_slice(&self.acc.to_le_bytes())?;
            self.acc = 0;
            self.filled = 0;
        }
        Ok(())
    }

    /// Packs one accumulator's worth of values in a single pass.
    #[inline]
    fn pack_word<T: Packable>(chunk: &[T]) -> u64 {
        chunk
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, value)| {
                acc | (u64::from(value.to_bits()) << (i as u32 * W))
            })
    }
}

impl<T: Packable, C: Channel, const W: u32> ValueWriter<T> for BitPackWriter<C, W> {
    #[inline]
    fn write(&mut self, value: T) -> Result<()> {
        self.check_open()?;
        let bits = value.to_bits();
        Self::check_width(bits)?;
        self.push_bits(bits)
    }

    /// Writes nothing if any value of the batch is wider than `W` bits.
    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        self.check_open()?;
        for value in values {
            Self::check_width(value.to_bits())?;
        }
        if W == 8 {
            self.scratch.clear();
            self.scratch.extend(values.iter().map(|value| value.to_bits() as u8));
            return self.sink.put_slice(&self.scratch);
        }

        // Top up a partially filled accumulator one value at a time.
        let mut rest = values;
        while self.filled != 0 {
            let Some((first, tail)) = rest.split_first() else {
                return Ok(());
            };
            self.push_bits(first.to_bits())?;
            rest = tail;
        }

        let mut words = rest.chunks_exact(Self::PER_WORD);
        for chunk in &mut words {
            let word = Self::pack_word(chunk);
            self.sink.put_slice(&word.to_le_bytes())?;
        }
        for value in words.remainder() {
            self.push_bits(value.to_bits())?;
        }
        Ok(())
    }
}

impl<C: Channel, const W: u32> Codec for BitPackWriter<C, W> {
    fn channel_count(&self) -> usize {
        1
    }

    fn commit(&mut self) -> Result<()> {
        if self.filled == 0 {
            return Ok(());
        }
        let nbytes = self.filled.div_ceil(8) as usize;
        self.sink.put_slice(&self.acc.to_le_bytes()[..nbytes])?;
        self.sealed = self.filled % 8 != 0;
        self.acc = 0;
        self.filled = 0;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn reset(&mut self) -> Result<()> {
        if self.sink.emitted() > 0 {
            return Err(CodecError::InvalidState("reset after data was emitted"));
        }
        self.acc = 0;
        self.filled = 0;
        Ok(())
    }
}

impl<C: Channel, const W: u32> ColumnCodec<C> for BitPackWriter<C, W> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(single(channels)?, config))
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        let aligned = prior_rows * u64::from(W) % 8 == 0;
        match resume::select_strategy(&channels, aligned) {
            ResumeStrategy::Append => {
                debug!(
                    "Appending to {}-bit packed stream after {} prior values",
                    W, prior_rows
                );
                Self::open(channels, config)
            }
            // Raw bits round-trip through u16 regardless of the column's item type.
            ResumeStrategy::Replay => resume::replay::<u16, BitPackReader<BoxedSource, W>, Self, C>(
                channels, prior_rows, config,
            ),
        }
    }

    fn into_channels(self) -> Result<Vec<C>> {
        Ok(vec![self.into_channel()?])
    }
}

/// Bit-packing reader for values `W` bits wide.
pub struct BitPackReader<R: Read, const W: u32> {
    source: ByteSource<R>,
    bytes: Vec<u8>,
    /// Decoded values not yet handed out, from `staged_pos` on.
    staged: Vec<u16>,
    staged_pos: usize,
    exhausted: bool,
}

impl<R: Read, const W: u32> BitPackReader<R, W> {
    const VALID_WIDTH: () = assert!(
        W == 1 || W == 2 || W == 4 || W == 8 || W == 16,
        "bit width must be 1, 2, 4, 8 or 16"
    );

    /// Creates a reader over `source`.
    pub fn new(source: R, config: &CodecConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_WIDTH;
        Self {
            source: ByteSource::new(source, config.buffer_capacity),
            bytes: Vec::new(),
            staged: Vec::new(),
            staged_pos: 0,
            exhausted: false,
        }
    }

    /// Decodes enough bytes to cover about `wanted` values.
    fn refill(&mut self, wanted: usize) -> Result<()> {
        let byte_len = (wanted * W as usize).div_ceil(8).max(1);
        self.bytes.resize(byte_len, 0);
        let n = self.source.read_some(&mut self.bytes)?;
        if n < byte_len {
            self.exhausted = true;
        }

        self.staged.clear();
        self.staged_pos = 0;
        let bits = self.bytes[..n].view_bits::<Lsb0>();
        self.staged.extend(
            bits.chunks_exact(W as usize)
                .map(|chunk| chunk.load_le::<u16>()),
        );
        Ok(())
    }
}

impl<T: Packable, R: Read, const W: u32> ValueReader<T> for BitPackReader<R, W> {
    fn read(&mut self, out: &mut [T]) -> Result<usize> {
        let mut n = 0;
        while n < out.len() {
            if self.staged_pos == self.staged.len() {
                if self.exhausted {
                    break;
                }
                self.refill(out.len() - n)?;
                if self.staged.is_empty() {
                    break;
                }
            }
            let take = (self.staged.len() - self.staged_pos).min(out.len() - n);
            for (slot, bits) in out[n..n + take]
                .iter_mut()
                .zip(&self.staged[self.staged_pos..self.staged_pos + take])
            {
                *slot = T::from_bits(*bits);
            }
            self.staged_pos += take;
            n += take;
        }
        Ok(n)
    }
}

impl<R: Read, const W: u32> ColumnDecoder<R> for BitPackReader<R, W> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(single(sources)?, config))
    }
}

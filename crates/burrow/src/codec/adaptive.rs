//! Adaptive-width paired integer codec.
//!
//! Encodes sequences of unsigned 32- or 64-bit integers by storing only the
//! non-zero byte span of each value, with the width information of two
//! consecutive values sharing one control byte.
//!
//! # Algorithm Overview
//!
//! ## Width trimming
//!
//! For each non-zero value the encoder counts leading and trailing all-zero
//! bytes and drops whichever side has more (ties drop the leading side). The
//! result is described by a 4-bit flag:
//!
//! ```text
//!   bit 3    : shift  (trailing bytes were dropped; shift left on decode)
//!   bits 0-2 : width  (32-bit format: nbytes, 1..=4;
//!                      64-bit format: nbytes - 1, 0..=7)
//! ```
//!
//! The stored bytes are the little-endian low `nbytes` bytes of the value
//! (after shifting right for a trailing trim).
//!
//! ## Control bytes
//!
//! | Form            | 32-bit                      | 64-bit                         |
//! |-----------------|-----------------------------|--------------------------------|
//! | pair            | `flag(a) << 4 \| flag(b)`    | `flag(a) << 4 \| flag(b)`       |
//! | singleton value | `0x00 \| flag`               | `0xF0 \| flag`                  |
//! | singleton zero  | `0x00`                      | `0xFF`                         |
//! | zero run of N   | `0x80 \| (N - 2)`, N ≤ 17    | `(N - 2) << 4 \| 0x0F`, N ≤ 16  |
//!
//! The two formats are distinct wire formats: they differ in the width
//! convention and in which nibble patterns are reserved.
//!
//! ## Zeros
//!
//! Exact zeros never take a pair slot. They accumulate in a run counter that
//! is emitted as a run record (or, for a run of one, as the singleton zero)
//! when a non-zero value arrives, when the run reaches the format's cap, or on
//! commit. A value still waiting for its pair partner when a run is emitted is
//! written first as a singleton, so decode order always matches write order.

use crate::bits::Word;
use crate::channel::{BoxedSource, Channel};
use crate::codec::io::{ByteSink, ByteSource};
use crate::codec::{single, Codec, ColumnCodec, ColumnDecoder, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::resume::{self, ResumeStrategy};
use std::io::Read;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Width description of one trimmed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    /// Number of payload bytes.
    pub nbytes: u32,
    /// Whether the payload must be shifted left to its original position.
    pub shifted: bool,
}

impl Flag {
    /// Trims `value` (which must be non-zero) to its non-zero byte span,
    /// returning the flag and the stored payload.
    #[inline]
    pub fn trim<W: Word>(value: W) -> (Self, u64) {
        debug_assert!(value != W::ZERO, "zeros are run-length encoded, never trimmed");
        let leading = value.leading_zero_bytes();
        let trailing = value.trailing_zero_bytes();
        let width = W::BYTES as u32;
        if trailing > leading {
            let flag = Self {
                nbytes: width - trailing,
                shifted: true,
            };
            (flag, value.to_u64() >> (8 * trailing))
        } else {
            let flag = Self {
                nbytes: width - leading,
                shifted: false,
            };
            (flag, value.to_u64())
        }
    }
}

/// Decoded meaning of a control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Two values follow.
    Pair(Flag, Flag),
    /// One value follows.
    Single(Flag),
    /// One zero value, no payload.
    Zero,
    /// A run of zero values, no payload.
    ZeroRun(u32),
    /// Reserved pattern; the stream is malformed.
    Invalid,
}

/// Wire format of one adaptive codec width.
pub trait PairedFormat: Send + 'static {
    /// Word type the format encodes.
    type Word: Word;

    /// Longest zero run a single record can hold.
    const MAX_ZERO_RUN: u32;

    /// Encodes a flag as a nibble.
    fn nibble(flag: Flag) -> u8;

    /// Decodes a nibble, or `None` for a reserved pattern.
    fn parse_nibble(nibble: u8) -> Option<Flag>;

    /// Control byte for a lone value with flag nibble `nibble`.
    fn single(nibble: u8) -> u8;

    /// Control byte for a lone zero.
    fn zero() -> u8;

    /// Control byte for a run of `len` zeros, `2 <= len <= MAX_ZERO_RUN`.
    fn zero_run(len: u32) -> u8;

    /// Decodes a control byte.
    fn classify(control: u8) -> Control;

    /// Control byte for two values.
    #[inline]
    fn pair(first: u8, second: u8) -> u8 {
        (first << 4) | second
    }
}

/// The 32-bit paired format: width field holds `nbytes` directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Format32;

impl PairedFormat for Format32 {
    type Word = u32;
    const MAX_ZERO_RUN: u32 = 17;

    #[inline]
    fn nibble(flag: Flag) -> u8 {
        debug_assert!((1..=4).contains(&flag.nbytes));
        ((flag.shifted as u8) << 3) | flag.nbytes as u8
    }

    #[inline]
    fn parse_nibble(nibble: u8) -> Option<Flag> {
        let nbytes = (nibble & 0x07) as u32;
        (1..=4).contains(&nbytes).then_some(Flag {
            nbytes,
            shifted: nibble & 0x08 != 0,
        })
    }

    #[inline]
    fn single(nibble: u8) -> u8 {
        nibble
    }

    #[inline]
    fn zero() -> u8 {
        0x00
    }

    #[inline]
    fn zero_run(len: u32) -> u8 {
        debug_assert!((2..=Self::MAX_ZERO_RUN).contains(&len));
        0x80 | (len - 2) as u8
    }

    fn classify(control: u8) -> Control {
        let high = control >> 4;
        let low = control & 0x0F;
        match high {
            0x0 if low == 0 => Control::Zero,
            0x0 => Self::parse_nibble(low).map_or(Control::Invalid, Control::Single),
            0x8 => Control::ZeroRun(low as u32 + 2),
            _ => match (Self::parse_nibble(high), Self::parse_nibble(low)) {
                (Some(first), Some(second)) => Control::Pair(first, second),
                _ => Control::Invalid,
            },
        }
    }
}

/// The 64-bit paired format: width field holds `nbytes - 1`.
///
/// Every nibble except `0xF` (shift with a full 8-byte width, which trimming
/// never produces) is a valid flag, so all sentinels are built around `0xF`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Format64;

impl PairedFormat for Format64 {
    type Word = u64;
    const MAX_ZERO_RUN: u32 = 16;

    #[inline]
    fn nibble(flag: Flag) -> u8 {
        debug_assert!((1..=8).contains(&flag.nbytes));
        debug_assert!(!(flag.shifted && flag.nbytes == 8));
        ((flag.shifted as u8) << 3) | (flag.nbytes - 1) as u8
    }

    #[inline]
    fn parse_nibble(nibble: u8) -> Option<Flag> {
        (nibble != 0x0F).then_some(Flag {
            nbytes: (nibble & 0x07) as u32 + 1,
            shifted: nibble & 0x08 != 0,
        })
    }

    #[inline]
    fn single(nibble: u8) -> u8 {
        0xF0 | nibble
    }

    #[inline]
    fn zero() -> u8 {
        0xFF
    }

    #[inline]
    fn zero_run(len: u32) -> u8 {
        debug_assert!((2..=Self::MAX_ZERO_RUN).contains(&len));
        (((len - 2) as u8) << 4) | 0x0F
    }

    fn classify(control: u8) -> Control {
        let high = control >> 4;
        let low = control & 0x0F;
        if high == 0x0F {
            if low == 0x0F {
                Control::Zero
            } else {
                Self::parse_nibble(low).map_or(Control::Invalid, Control::Single)
            }
        } else if low == 0x0F {
            Control::ZeroRun(high as u32 + 2)
        } else {
            match (Self::parse_nibble(high), Self::parse_nibble(low)) {
                (Some(first), Some(second)) => Control::Pair(first, second),
                _ => Control::Invalid,
            }
        }
    }
}

/// Writer for the adaptive paired codec.
pub struct AdaptiveWriter<F: PairedFormat, C: Channel> {
    sink: ByteSink<C>,
    /// First value of a pair still waiting for its partner.
    pending: Option<F::Word>,
    /// Zeros counted but not yet emitted.
    zero_run: u32,
    _format: PhantomData<F>,
}

impl<F: PairedFormat, C: Channel> AdaptiveWriter<F, C> {
    /// Creates a writer bound to `channel`.
    pub fn new(channel: C, config: &CodecConfig) -> Self {
        Self {
            sink: ByteSink::new(channel, config.buffer_capacity),
            pending: None,
            zero_run: 0,
            _format: PhantomData,
        }
    }

    /// Flushes buffered bytes and returns the channel.
    pub fn into_channel(self) -> Result<C> {
        self.sink.into_inner()
    }

    #[inline]
    fn put_payload(&mut self, flag: Flag, stored: u64) -> Result<()> {
        self.sink
            .put_slice(&stored.to_le_bytes()[..flag.nbytes as usize])
    }

    fn emit_single(&mut self, value: F::Word) -> Result<()> {
        let (flag, stored) = Flag::trim(value);
        self.sink.put(F::single(F::nibble(flag)))?;
        self.put_payload(flag, stored)
    }

    #[inline]
    fn emit_pair(&mut self, first: F::Word, second: F::Word) -> Result<()> {
        let (first_flag, first_stored) = Flag::trim(first);
        let (second_flag, second_stored) = Flag::trim(second);
        self.sink
            .put(F::pair(F::nibble(first_flag), F::nibble(second_flag)))?;
        self.put_payload(first_flag, first_stored)?;
        self.put_payload(second_flag, second_stored)
    }

    fn flush_zero_run(&mut self) -> Result<()> {
        if let Some(first) = self.pending.take() {
            self.emit_single(first)?;
        }
        match self.zero_run {
            0 => {}
            1 => self.sink.put(F::zero())?,
            len => self.sink.put(F::zero_run(len))?,
        }
        self.zero_run = 0;
        Ok(())
    }
}

impl<F: PairedFormat, C: Channel> ValueWriter<F::Word> for AdaptiveWriter<F, C> {
    #[inline]
    fn write(&mut self, value: F::Word) -> Result<()> {
        if value == F::Word::ZERO {
            self.zero_run += 1;
            if self.zero_run == F::MAX_ZERO_RUN {
                self.flush_zero_run()?;
            }
            return Ok(());
        }

        if self.zero_run > 0 {
            self.flush_zero_run()?;
        }

        match self.pending.take() {
            Some(first) => self.emit_pair(first, value),
            None => {
                self.pending = Some(value);
                Ok(())
            }
        }
    }
}

impl<F: PairedFormat, C: Channel> Codec for AdaptiveWriter<F, C> {
    fn channel_count(&self) -> usize {
        1
    }

    fn commit(&mut self) -> Result<()> {
        if self.zero_run > 0 {
            self.flush_zero_run()
        } else if let Some(value) = self.pending.take() {
            self.emit_single(value)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn reset(&mut self) -> Result<()> {
        if self.sink.emitted() > 0 {
            return Err(CodecError::InvalidState("reset after data was emitted"));
        }
        self.pending = None;
        self.zero_run = 0;
        Ok(())
    }
}

impl<F: PairedFormat, C: Channel> ColumnCodec<C> for AdaptiveWriter<F, C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(single(channels)?, config))
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        match resume::select_strategy(&channels, true) {
            // Committed state is empty: records are self-delimiting, so new
            // records can follow the old ones directly.
            ResumeStrategy::Append => {
                debug!("Appending to adaptive stream after {} prior values", prior_rows);
                Self::open(channels, config)
            }
            ResumeStrategy::Replay => resume::replay::<
                F::Word,
                AdaptiveReader<F, BoxedSource>,
                Self,
                C,
            >(channels, prior_rows, config),
        }
    }

    fn into_channels(self) -> Result<Vec<C>> {
        Ok(vec![self.into_channel()?])
    }
}

/// Reader for the adaptive paired codec.
pub struct AdaptiveReader<F: PairedFormat, R: Read> {
    source: ByteSource<R>,
    /// Second value of a decoded pair not yet handed out.
    queued: Option<F::Word>,
    /// Zeros of a decoded run not yet handed out.
    zeros: u32,
    exhausted: bool,
    _format: PhantomData<F>,
}

impl<F: PairedFormat, R: Read> AdaptiveReader<F, R> {
    /// Creates a reader over `source`.
    pub fn new(source: R, config: &CodecConfig) -> Self {
        Self {
            source: ByteSource::new(source, config.buffer_capacity),
            queued: None,
            zeros: 0,
            exhausted: false,
            _format: PhantomData,
        }
    }

    fn read_payload(&mut self, flag: Flag) -> Result<Option<F::Word>> {
        let mut bytes = [0u8; 8];
        let nbytes = flag.nbytes as usize;
        if !self.source.read_full(&mut bytes[..nbytes])? {
            return Ok(None);
        }
        let raw = u64::from_le_bytes(bytes);
        let value = if flag.shifted {
            raw << (8 * (F::Word::BYTES - nbytes))
        } else {
            raw
        };
        Ok(Some(F::Word::from_u64(value)))
    }

    fn truncated(&mut self) {
        warn!("Adaptive stream ends inside a payload; treating as end of data");
        self.exhausted = true;
    }
}

impl<F: PairedFormat, R: Read> ValueReader<F::Word> for AdaptiveReader<F, R> {
    fn read(&mut self, out: &mut [F::Word]) -> Result<usize> {
        let mut n = 0;
        while n < out.len() {
            if self.zeros > 0 {
                let take = (self.zeros as usize).min(out.len() - n);
                out[n..n + take].fill(F::Word::ZERO);
                n += take;
                self.zeros -= take as u32;
                continue;
            }
            if let Some(value) = self.queued.take() {
                out[n] = value;
                n += 1;
                continue;
            }
            if self.exhausted {
                break;
            }

            let Some(control) = self.source.read_byte()? else {
                self.exhausted = true;
                break;
            };
            match F::classify(control) {
                Control::Pair(first_flag, second_flag) => {
                    let first = self.read_payload(first_flag)?;
                    let second = self.read_payload(second_flag)?;
                    match (first, second) {
                        (Some(first), Some(second)) => {
                            out[n] = first;
                            n += 1;
                            self.queued = Some(second);
                        }
                        (Some(first), None) => {
                            out[n] = first;
                            n += 1;
                            self.truncated();
                        }
                        _ => self.truncated(),
                    }
                }
                Control::Single(flag) => match self.read_payload(flag)? {
                    Some(value) => {
                        out[n] = value;
                        n += 1;
                    }
                    None => self.truncated(),
                },
                Control::Zero => self.zeros = 1,
                Control::ZeroRun(len) => self.zeros = len,
                Control::Invalid => {
                    warn!(
                        "Malformed adaptive control byte {:#04x}; treating as end of data",
                        control
                    );
                    self.exhausted = true;
                }
            }
        }
        Ok(n)
    }
}

impl<F: PairedFormat, R: Read> ColumnDecoder<R> for AdaptiveReader<F, R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(single(sources)?, config))
    }
}

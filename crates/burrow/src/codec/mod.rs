//! Column stream codecs.
//!
//! Every codec is a writer/reader pair bound to one or more [`Channel`]s:
//!
//! - [`adaptive`]: paired adaptive-width integer codec (32- and 64-bit formats)
//! - [`bitpack`]: exact-width bit packing for 1/2/4/8/16-bit values and booleans
//! - [`varlen`]: length-prefixed strings and blobs
//! - [`plain`]: fixed-width little-endian values
//! - [`numeric`]: values passed straight to the primitive codec of their width
//! - [`delta`], [`xor`], [`delta_delta`], [`dfcm`]: transforms that wrap a
//!   primitive codec chosen by the value's word width
//!
//! # Lifecycle
//!
//! ```text
//! open(channels) → write* → commit → flush / into_channels
//!        └─ resume(channels, prior_rows) ─┘
//! ```
//!
//! `commit` emits any half-formed state (pending pairs, zero runs, partial
//! frames and accumulators) and must run exactly once before the page is
//! finalized. `flush` only pushes buffered bytes to the channels.

pub mod adaptive;
pub mod bitpack;
pub mod delta;
pub mod delta_delta;
pub mod dfcm;
pub(crate) mod io;
pub mod numeric;
pub mod plain;
pub mod varlen;
pub mod xor;

use crate::bits::Word;
use crate::channel::Channel;
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use std::io::Read;

pub use adaptive::{AdaptiveReader, AdaptiveWriter, Format32, Format64, PairedFormat};
pub use bitpack::{BitPackReader, BitPackWriter, Packable};
pub use delta::{Delta, DeltaReader, DeltaWriter, Difference, DifferenceReader, DifferenceWriter};
pub use delta_delta::{DeltaDeltaReader, DeltaDeltaWriter, FRAME_LEN};
pub use dfcm::{DfcmReader, DfcmWriter};
pub use numeric::{NumericReader, NumericWriter};
pub use plain::{FixedBytes, PlainReader, PlainWriter};
pub use varlen::{VarLenReader, VarLenWriter};
pub use xor::{Xor, XorReader, XorWriter};

/// Lifecycle operations shared by every column writer.
pub trait Codec {
    /// Number of channels this codec is bound to.
    fn channel_count(&self) -> usize;

    /// Emits all half-formed encoder state.
    ///
    /// A second commit with no writes in between emits nothing.
    fn commit(&mut self) -> Result<()>;

    /// Pushes buffered bytes to the channels without changing logical content.
    fn flush(&mut self) -> Result<()>;

    /// Clears encoder state. Only valid before any byte has been emitted.
    fn reset(&mut self) -> Result<()>;
}

/// A writer accepting values of type `T`.
pub trait ValueWriter<T: Copy>: Codec {
    /// Appends one value.
    fn write(&mut self, value: T) -> Result<()>;

    /// Appends a batch of values.
    ///
    /// Produces exactly the bytes that writing the values one at a time would.
    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        for &value in values {
            self.write(value)?;
        }
        Ok(())
    }
}

/// A forward-only reader producing values of type `T`.
pub trait ValueReader<T> {
    /// Decodes up to `out.len()` values into `out`, returning how many were
    /// produced. A short count means the committed data is exhausted (or the
    /// remainder is malformed).
    fn read(&mut self, out: &mut [T]) -> Result<usize>;
}

/// Construction, resumption and teardown of a writer bound to channels `C`.
pub trait ColumnCodec<C: Channel>: Codec + Sized {
    /// Binds a fresh writer to empty channels.
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self>;

    /// Reopens a writer over channels holding `prior_rows` committed values so
    /// that further writes continue the same logical sequence.
    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self>;

    /// Flushes buffered bytes and returns the channels.
    fn into_channels(self) -> Result<Vec<C>>;
}

/// Construction of a reader over byte sources `R`.
pub trait ColumnDecoder<R: Read>: Sized {
    /// Binds a reader to the sources of a committed column, one per channel.
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self>;
}

/// Word widths that have a primitive codec for derived transforms to wrap.
///
/// `u8` and `u16` map onto bit packing at width 8 and 16; `u32` and `u64`
/// map onto the 32- and 64-bit adaptive paired formats.
pub trait PrimitiveWord: Word {
    /// Primitive writer for this width.
    type Encoder<C: Channel>: ValueWriter<Self> + ColumnCodec<C>;
    /// Primitive reader for this width.
    type Decoder<R: Read>: ValueReader<Self> + ColumnDecoder<R>;
}

impl PrimitiveWord for u8 {
    type Encoder<C: Channel> = BitPackWriter<C, 8>;
    type Decoder<R: Read> = BitPackReader<R, 8>;
}

impl PrimitiveWord for u16 {
    type Encoder<C: Channel> = BitPackWriter<C, 16>;
    type Decoder<R: Read> = BitPackReader<R, 16>;
}

impl PrimitiveWord for u32 {
    type Encoder<C: Channel> = AdaptiveWriter<Format32, C>;
    type Decoder<R: Read> = AdaptiveReader<Format32, R>;
}

impl PrimitiveWord for u64 {
    type Encoder<C: Channel> = AdaptiveWriter<Format64, C>;
    type Decoder<R: Read> = AdaptiveReader<Format64, R>;
}

/// Checks that exactly `expected` channels (or sources) were supplied.
pub(crate) fn expect_channels<T>(items: &[T], expected: usize) -> Result<()> {
    if items.len() == expected {
        Ok(())
    } else {
        Err(CodecError::ChannelCount {
            expected,
            actual: items.len(),
        })
    }
}

/// Unwraps the only channel (or source) of a single-channel codec.
pub(crate) fn single<T>(items: Vec<T>) -> Result<T> {
    expect_channels(&items, 1)?;
    items
        .into_iter()
        .next()
        .ok_or(CodecError::ChannelCount {
            expected: 1,
            actual: 0,
        })
}

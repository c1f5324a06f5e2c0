//! DFCM (differential finite context method) predictive encoding.
//!
//! A table of 4096 deltas is indexed by a hash of the most recent deltas.
//! The prediction for the next value is `last + table[hash]`; the writer
//! transmits `prediction ^ actual`, which is zero whenever the delta pattern
//! repeats. Both sides then store the true delta in the table slot, fold it
//! into the hash and move `last` forward.
//!
//! The table is never serialized, so a writer resuming over committed data
//! always replays it to rebuild the predictor.

use crate::bits::Word;
use crate::channel::{BoxedSource, Channel};
use crate::codec::{Codec, ColumnCodec, ColumnDecoder, PrimitiveWord, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::resume;
use crate::value::BitCast;
use std::io::Read;

/// log2 of the predictor table size.
pub const TABLE_BITS: u32 = 12;

const TABLE_LEN: usize = 1 << TABLE_BITS;

/// Delta bits kept per hash step.
const HASH_DELTA_BITS: u32 = 24;

#[derive(Debug, Clone)]
struct Predictor<W: Word> {
    table: Vec<W>,
    hash: usize,
    last: W,
}

impl<W: Word> Predictor<W> {
    fn new() -> Self {
        Self {
            table: vec![W::ZERO; TABLE_LEN],
            hash: 0,
            last: W::ZERO,
        }
    }

    #[inline]
    fn predict(&self) -> W {
        self.last.wrapping_add(self.table[self.hash])
    }

    #[inline]
    fn update(&mut self, actual: W) {
        let delta = actual.wrapping_sub(self.last);
        self.table[self.hash] = delta;
        let mixed = (delta.to_u64() >> W::BITS.saturating_sub(HASH_DELTA_BITS)) as usize;
        self.hash = ((self.hash << 2) ^ mixed) & (TABLE_LEN - 1);
        self.last = actual;
    }

    fn reset(&mut self) {
        self.table.fill(W::ZERO);
        self.hash = 0;
        self.last = W::ZERO;
    }
}

type Encoder<T, C> = <<T as BitCast>::Word as PrimitiveWord>::Encoder<C>;
type Decoder<T, R> = <<T as BitCast>::Word as PrimitiveWord>::Decoder<R>;

/// DFCM writer.
pub struct DfcmWriter<T: BitCast, C: Channel> {
    inner: Encoder<T, C>,
    predictor: Predictor<T::Word>,
    transmitted: Vec<T::Word>,
}

impl<T: BitCast, C: Channel> DfcmWriter<T, C> {
    #[inline]
    fn transform(&mut self, value: T) -> T::Word {
        let actual = value.to_word();
        let residual = self.predictor.predict() ^ actual;
        self.predictor.update(actual);
        residual
    }
}

impl<T: BitCast, C: Channel> ValueWriter<T> for DfcmWriter<T, C> {
    #[inline]
    fn write(&mut self, value: T) -> Result<()> {
        let residual = self.transform(value);
        self.inner.write(residual)
    }

    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        let mut transmitted = std::mem::take(&mut self.transmitted);
        transmitted.clear();
        transmitted.extend(values.iter().map(|&value| self.transform(value)));
        let result = self.inner.write_batch(&transmitted);
        self.transmitted = transmitted;
        result
    }
}

impl<T: BitCast, C: Channel> Codec for DfcmWriter<T, C> {
    fn channel_count(&self) -> usize {
        self.inner.channel_count()
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()?;
        self.predictor.reset();
        Ok(())
    }
}

impl<T: BitCast, C: Channel> ColumnCodec<C> for DfcmWriter<T, C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self {
            inner: Encoder::<T, C>::open(channels, config)?,
            predictor: Predictor::new(),
            transmitted: Vec::new(),
        })
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        resume::replay::<T, DfcmReader<T, BoxedSource>, Self, C>(channels, prior_rows, config)
    }

    fn into_channels(self) -> Result<Vec<C>> {
        self.inner.into_channels()
    }
}

/// DFCM reader.
pub struct DfcmReader<T: BitCast, R: Read> {
    inner: Decoder<T, R>,
    predictor: Predictor<T::Word>,
    words: Vec<T::Word>,
}

impl<T: BitCast, R: Read> ValueReader<T> for DfcmReader<T, R> {
    fn read(&mut self, out: &mut [T]) -> Result<usize> {
        self.words.resize(out.len(), T::Word::ZERO);
        let n = self.inner.read(&mut self.words[..])?;
        for (slot, &residual) in out.iter_mut().zip(&self.words[..n]) {
            let actual = self.predictor.predict() ^ residual;
            self.predictor.update(actual);
            *slot = T::from_word(actual);
        }
        Ok(n)
    }
}

impl<T: BitCast, R: Read> ColumnDecoder<R> for DfcmReader<T, R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self {
            inner: Decoder::<T, R>::open(sources, config)?,
            predictor: Predictor::new(),
            words: Vec::new(),
        })
    }
}

//! Difference transforms over consecutive values.
//!
//! A difference codec reinterprets each value as its [`Word`](crate::bits::Word),
//! transmits a function of the current and previous word, and hands the result
//! to the primitive codec for that width (see [`PrimitiveWord`]). The only
//! carried state is the previous word, which starts at zero.
//!
//! - [`Delta`]: `fold_sign(current - previous)`, wrapping
//! - [`Xor`](crate::codec::xor::Xor): `current ^ previous`
//!
//! Batches are transformed in one pass against a copy of the batch shifted by
//! one value; single writes go through the scalar path. Both produce the same
//! words, so the bytes never depend on how writes were chunked.

use crate::bits::Word;
use crate::channel::{BoxedSource, Channel};
use crate::codec::{single, Codec, ColumnCodec, ColumnDecoder, PrimitiveWord, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::resume::{self, ResumeStrategy};
use crate::value::BitCast;
use std::io::Read;
use std::marker::PhantomData;
use tracing::debug;

/// A reversible transform of a word against its predecessor.
pub trait Difference: Send + 'static {
    /// Name used in log messages.
    const NAME: &'static str;

    /// Word transmitted for `current`.
    fn encode<W: Word>(previous: W, current: W) -> W;

    /// Inverse of [`Difference::encode`].
    fn decode<W: Word>(previous: W, transmitted: W) -> W;
}

/// Sign-folded wrapping subtraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delta;

impl Difference for Delta {
    const NAME: &'static str = "delta";

    #[inline]
    fn encode<W: Word>(previous: W, current: W) -> W {
        current.wrapping_sub(previous).fold_sign()
    }

    #[inline]
    fn decode<W: Word>(previous: W, transmitted: W) -> W {
        previous.wrapping_add(transmitted.unfold_sign())
    }
}

type Encoder<T, C> = <<T as BitCast>::Word as PrimitiveWord>::Encoder<C>;
type Decoder<T, R> = <<T as BitCast>::Word as PrimitiveWord>::Decoder<R>;

/// Writer applying difference transform `D` to values of type `T`.
pub struct DifferenceWriter<D: Difference, T: BitCast, C: Channel> {
    inner: Encoder<T, C>,
    prev: T::Word,
    words: Vec<T::Word>,
    transmitted: Vec<T::Word>,
    _transform: PhantomData<D>,
}

/// Delta writer.
pub type DeltaWriter<T, C> = DifferenceWriter<Delta, T, C>;

/// Delta reader.
pub type DeltaReader<T, R> = DifferenceReader<Delta, T, R>;

impl<D: Difference, T: BitCast, C: Channel> DifferenceWriter<D, T, C> {
    fn with_inner(inner: Encoder<T, C>, prev: T::Word) -> Self {
        Self {
            inner,
            prev,
            words: Vec::new(),
            transmitted: Vec::new(),
            _transform: PhantomData,
        }
    }

    /// Transforms one value without touching the batch buffers.
    #[inline]
    pub fn write_scalar(&mut self, value: T) -> Result<()> {
        let word = value.to_word();
        let transmitted = D::encode(self.prev, word);
        self.prev = word;
        self.inner.write(transmitted)
    }
}

impl<D: Difference, T: BitCast, C: Channel> ValueWriter<T> for DifferenceWriter<D, T, C> {
    #[inline]
    fn write(&mut self, value: T) -> Result<()> {
        self.write_scalar(value)
    }

    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        let Self {
            inner,
            prev,
            words,
            transmitted,
            ..
        } = self;

        words.clear();
        T::to_words(values, words);
        let (Some(&first), Some(&last)) = (words.first(), words.last()) else {
            return Ok(());
        };

        transmitted.clear();
        transmitted.reserve(words.len());
        transmitted.push(D::encode(*prev, first));
        transmitted.extend(
            words
                .iter()
                .zip(&words[1..])
                .map(|(&previous, &current)| D::encode(previous, current)),
        );
        *prev = last;
        inner.write_batch(transmitted)
    }
}

impl<D: Difference, T: BitCast, C: Channel> Codec for DifferenceWriter<D, T, C> {
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
        self.prev = T::Word::ZERO;
        Ok(())
    }
}

impl<D: Difference, T: BitCast, C: Channel> ColumnCodec<C> for DifferenceWriter<D, T, C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::with_inner(Encoder::<T, C>::open(channels, config)?, T::Word::ZERO))
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        match resume::select_strategy(&channels, true) {
            ResumeStrategy::Append => {
                let mut channel = single(channels)?;
                let (seen, last) = {
                    let source = channel.open_reader()?;
                    let mut reader = DifferenceReader::<D, T, _>::open(vec![source], config)?;
                    resume::last_value(&mut reader, prior_rows, config.replay_chunk)?
                };
                debug!(
                    "Appending to {} stream after {} prior values",
                    D::NAME,
                    seen
                );
                let inner = Encoder::<T, C>::open(vec![channel], config)?;
                Ok(Self::with_inner(inner, last.map_or(T::Word::ZERO, T::to_word)))
            }
            ResumeStrategy::Replay => resume::replay::<T, DifferenceReader<D, T, BoxedSource>, Self, C>(
                channels, prior_rows, config,
            ),
        }
    }

    fn into_channels(self) -> Result<Vec<C>> {
        self.inner.into_channels()
    }
}

/// Reader inverting difference transform `D`.
pub struct DifferenceReader<D: Difference, T: BitCast, R: Read> {
    inner: Decoder<T, R>,
    prev: T::Word,
    words: Vec<T::Word>,
    _transform: PhantomData<(D, T)>,
}

impl<D: Difference, T: BitCast, R: Read> ValueReader<T> for DifferenceReader<D, T, R> {
    fn read(&mut self, out: &mut [T]) -> Result<usize> {
        self.words.resize(out.len(), T::Word::ZERO);
        let n = self.inner.read(&mut self.words[..])?;
        for word in &mut self.words[..n] {
            self.prev = D::decode(self.prev, *word);
            *word = self.prev;
        }
        T::from_words(&self.words[..n], &mut out[..n]);
        Ok(n)
    }
}

impl<D: Difference, T: BitCast, R: Read> ColumnDecoder<R> for DifferenceReader<D, T, R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self {
            inner: Decoder::<T, R>::open(sources, config)?,
            prev: T::Word::ZERO,
            words: Vec::new(),
            _transform: PhantomData,
        })
    }
}

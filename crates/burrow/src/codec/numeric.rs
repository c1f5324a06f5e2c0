//! Column values written straight through the primitive codec of their word
//! width, with no derived transform.
//!
//! Signed types are sign-folded first so that small negative values keep
//! their leading zero bytes.

use crate::bits::Word;
use crate::channel::{BoxedSource, Channel};
use crate::codec::{Codec, ColumnCodec, ColumnDecoder, PrimitiveWord, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::resume::{self, ResumeStrategy};
use crate::value::BitCast;
use std::io::Read;
use tracing::debug;

#[inline]
fn to_transmitted<T: BitCast>(value: T) -> T::Word {
    let word = value.to_word();
    if T::SIGNED {
        word.fold_sign()
    } else {
        word
    }
}

/// Writer passing values of type `T` to the primitive codec of `T::Word`.
pub struct NumericWriter<T: BitCast, C: Channel> {
    inner: <T::Word as PrimitiveWord>::Encoder<C>,
    words: Vec<T::Word>,
}

impl<T: BitCast, C: Channel> ValueWriter<T> for NumericWriter<T, C> {
    #[inline]
    fn write(&mut self, value: T) -> Result<()> {
        self.inner.write(to_transmitted(value))
    }

    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        self.words.clear();
        self.words.extend(values.iter().map(|&value| to_transmitted(value)));
        self.inner.write_batch(&self.words)
    }
}

impl<T: BitCast, C: Channel> Codec for NumericWriter<T, C> {
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
        self.inner.reset()
    }
}

impl<T: BitCast, C: Channel> ColumnCodec<C> for NumericWriter<T, C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self {
            inner: <T::Word as PrimitiveWord>::Encoder::<C>::open(channels, config)?,
            words: Vec::new(),
        })
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        match resume::select_strategy(&channels, true) {
            ResumeStrategy::Append => {
                debug!("Appending to numeric stream after {} prior values", prior_rows);
                Ok(Self {
                    inner: <T::Word as PrimitiveWord>::Encoder::<C>::resume(
                        channels, prior_rows, config,
                    )?,
                    words: Vec::new(),
                })
            }
            ResumeStrategy::Replay => resume::replay::<T, NumericReader<T, BoxedSource>, Self, C>(
                channels, prior_rows, config,
            ),
        }
    }

    fn into_channels(self) -> Result<Vec<C>> {
        self.inner.into_channels()
    }
}

/// Reader for [`NumericWriter`] output.
pub struct NumericReader<T: BitCast, R: Read> {
    inner: <T::Word as PrimitiveWord>::Decoder<R>,
    words: Vec<T::Word>,
}

impl<T: BitCast, R: Read> ValueReader<T> for NumericReader<T, R> {
    fn read(&mut self, out: &mut [T]) -> Result<usize> {
        self.words.resize(out.len(), T::Word::ZERO);
        let n = self.inner.read(&mut self.words[..])?;
        if T::SIGNED {
            for word in &mut self.words[..n] {
                *word = word.unfold_sign();
            }
        }
        T::from_words(&self.words[..n], &mut out[..n]);
        Ok(n)
    }
}

impl<T: BitCast, R: Read> ColumnDecoder<R> for NumericReader<T, R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self {
            inner: <T::Word as PrimitiveWord>::Decoder::<R>::open(sources, config)?,
            words: Vec::new(),
        })
    }
}

//! Frame-based delta-delta encoding.
//!
//! Values are converted to deltas against the running previous value and
//! grouped into frames of [`FRAME_LEN`]. Each frame is written through the
//! primitive codec as
//!
//! ```text
//! fold_sign(min)  d0 - min  d1 - min  ...  d15 - min
//! ```
//!
//! where `min` is the smallest delta of the frame compared as signed. For a
//! regular series the rebased deltas are all zero and collapse into zero runs.
//!
//! A frame still partially filled at `commit` is written with a minimum of 0
//! and its raw deltas. The rest of that frame stays open: values written
//! afterwards (by this writer or one resumed over the same channel) go out
//! raw until the frame holds 16 values, so frame boundaries never move.

use crate::bits::Word;
use crate::channel::{BoxedSource, Channel};
use crate::codec::{single, Codec, ColumnCodec, ColumnDecoder, PrimitiveWord, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::resume::{self, ResumeStrategy};
use crate::value::BitCast;
use std::io::Read;
use tracing::debug;

/// Number of values per frame.
pub const FRAME_LEN: usize = 16;

type Encoder<T, C> = <<T as BitCast>::Word as PrimitiveWord>::Encoder<C>;
type Decoder<T, R> = <<T as BitCast>::Word as PrimitiveWord>::Decoder<R>;

/// Delta-delta writer.
pub struct DeltaDeltaWriter<T: BitCast, C: Channel> {
    inner: Encoder<T, C>,
    prev: T::Word,
    /// Deltas of the frame being assembled.
    frame: Vec<T::Word>,
    /// Values still owed to a frame whose minimum is already written.
    open_tail: usize,
    deltas: Vec<T::Word>,
    rebased: Vec<T::Word>,
}

impl<T: BitCast, C: Channel> DeltaDeltaWriter<T, C> {
    fn with_inner(inner: Encoder<T, C>, prev: T::Word, open_tail: usize) -> Self {
        Self {
            inner,
            prev,
            frame: Vec::with_capacity(FRAME_LEN),
            open_tail,
            deltas: Vec::new(),
            rebased: Vec::with_capacity(FRAME_LEN + 1),
        }
    }

    fn emit_frame(&mut self, frame: &[T::Word]) -> Result<()> {
        debug_assert_eq!(frame.len(), FRAME_LEN);
        let min = frame
            .iter()
            .fold(frame[0], |min, &delta| min.signed_min(delta));
        self.rebased.clear();
        self.rebased.push(min.fold_sign());
        self.rebased
            .extend(frame.iter().map(|&delta| delta.wrapping_sub(min)));
        self.inner.write_batch(&self.rebased)
    }

    /// Routes deltas to the open tail, the frame buffer and whole frames.
    fn push_deltas(&mut self, mut deltas: &[T::Word]) -> Result<()> {
        if self.open_tail > 0 {
            let take = self.open_tail.min(deltas.len());
            self.inner.write_batch(&deltas[..take])?;
            self.open_tail -= take;
            deltas = &deltas[take..];
        }

        if !self.frame.is_empty() {
            let take = (FRAME_LEN - self.frame.len()).min(deltas.len());
            self.frame.extend_from_slice(&deltas[..take]);
            deltas = &deltas[take..];
            if self.frame.len() < FRAME_LEN {
                return Ok(());
            }
            let frame = std::mem::take(&mut self.frame);
            self.emit_frame(&frame)?;
            self.frame = frame;
            self.frame.clear();
        }

        let mut frames = deltas.chunks_exact(FRAME_LEN);
        for frame in &mut frames {
            self.emit_frame(frame)?;
        }
        self.frame.extend_from_slice(frames.remainder());
        Ok(())
    }
}

impl<T: BitCast, C: Channel> ValueWriter<T> for DeltaDeltaWriter<T, C> {
    #[inline]
    fn write(&mut self, value: T) -> Result<()> {
        let word = value.to_word();
        let delta = word.wrapping_sub(self.prev);
        self.prev = word;
        self.push_deltas(&[delta])
    }

    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        let mut deltas = std::mem::take(&mut self.deltas);
        deltas.clear();
        let words: Vec<T::Word> = values.iter().map(|value| value.to_word()).collect();
        if let (Some(&first), Some(&last)) = (words.first(), words.last()) {
            deltas.push(first.wrapping_sub(self.prev));
            deltas.extend(
                words
                    .iter()
                    .zip(&words[1..])
                    .map(|(&previous, &current)| current.wrapping_sub(previous)),
            );
            self.prev = last;
        }
        let result = self.push_deltas(&deltas);
        self.deltas = deltas;
        result
    }
}

impl<T: BitCast, C: Channel> Codec for DeltaDeltaWriter<T, C> {
    fn channel_count(&self) -> usize {
        self.inner.channel_count()
    }

    fn commit(&mut self) -> Result<()> {
        if !self.frame.is_empty() {
            // fold_sign(0) == 0: the partial frame's minimum.
            self.inner.write(T::Word::ZERO)?;
            self.inner.write_batch(&self.frame)?;
            self.open_tail = FRAME_LEN - self.frame.len();
            self.frame.clear();
        }
        self.inner.commit()
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()?;
        self.prev = T::Word::ZERO;
        self.frame.clear();
        self.open_tail = 0;
        Ok(())
    }
}

impl<T: BitCast, C: Channel> ColumnCodec<C> for DeltaDeltaWriter<T, C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::with_inner(
            Encoder::<T, C>::open(channels, config)?,
            T::Word::ZERO,
            0,
        ))
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        match resume::select_strategy(&channels, true) {
            ResumeStrategy::Append => {
                let mut channel = single(channels)?;
                let (seen, last) = {
                    let source = channel.open_reader()?;
                    let mut reader = DeltaDeltaReader::<T, _>::open(vec![source], config)?;
                    resume::last_value(&mut reader, prior_rows, config.replay_chunk)?
                };
                let open_tail = (FRAME_LEN - (seen % FRAME_LEN as u64) as usize) % FRAME_LEN;
                debug!(
                    "Appending to delta-delta stream after {} prior values ({} owed to the open frame)",
                    seen, open_tail
                );
                let inner = Encoder::<T, C>::open(vec![channel], config)?;
                Ok(Self::with_inner(
                    inner,
                    last.map_or(T::Word::ZERO, T::to_word),
                    open_tail,
                ))
            }
            ResumeStrategy::Replay => resume::replay::<T, DeltaDeltaReader<T, BoxedSource>, Self, C>(
                channels, prior_rows, config,
            ),
        }
    }

    fn into_channels(self) -> Result<Vec<C>> {
        self.inner.into_channels()
    }
}

/// Delta-delta reader.
pub struct DeltaDeltaReader<T: BitCast, R: Read> {
    inner: Decoder<T, R>,
    prev: T::Word,
    min: T::Word,
    /// Values left in the current frame.
    remaining: usize,
    words: Vec<T::Word>,
}

impl<T: BitCast, R: Read> ValueReader<T> for DeltaDeltaReader<T, R> {
    fn read(&mut self, out: &mut [T]) -> Result<usize> {
        let mut n = 0;
        while n < out.len() {
            if self.remaining == 0 {
                let mut min = [T::Word::ZERO];
                if self.inner.read(&mut min)? == 0 {
                    break;
                }
                self.min = min[0].unfold_sign();
                self.remaining = FRAME_LEN;
            }

            let want = self.remaining.min(out.len() - n);
            self.words.resize(want, T::Word::ZERO);
            let got = self.inner.read(&mut self.words[..want])?;
            for (slot, &stored) in out[n..n + got].iter_mut().zip(&self.words[..got]) {
                self.prev = self.prev.wrapping_add(stored.wrapping_add(self.min));
                *slot = T::from_word(self.prev);
            }
            self.remaining -= got;
            n += got;
            if got < want {
                break;
            }
        }
        Ok(n)
    }
}

impl<T: BitCast, R: Read> ColumnDecoder<R> for DeltaDeltaReader<T, R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self {
            inner: Decoder::<T, R>::open(sources, config)?,
            prev: T::Word::ZERO,
            min: T::Word::ZERO,
            remaining: 0,
            words: Vec::new(),
        })
    }
}

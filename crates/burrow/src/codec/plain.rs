//! Fixed-width little-endian values with no transform.

use crate::channel::{BoxedSource, Channel};
use crate::codec::io::{ByteSink, ByteSource};
use crate::codec::{single, Codec, ColumnCodec, ColumnDecoder, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::resume::{self, ResumeStrategy};
use crate::value::{Duration, Timestamp};
use std::io::Read;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// A value with a fixed-size little-endian byte form.
pub trait FixedBytes: Copy + Default + Send + 'static {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Writes the value into `out[..SIZE]`.
    fn write_le(self, out: &mut [u8]);

    /// Reads a value from `bytes[..SIZE]`.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_bytes {
    ($($ty:ty),*) => {$(
        impl FixedBytes for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn write_le(self, out: &mut [u8]) {
                out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }
        }
    )*};
}

impl_fixed_bytes!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, i128);

impl FixedBytes for Timestamp {
    const SIZE: usize = 8;

    #[inline]
    fn write_le(self, out: &mut [u8]) {
        self.0.write_le(out)
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        Self(i64::read_le(bytes))
    }
}

impl FixedBytes for Duration {
    const SIZE: usize = 8;

    #[inline]
    fn write_le(self, out: &mut [u8]) {
        self.0.write_le(out)
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        Self(i64::read_le(bytes))
    }
}

/// Writer storing each value as its fixed-width little-endian bytes.
pub struct PlainWriter<T: FixedBytes, C: Channel> {
    sink: ByteSink<C>,
    scratch: Vec<u8>,
    _value: PhantomData<T>,
}

impl<T: FixedBytes, C: Channel> PlainWriter<T, C> {
    /// Creates a writer bound to `channel`.
    pub fn new(channel: C, config: &CodecConfig) -> Self {
        Self {
            sink: ByteSink::new(channel, config.buffer_capacity),
            scratch: Vec::new(),
            _value: PhantomData,
        }
    }

    /// Flushes buffered bytes and returns the channel.
    pub fn into_channel(self) -> Result<C> {
        self.sink.into_inner()
    }
}

impl<T: FixedBytes, C: Channel> ValueWriter<T> for PlainWriter<T, C> {
    #[inline]
    fn write(&mut self, value: T) -> Result<()> {
        let mut buf = [0u8; 16];
        value.write_le(&mut buf);
        self.sink.put_slice(&buf[..T::SIZE])
    }

    fn write_batch(&mut self, values: &[T]) -> Result<()> {
        self.scratch.resize(values.len() * T::SIZE, 0);
        for (value, out) in values.iter().zip(self.scratch.chunks_exact_mut(T::SIZE)) {
            value.write_le(out);
        }
        self.sink.put_slice(&self.scratch)
    }
}

impl<T: FixedBytes, C: Channel> Codec for PlainWriter<T, C> {
    fn channel_count(&self) -> usize {
        1
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn reset(&mut self) -> Result<()> {
        if self.sink.emitted() > 0 {
            return Err(CodecError::InvalidState("reset after data was emitted"));
        }
        Ok(())
    }
}

impl<T: FixedBytes, C: Channel> ColumnCodec<C> for PlainWriter<T, C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(single(channels)?, config))
    }

    fn resume(channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        match resume::select_strategy(&channels, true) {
            ResumeStrategy::Append => {
                debug!("Appending to plain stream after {} prior values", prior_rows);
                Self::open(channels, config)
            }
            ResumeStrategy::Replay => {
                resume::replay::<T, PlainReader<T, BoxedSource>, Self, C>(channels, prior_rows, config)
            }
        }
    }

    fn into_channels(self) -> Result<Vec<C>> {
        Ok(vec![self.into_channel()?])
    }
}

/// Reader for [`PlainWriter`] output.
pub struct PlainReader<T: FixedBytes, R: Read> {
    source: ByteSource<R>,
    scratch: Vec<u8>,
    exhausted: bool,
    _value: PhantomData<T>,
}

impl<T: FixedBytes, R: Read> PlainReader<T, R> {
    /// Creates a reader over `source`.
    pub fn new(source: R, config: &CodecConfig) -> Self {
        Self {
            source: ByteSource::new(source, config.buffer_capacity),
            scratch: Vec::new(),
            exhausted: false,
            _value: PhantomData,
        }
    }
}

impl<T: FixedBytes, R: Read> ValueReader<T> for PlainReader<T, R> {
    fn read(&mut self, out: &mut [T]) -> Result<usize> {
        if self.exhausted || out.is_empty() {
            return Ok(0);
        }
        self.scratch.resize(out.len() * T::SIZE, 0);
        let filled = self.source.read_some(&mut self.scratch)?;
        let n = filled / T::SIZE;
        if filled < self.scratch.len() {
            self.exhausted = true;
            if filled % T::SIZE != 0 {
                warn!(
                    "Plain stream ends {} bytes into a {}-byte value; treating as end of data",
                    filled % T::SIZE,
                    T::SIZE
                );
            }
        }
        for (slot, bytes) in out.iter_mut().zip(self.scratch[..n * T::SIZE].chunks_exact(T::SIZE)) {
            *slot = T::read_le(bytes);
        }
        Ok(n)
    }
}

impl<T: FixedBytes, R: Read> ColumnDecoder<R> for PlainReader<T, R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(single(sources)?, config))
    }
}

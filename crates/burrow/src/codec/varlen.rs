//! Variable-length values (UTF-8 strings and opaque byte strings).
//!
//! Each value is an unsigned LEB128 prefix holding `len + 1` followed by
//! `len` raw payload bytes. Prefix 0 marks a null, prefix 1 an empty value.
//!
//! With [`VarLenLayout::Split`] the prefixes go to channel 0 and the payload
//! bytes to channel 1; otherwise both are interleaved on one channel.

use crate::channel::Channel;
use crate::codec::io::{ByteSink, ByteSource};
use crate::codec::{expect_channels, Codec, ColumnCodec, ColumnDecoder, ValueReader, ValueWriter};
use crate::config::{CodecConfig, VarLenLayout};
use crate::error::{CodecError, Result};
use crate::resume;
use std::io::Read;
use tracing::{debug, warn};

/// Longest LEB128 encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

fn encode_varint(mut value: u64, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut n = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out[n] = byte;
            return n + 1;
        }
        out[n] = byte | 0x80;
        n += 1;
    }
}

/// Writer for length-prefixed values.
pub struct VarLenWriter<C: Channel> {
    /// One sink (inline) or two (prefixes, payloads).
    sinks: Vec<ByteSink<C>>,
}

impl<C: Channel> VarLenWriter<C> {
    fn put_value(&mut self, value: Option<&[u8]>) -> Result<()> {
        let prefix = value.map_or(0, |bytes| bytes.len() as u64 + 1);
        let mut buf = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(prefix, &mut buf);
        self.sinks[0].put_slice(&buf[..n])?;
        if let Some(bytes) = value {
            let payload = self.sinks.len() - 1;
            self.sinks[payload].put_slice(bytes)?;
        }
        Ok(())
    }

    fn emitted(&self) -> u64 {
        self.sinks.iter().map(ByteSink::emitted).sum()
    }
}

impl<'a, C: Channel> ValueWriter<Option<&'a [u8]>> for VarLenWriter<C> {
    #[inline]
    fn write(&mut self, value: Option<&'a [u8]>) -> Result<()> {
        self.put_value(value)
    }
}

impl<'a, C: Channel> ValueWriter<Option<&'a str>> for VarLenWriter<C> {
    #[inline]
    fn write(&mut self, value: Option<&'a str>) -> Result<()> {
        self.put_value(value.map(str::as_bytes))
    }
}

impl<C: Channel> Codec for VarLenWriter<C> {
    fn channel_count(&self) -> usize {
        self.sinks.len()
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        if self.emitted() > 0 {
            return Err(CodecError::InvalidState("reset after data was emitted"));
        }
        Ok(())
    }
}

impl<C: Channel> ColumnCodec<C> for VarLenWriter<C> {
    fn open(channels: Vec<C>, config: &CodecConfig) -> Result<Self> {
        expect_channels(&channels, config.varlen_layout.channel_count())?;
        let sinks = channels
            .into_iter()
            .map(|channel| ByteSink::new(channel, config.buffer_capacity))
            .collect();
        Ok(Self { sinks })
    }

    /// Always replays: the prefix and payload channels of a split layout
    /// must be rebuilt together.
    fn resume(mut channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<Self> {
        let sources = resume::take_sources(&mut channels)?;
        let mut reader = VarLenReader::open(sources, config)?;
        let mut writer = Self::open(channels, config)?;

        let mut buf: Vec<Option<Vec<u8>>> = vec![None; config.replay_chunk.max(1)];
        let mut copied = 0u64;
        while copied < prior_rows {
            let want = (prior_rows - copied).min(buf.len() as u64) as usize;
            let n = ValueReader::<Option<Vec<u8>>>::read(&mut reader, &mut buf[..want])?;
            for value in &buf[..n] {
                writer.put_value(value.as_deref())?;
            }
            copied += n as u64;
            if n < want {
                break;
            }
        }
        resume::check_prior_rows(prior_rows, copied);
        debug!("Replayed {} prior variable-length values", copied);
        Ok(writer)
    }

    fn into_channels(self) -> Result<Vec<C>> {
        self.sinks.into_iter().map(ByteSink::into_inner).collect()
    }
}

/// Reader for length-prefixed values.
pub struct VarLenReader<R: Read> {
    prefixes: ByteSource<R>,
    /// Payload source of a split layout.
    payloads: Option<ByteSource<R>>,
    exhausted: bool,
}

impl<R: Read> VarLenReader<R> {
    fn read_prefix(&mut self) -> Result<Option<u64>> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let Some(byte) = self.prefixes.read_byte()? else {
                if i > 0 {
                    warn!("Variable-length stream ends inside a length prefix");
                }
                return Ok(None);
            };
            let bits = u64::from(byte & 0x7F);
            if i == MAX_VARINT_LEN - 1 && bits > 1 {
                break;
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(Some(value));
            }
        }
        warn!("Malformed variable-length prefix overflows 64 bits");
        Ok(None)
    }

    /// Decodes one value, or `None` once the stream is exhausted.
    fn next_value(&mut self) -> Result<Option<Option<Vec<u8>>>> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(prefix) = self.read_prefix()? else {
            self.exhausted = true;
            return Ok(None);
        };
        if prefix == 0 {
            return Ok(Some(None));
        }

        let len = prefix - 1;
        let source = self.payloads.as_mut().unwrap_or(&mut self.prefixes);
        let Some(payload) = source.read_vec(len)? else {
            warn!("Variable-length stream ends inside a {}-byte payload", len);
            self.exhausted = true;
            return Ok(None);
        };
        Ok(Some(Some(payload)))
    }
}

impl<R: Read> ValueReader<Option<Vec<u8>>> for VarLenReader<R> {
    fn read(&mut self, out: &mut [Option<Vec<u8>>]) -> Result<usize> {
        let mut n = 0;
        while n < out.len() {
            match self.next_value()? {
                Some(value) => {
                    out[n] = value;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl<R: Read> ValueReader<Option<String>> for VarLenReader<R> {
    fn read(&mut self, out: &mut [Option<String>]) -> Result<usize> {
        let mut n = 0;
        while n < out.len() {
            let value = match self.next_value()? {
                Some(Some(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => Some(text),
                    Err(err) => {
                        warn!("Invalid UTF-8 in string value: {}", err);
                        self.exhausted = true;
                        break;
                    }
                },
                Some(None) => None,
                None => break,
            };
            out[n] = value;
            n += 1;
        }
        Ok(n)
    }
}

impl<R: Read> ColumnDecoder<R> for VarLenReader<R> {
    fn open(sources: Vec<R>, config: &CodecConfig) -> Result<Self> {
        expect_channels(&sources, config.varlen_layout.channel_count())?;
        let mut sources = sources
            .into_iter()
            .map(|source| ByteSource::new(source, config.buffer_capacity));
        let (Some(prefixes), payloads) = (sources.next(), sources.next()) else {
            return Err(CodecError::ChannelCount {
                expected: config.varlen_layout.channel_count(),
                actual: 0,
            });
        };
        debug_assert_eq!(payloads.is_some(), config.varlen_layout == VarLenLayout::Split);
        Ok(Self {
            prefixes,
            payloads,
            exhausted: false,
        })
    }
}

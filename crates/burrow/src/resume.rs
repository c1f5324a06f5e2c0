//! Writer resumption over channels that already hold committed values.
//!
//! Two strategies exist:
//!
//! - **Append**: the codec's carried state is a handful of scalars (previous
//!   value, frame position). The prior values are decoded once through the
//!   paired reader to recover that state, and new bytes are appended after
//!   the committed ones. Decodes identically to an uninterrupted session.
//! - **Replay**: the committed content is taken out of every channel, decoded
//!   with a fresh reader and re-encoded with a fresh writer into the emptied
//!   channels. Costs O(prior size), but produces exactly the bytes an
//!   uninterrupted session would have.
//!
//! Append needs every channel to extend its committed bytes in place; any
//! channel that cannot (compression) forces a replay.

use crate::channel::{BoxedSource, Channel};
use crate::codec::{ColumnCodec, ColumnDecoder, ValueReader, ValueWriter};
use crate::config::CodecConfig;
use crate::error::Result;
use tracing::{debug, warn};

/// How a writer rebuilds its state over committed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStrategy {
    /// Recover scalar state and append after the committed bytes.
    Append,
    /// Decode everything and re-encode it into emptied channels.
    Replay,
}

/// Picks [`ResumeStrategy::Append`] when the codec's state is scalar and
/// every channel supports in-place append.
pub fn select_strategy<C: Channel>(channels: &[C], scalar_state: bool) -> ResumeStrategy {
    if scalar_state && channels.iter().all(|channel| channel.supports_append()) {
        ResumeStrategy::Append
    } else {
        ResumeStrategy::Replay
    }
}

/// Removes the committed content from every channel.
pub fn take_sources<C: Channel>(channels: &mut [C]) -> Result<Vec<BoxedSource>> {
    let mut sources = Vec::with_capacity(channels.len());
    for channel in channels.iter_mut() {
        sources.push(channel.take_contents()?);
    }
    Ok(sources)
}

/// Moves up to `rows` values from `reader` to `writer` in chunks of `chunk`
/// values, returning how many were moved.
pub fn copy_values<T, R, W>(reader: &mut R, writer: &mut W, rows: u64, chunk: usize) -> Result<u64>
where
    T: Copy + Default,
    R: ValueReader<T> + ?Sized,
    W: ValueWriter<T> + ?Sized,
{
    let mut buf = vec![T::default(); chunk.max(1)];
    let mut copied = 0u64;
    while copied < rows {
        let want = (rows - copied).min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf[..want])?;
        writer.write_batch(&buf[..n])?;
        copied += n as u64;
        if n < want {
            break;
        }
    }
    Ok(copied)
}

/// Decodes up to `rows` values and returns how many were seen and the last
/// one.
pub fn last_value<T, R>(reader: &mut R, rows: u64, chunk: usize) -> Result<(u64, Option<T>)>
where
    T: Copy + Default,
    R: ValueReader<T> + ?Sized,
{
    let mut buf = vec![T::default(); chunk.max(1)];
    let mut seen = 0u64;
    let mut last = None;
    while seen < rows {
        let want = (rows - seen).min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf[..want])?;
        if n > 0 {
            last = Some(buf[n - 1]);
        }
        seen += n as u64;
        if n < want {
            break;
        }
    }
    check_prior_rows(rows, seen);
    Ok((seen, last))
}

/// Logs a warning when fewer prior values were decoded than the caller
/// claimed. Resumption continues from what was decoded.
pub fn check_prior_rows(claimed: u64, decoded: u64) {
    if decoded < claimed {
        warn!(
            "Resume expected {} prior values but decoded only {}; continuing from the decoded prefix",
            claimed, decoded
        );
    }
}

/// Full-rebuild resume: drains the channels, decodes `prior_rows` values
/// with `D` and re-encodes them through a fresh `W` bound to the same
/// (now empty) channels.
pub fn replay<T, D, W, C>(mut channels: Vec<C>, prior_rows: u64, config: &CodecConfig) -> Result<W>
where
    T: Copy + Default,
    C: Channel,
    D: ColumnDecoder<BoxedSource> + ValueReader<T>,
    W: ColumnCodec<C> + ValueWriter<T>,
{
    let sources = take_sources(&mut channels)?;
    let mut reader = D::open(sources, config)?;
    let mut writer = W::open(channels, config)?;
    let copied = copy_values(&mut reader, &mut writer, prior_rows, config.replay_chunk)?;
    check_prior_rows(prior_rows, copied);
    debug!("Replayed {} prior values into fresh writer", copied);
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{CompressedChannel, MemoryChannel};
    use crate::codec::{AdaptiveReader, AdaptiveWriter, Codec, Format32};

    #[test]
    fn test_strategy_selection() {
        let plain = vec![MemoryChannel::new(), MemoryChannel::new()];
        assert_eq!(select_strategy(&plain, true), ResumeStrategy::Append);
        assert_eq!(select_strategy(&plain, false), ResumeStrategy::Replay);

        let compressed = vec![CompressedChannel::new(MemoryChannel::new())];
        assert_eq!(select_strategy(&compressed, true), ResumeStrategy::Replay);
    }

    #[test]
    fn test_last_value_stops_at_claimed_rows() {
        let config = CodecConfig::default().with_replay_chunk(3);
        let mut writer = AdaptiveWriter::<Format32, _>::new(MemoryChannel::new(), &config);
        writer.write_batch(&[4, 5, 6, 7, 8, 9, 10]).unwrap();
        writer.commit().unwrap();
        let bytes = writer.into_channel().unwrap().into_bytes();

        let mut reader = AdaptiveReader::<Format32, _>::new(bytes.as_slice(), &config);
        assert_eq!(last_value(&mut reader, 5, 3).unwrap(), (5, Some(8)));

        let mut reader = AdaptiveReader::<Format32, _>::new(bytes.as_slice(), &config);
        assert_eq!(last_value(&mut reader, 100, 3).unwrap(), (7, Some(10)));

        let mut reader = AdaptiveReader::<Format32, _>::new(bytes.as_slice(), &config);
        assert_eq!(last_value::<u32, _>(&mut reader, 0, 3).unwrap(), (0, None));
    }

    #[test]
    fn test_replay_rebuilds_identical_bytes() {
        let config = CodecConfig::default().with_replay_chunk(2);
        let values = [0u32, 0, 9, 1 << 24, 0, 3, 3];

        let mut whole = AdaptiveWriter::<Format32, _>::new(MemoryChannel::new(), &config);
        whole.write_batch(&values).unwrap();
        whole.commit().unwrap();
        let expected = whole.into_channel().unwrap().into_bytes();

        let mut first = AdaptiveWriter::<Format32, _>::new(MemoryChannel::new(), &config);
        first.write_batch(&values[..4]).unwrap();
        first.commit().unwrap();
        let channel = first.into_channel().unwrap();

        let mut resumed: AdaptiveWriter<Format32, MemoryChannel> =
            replay::<u32, AdaptiveReader<Format32, BoxedSource>, _, _>(vec![channel], 4, &config)
                .unwrap();
        resumed.write_batch(&values[4..]).unwrap();
        resumed.commit().unwrap();
        assert_eq!(resumed.into_channel().unwrap().into_bytes(), expected);
    }
}

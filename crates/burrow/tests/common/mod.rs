//! Shared helpers for the codec integration tests.

#![allow(dead_code)]

use alopex_burrow::registry::{self, DynColumnWriter};
use alopex_burrow::{
    BoxedChannel, BoxedSource, Channel, CodecConfig, ColumnData, ColumnSpec, ColumnValues, Duration,
    Result, Timestamp, ValueKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Read;
use std::ops::Range;

/// Shape of a generated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every value is the kind's zero.
    Zeros,
    /// Every value is the kind's largest value.
    Max,
    /// Values increase with the row index.
    Monotonic,
    /// Random values, about a third of them repeats from a small pool.
    Random,
}

impl Pattern {
    pub const ALL: [Pattern; 4] = [Self::Zeros, Self::Max, Self::Monotonic, Self::Random];
}

fn random_text(rng: &mut StdRng) -> Option<String> {
    if rng.gen_bool(0.1) {
        return None;
    }
    let len = rng.gen_range(0..40);
    Some((0..len).map(|_| rng.gen_range('a'..='z')).collect())
}

fn random_blob(rng: &mut StdRng) -> Option<Vec<u8>> {
    if rng.gen_bool(0.1) {
        return None;
    }
    let len = rng.gen_range(0..200);
    Some((0..len).map(|_| rng.gen()).collect())
}

/// Generates `len` values of `kind` following `pattern`.
pub fn sample(kind: ValueKind, pattern: Pattern, len: usize, seed: u64) -> ColumnData {
    let mut rng = StdRng::seed_from_u64(seed);

    macro_rules! generate {
        ($variant:ident, $zero:expr, $max:expr, |$i:ident| $mono:expr, |$r:ident| $random:expr) => {{
            let pool: Vec<_> = (0..8)
                .map(|_| {
                    let $r = &mut rng;
                    $random
                })
                .collect();
            let values = (0..len)
                .map(|$i| match pattern {
                    Pattern::Zeros => $zero,
                    Pattern::Max => $max,
                    Pattern::Monotonic => $mono,
                    Pattern::Random => {
                        if rng.gen_bool(0.3) {
                            pool[rng.gen_range(0..pool.len())].clone()
                        } else {
                            let $r = &mut rng;
                            $random
                        }
                    }
                })
                .collect();
            ColumnData::$variant(values)
        }};
    }

    match kind {
        ValueKind::Bool => generate!(Bool, false, true, |i| i % 3 == 0, |r| r.gen::<bool>()),
        ValueKind::UInt1 => generate!(UInt1, 0, 1, |i| (i % 2) as u8, |r| r.gen_range(0..2u8)),
        ValueKind::UInt2 => generate!(UInt2, 0, 3, |i| (i % 4) as u8, |r| r.gen_range(0..4u8)),
        ValueKind::UInt4 => generate!(UInt4, 0, 15, |i| (i % 16) as u8, |r| r.gen_range(0..16u8)),
        ValueKind::UInt8 => generate!(UInt8, 0, u8::MAX, |i| i as u8, |r| r.gen::<u8>()),
        ValueKind::UInt16 => generate!(UInt16, 0, u16::MAX, |i| i as u16, |r| r.gen::<u16>()),
        ValueKind::UInt32 => generate!(UInt32, 0, u32::MAX, |i| 7 * i as u32, |r| r.gen::<u32>()),
        ValueKind::UInt64 => generate!(UInt64, 0, u64::MAX, |i| 1_000 * i as u64, |r| r.gen::<u64>()),
        ValueKind::Int8 => generate!(Int8, 0, i8::MAX, |i| (i as i16 - 128) as i8, |r| r.gen::<i8>()),
        ValueKind::Int16 => generate!(Int16, 0, i16::MAX, |i| i as i16 - 100, |r| r.gen::<i16>()),
        ValueKind::Int32 => generate!(Int32, 0, i32::MAX, |i| i as i32 * 3 - 500, |r| r.gen::<i32>()),
        ValueKind::Int64 => generate!(Int64, 0, i64::MAX, |i| i as i64 * 1_000_003 - 1_000_000, |r| r.gen::<i64>()),
        ValueKind::Float32 => generate!(Float32, 0.0, f32::MAX, |i| i as f32 * 0.25, |r| r.gen_range(-1.0e6f32..1.0e6)),
        ValueKind::Float64 => generate!(Float64, 0.0, f64::MAX, |i| i as f64 * 0.125, |r| r.gen_range(-1.0e9f64..1.0e9)),
        ValueKind::Decimal128 => generate!(Decimal128, 0, i128::MAX, |i| i as i128 * 10_000, |r| r.gen::<i128>()),
        ValueKind::Timestamp => generate!(
            Timestamp,
            Timestamp(0),
            Timestamp(i64::MAX),
            |i| Timestamp(1_700_000_000_000_000_000 + i as i64 * 1_000_000_000),
            |r| Timestamp(r.gen_range(0..i64::MAX))
        ),
        ValueKind::Duration => generate!(
            Duration,
            Duration(0),
            Duration(i64::MAX),
            |i| Duration(i as i64 * 250 - 10_000),
            |r| Duration(r.gen::<i64>())
        ),
        ValueKind::Utf8 => generate!(
            Utf8,
            Some(String::new()),
            Some("z".repeat(300)),
            |i| Some(format!("host-{i:05}")),
            |r| random_text(r)
        ),
        ValueKind::Bytes => generate!(
            Bytes,
            Some(Vec::new()),
            Some(vec![u8::MAX; 300]),
            |i| Some((i as u32).to_le_bytes().to_vec()),
            |r| random_blob(r)
        ),
    }
}

/// Writes `data[range]` through a dynamic writer in one batch.
pub fn write_range(writer: &mut dyn DynColumnWriter, data: &ColumnData, range: Range<usize>) -> Result<()> {
    macro_rules! dispatch {
        ($($variant:ident),*) => {
            match data {
                $(ColumnData::$variant(values) => writer.write(ColumnValues::$variant(&values[range])),)*
                ColumnData::Utf8(values) => {
                    let refs: Vec<Option<&str>> = values[range].iter().map(|v| v.as_deref()).collect();
                    writer.write(ColumnValues::Utf8(&refs))
                }
                ColumnData::Bytes(values) => {
                    let refs: Vec<Option<&[u8]>> = values[range].iter().map(|v| v.as_deref()).collect();
                    writer.write(ColumnValues::Bytes(&refs))
                }
            }
        };
    }

    dispatch!(
        Bool, UInt1, UInt2, UInt4, UInt8, UInt16, UInt32, UInt64, Int8, Int16, Int32, Int64,
        Float32, Float64, Decimal128, Timestamp, Duration
    )
}

/// Writes all of `data` in batches of `batch` values.
pub fn write_batched(writer: &mut dyn DynColumnWriter, data: &ColumnData, batch: usize) -> Result<()> {
    let batch = batch.max(1);
    let mut start = 0;
    while start < data.len() {
        let end = (start + batch).min(data.len());
        write_range(writer, data, start..end)?;
        start = end;
    }
    Ok(())
}

/// Boxed in-memory channels.
pub fn memory_channels(n: usize) -> Vec<BoxedChannel> {
    (0..n)
        .map(|_| Box::new(alopex_burrow::MemoryChannel::new()) as BoxedChannel)
        .collect()
}

/// Takes the committed content of every channel as a reader source.
pub fn take_sources(channels: &mut [BoxedChannel]) -> Vec<BoxedSource> {
    channels
        .iter_mut()
        .map(|channel| channel.take_contents().unwrap())
        .collect()
}

/// Committed logical bytes of every channel.
pub fn channel_bytes(channels: &mut [BoxedChannel]) -> Vec<Vec<u8>> {
    channels
        .iter_mut()
        .map(|channel| {
            let mut bytes = Vec::new();
            channel.open_reader().unwrap().read_to_end(&mut bytes).unwrap();
            bytes
        })
        .collect()
}

/// Decodes up to `rows` committed values, reading `chunk` values at a time.
///
/// Row counts live outside the streams, so the caller bounds the read the
/// way the page layer does.
pub fn read_rows(
    spec: ColumnSpec,
    sources: Vec<BoxedSource>,
    config: &CodecConfig,
    rows: usize,
    chunk: usize,
) -> ColumnData {
    let mut reader = registry::open_reader(spec, sources, config).unwrap();
    let mut out = ColumnData::new(spec.kind);
    let chunk = chunk.max(1);
    while out.len() < rows {
        let wanted = chunk.min(rows - out.len());
        if reader.read(&mut out, wanted).unwrap() < wanted {
            break;
        }
    }
    out
}

/// Encodes `data` in one uninterrupted session and returns the channel bytes.
pub fn encode_uninterrupted(spec: ColumnSpec, data: &ColumnData, config: &CodecConfig) -> Vec<Vec<u8>> {
    let count = registry::channel_count(spec, config).unwrap();
    let mut writer = registry::open_writer(spec, memory_channels(count), config).unwrap();
    write_range(writer.as_mut(), data, 0..data.len()).unwrap();
    writer.commit().unwrap();
    let mut channels = writer.into_channels().unwrap();
    channel_bytes(&mut channels)
}

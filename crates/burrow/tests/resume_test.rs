//! Integration tests for reopening writers over partially written columns.
//!
//! These tests verify, for every registered codec and channel kind:
//! - a resumed writer continues the same logical sequence
//! - replay over a compressed channel reproduces the uninterrupted bytes
//! - appending over a file survives closing and reopening the file
//! - over-claimed prior row counts resume from what was actually decoded

mod common;

use alopex_burrow::registry::{self, ColumnSpec, DynColumnWriter, Encoding, ValueKind};
use alopex_burrow::{
    BoxedChannel, Channel, CodecConfig, ColumnData, ColumnValues, CompressedChannel, FileChannel,
    MemoryChannel, Timestamp, VarLenLayout,
};
use common::{
    channel_bytes, encode_uninterrupted, read_rows, sample, take_sources, write_range, Pattern,
};
use std::path::Path;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
enum Backing {
    Memory,
    File,
    Compressed,
    CompressedFile,
}

impl Backing {
    const ALL: [Backing; 4] = [Self::Memory, Self::File, Self::Compressed, Self::CompressedFile];

    fn channels(self, dir: &Path, name: &str, count: usize) -> Vec<BoxedChannel> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("{name}.{i}.chan"));
                let channel: BoxedChannel = match self {
                    Self::Memory => Box::new(MemoryChannel::new()),
                    Self::File => Box::new(FileChannel::open(&path).unwrap()),
                    Self::Compressed => Box::new(CompressedChannel::new(MemoryChannel::new())),
                    Self::CompressedFile => {
                        Box::new(CompressedChannel::new(FileChannel::open(&path).unwrap()))
                    }
                };
                channel
            })
            .collect()
    }
}

/// Writes `data[..split]`, commits, resumes over the same channels and writes
/// the rest. Returns the channels after the final commit.
fn write_with_resume(
    spec: ColumnSpec,
    data: &ColumnData,
    split: usize,
    channels: Vec<BoxedChannel>,
    config: &CodecConfig,
) -> Vec<BoxedChannel> {
    let mut writer = registry::open_writer(spec, channels, config).unwrap();
    write_range(writer.as_mut(), data, 0..split).unwrap();
    writer.commit().unwrap();
    let channels = writer.into_channels().unwrap();

    let mut resumed = registry::resume_writer(spec, channels, split as u64, config).unwrap();
    write_range(resumed.as_mut(), data, split..data.len()).unwrap();
    resumed.commit().unwrap();
    resumed.into_channels().unwrap()
}

fn check_resume(spec: ColumnSpec, backing: Backing, split: usize, config: &CodecConfig) {
    let temp_dir = TempDir::new().unwrap();
    let data = sample(spec.kind, Pattern::Random, 257, 0xB0_77_0E);
    let count = registry::channel_count(spec, config).unwrap();
    let channels = backing.channels(temp_dir.path(), "column", count);

    let mut channels = write_with_resume(spec, &data, split, channels, config);
    if matches!(backing, Backing::Compressed | Backing::CompressedFile) {
        // Replay re-encodes the prior values, so the stream matches an
        // uninterrupted session byte for byte.
        assert_eq!(
            channel_bytes(&mut channels),
            encode_uninterrupted(spec, &data, config),
            "{spec} over {backing:?} split at {split}"
        );
    }
    let decoded = read_rows(spec, take_sources(&mut channels), config, data.len(), 100);
    assert_eq!(decoded, data, "{spec} over {backing:?} split at {split}");
}

#[test]
fn test_resume_derived_encoders_over_all_channels() {
    let config = CodecConfig::default().with_replay_chunk(50);
    let kinds = [
        ValueKind::UInt32,
        ValueKind::Int64,
        ValueKind::Timestamp,
        ValueKind::Duration,
    ];
    let encodings = [Encoding::Delta, Encoding::DeltaDelta, Encoding::Xor, Encoding::Dfcm];
    for kind in kinds {
        for encoding in encodings {
            let spec = ColumnSpec::new(kind, encoding);
            for backing in Backing::ALL {
                for split in [0, 1, 15, 16, 17, 100, 257] {
                    check_resume(spec, backing, split, &config);
                }
            }
        }
    }
}

#[test]
fn test_resume_every_codec() {
    let config = CodecConfig::default();
    for layout in [VarLenLayout::Inline, VarLenLayout::Split] {
        let config = config.clone().with_varlen_layout(layout);
        for entry in registry::entries() {
            for backing in Backing::ALL {
                for split in [3, 64, 129] {
                    check_resume(entry.spec, backing, split, &config);
                }
            }
        }
    }
}

#[test]
fn test_repeated_resumes_extend_one_sequence() {
    let config = CodecConfig::default();
    let spec = ColumnSpec::new(ValueKind::Timestamp, Encoding::DeltaDelta);
    let data = sample(spec.kind, Pattern::Monotonic, 200, 1);
    let mut channels: Vec<BoxedChannel> = vec![Box::new(MemoryChannel::new())];

    let mut written = 0;
    for step in [7, 16, 33, 1, 80, 63] {
        let mut writer: Box<dyn DynColumnWriter> = if written == 0 {
            registry::open_writer(spec, channels, &config).unwrap()
        } else {
            registry::resume_writer(spec, channels, written as u64, &config).unwrap()
        };
        write_range(writer.as_mut(), &data, written..written + step).unwrap();
        writer.commit().unwrap();
        channels = writer.into_channels().unwrap();
        written += step;
    }
    assert_eq!(written, data.len());

    let decoded = read_rows(spec, take_sources(&mut channels), &config, data.len(), 64);
    assert_eq!(decoded, data);
}

#[test]
fn test_file_append_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ts.chan");
    let config = CodecConfig::default();
    let spec = ColumnSpec::new(ValueKind::Int64, Encoding::Delta);
    let first: Vec<i64> = (0..100).map(|i| i * i - 50).collect();
    let second: Vec<i64> = (0..50).map(|i| -i * 3).collect();

    {
        let channel: BoxedChannel = Box::new(FileChannel::open(&path).unwrap());
        let mut writer = registry::open_writer(spec, vec![channel], &config).unwrap();
        writer.write(ColumnValues::Int64(&first)).unwrap();
        writer.commit().unwrap();
        for mut channel in writer.into_channels().unwrap() {
            channel.finish().unwrap();
        }
    }
    let committed = std::fs::metadata(&path).unwrap().len();

    let channel: BoxedChannel = Box::new(FileChannel::open(&path).unwrap());
    let mut writer = registry::resume_writer(spec, vec![channel], 100, &config).unwrap();
    writer.write(ColumnValues::Int64(&second)).unwrap();
    writer.commit().unwrap();
    let mut channels = writer.into_channels().unwrap();
    // Appending leaves the committed prefix in place.
    assert!(std::fs::metadata(&path).unwrap().len() > committed);

    let decoded = read_rows(spec, take_sources(&mut channels), &config, 1000, 1000);
    let expected: Vec<i64> = first.iter().chain(&second).copied().collect();
    assert_eq!(decoded, ColumnData::Int64(expected));
}

#[test]
fn test_overclaimed_prior_rows_resume_from_decoded() {
    let config = CodecConfig::default();
    for encoding in [Encoding::Delta, Encoding::DeltaDelta, Encoding::Xor, Encoding::Dfcm] {
        for compressed in [false, true] {
            let spec = ColumnSpec::new(ValueKind::Timestamp, encoding);
            let channel: BoxedChannel = if compressed {
                Box::new(CompressedChannel::new(MemoryChannel::new()))
            } else {
                Box::new(MemoryChannel::new())
            };
            let first: Vec<Timestamp> = (0..10).map(|i| Timestamp(1_000 + i * 5)).collect();
            let second: Vec<Timestamp> = (10..15).map(|i| Timestamp(1_000 + i * 5)).collect();

            let mut writer = registry::open_writer(spec, vec![channel], &config).unwrap();
            writer.write(ColumnValues::Timestamp(&first)).unwrap();
            writer.commit().unwrap();
            let channels = writer.into_channels().unwrap();

            // Claims twice the committed rows; only ten exist.
            let mut writer = registry::resume_writer(spec, channels, 20, &config).unwrap();
            writer.write(ColumnValues::Timestamp(&second)).unwrap();
            writer.commit().unwrap();
            let mut channels = writer.into_channels().unwrap();

            let decoded = read_rows(spec, take_sources(&mut channels), &config, 100, 100);
            let expected: Vec<Timestamp> = first.iter().chain(&second).copied().collect();
            assert_eq!(decoded, ColumnData::Timestamp(expected), "{spec}");
        }
    }
}

#[test]
fn test_resume_on_empty_channels() {
    let config = CodecConfig::default();
    for entry in registry::entries() {
        let spec = entry.spec;
        let count = registry::channel_count(spec, &config).unwrap();
        let data = sample(spec.kind, Pattern::Random, 40, 9);
        let channels: Vec<BoxedChannel> = (0..count)
            .map(|_| Box::new(MemoryChannel::new()) as BoxedChannel)
            .collect();
        let mut writer = registry::resume_writer(spec, channels, 0, &config).unwrap();
        write_range(writer.as_mut(), &data, 0..data.len()).unwrap();
        writer.commit().unwrap();
        let mut channels = writer.into_channels().unwrap();
        assert_eq!(read_rows(spec, take_sources(&mut channels), &config, data.len(), 8), data, "{spec}");
    }
}

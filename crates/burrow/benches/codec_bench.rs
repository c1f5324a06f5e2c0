//! Benchmarks for Burrow column codecs.
//!
//! Run with: cargo bench --package alopex-burrow
//!
//! ## Benchmark Categories
//!
//! - **Adaptive**: paired-integer encode/decode on sparse and dense words
//! - **Bit Packing**: sub-byte widths, batched vs one value at a time
//! - **Derived Encoders**: Delta, DeltaDelta, XOR and DFCM on typical series
//! - **Resume**: append vs replay over plain and compressed channels

use alopex_burrow::codec::{
    AdaptiveReader, AdaptiveWriter, BitPackReader, BitPackWriter, Codec, ColumnCodec,
    ColumnDecoder, DeltaDeltaReader, DeltaDeltaWriter, DeltaReader, DeltaWriter, DfcmReader,
    DfcmWriter, Format64, ValueReader, ValueWriter, XorReader, XorWriter,
};
use alopex_burrow::{CodecConfig, CompressedChannel, MemoryChannel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate regular timestamps with occasional jitter.
fn generate_timestamps(count: usize) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(7);
    let start_ts = 1_700_000_000_000_000_000_i64;
    let interval = 1_000_000_000_i64; // 1 second in nanos
    (0..count)
        .map(|i| {
            let jitter = if rng.gen_bool(0.05) { rng.gen_range(-1_000..1_000) } else { 0 };
            start_ts + i as i64 * interval + jitter
        })
        .collect()
}

/// Generate a slowly varying metric.
fn generate_values(count: usize) -> Vec<f64> {
    let mut value = 50.0;
    (0..count)
        .map(|i| {
            value += (i as f64 * 0.1).sin() * 0.1;
            value
        })
        .collect()
}

// ============================================================================
// Adaptive Paired Integers
// ============================================================================

fn bench_adaptive(c: &mut Criterion) {
    let config = CodecConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let sparse: Vec<u64> = (0..100_000)
        .map(|_| if rng.gen_bool(0.8) { 0 } else { rng.gen_range(0..1 << 20) })
        .collect();
    let dense: Vec<u64> = (0..100_000).map(|_| rng.gen()).collect();

    let mut group = c.benchmark_group("adaptive_u64");
    for (name, words) in [("sparse", &sparse), ("dense", &dense)] {
        group.throughput(Throughput::Elements(words.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", name), words, |b, words| {
            b.iter(|| {
                let mut writer = AdaptiveWriter::<Format64, _>::new(MemoryChannel::new(), &config);
                writer.write_batch(black_box(words)).unwrap();
                writer.commit().unwrap();
                writer.into_channel().unwrap()
            })
        });

        let mut writer = AdaptiveWriter::<Format64, _>::new(MemoryChannel::new(), &config);
        writer.write_batch(words).unwrap();
        writer.commit().unwrap();
        let bytes = writer.into_channel().unwrap().into_bytes();
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            let mut out = vec![0u64; words.len()];
            b.iter(|| {
                let mut reader = AdaptiveReader::<Format64, _>::new(bytes.as_slice(), &config);
                reader.read(&mut out[..]).unwrap()
            })
        });
    }
    group.finish();
}

// ============================================================================
// Bit Packing
// ============================================================================

fn pack<const W: u32>(values: &[u8], batched: bool, config: &CodecConfig) -> Vec<u8> {
    let mut writer = BitPackWriter::<_, W>::new(MemoryChannel::new(), config);
    if batched {
        writer.write_batch(values).unwrap();
    } else {
        for &value in values {
            writer.write(value).unwrap();
        }
    }
    writer.commit().unwrap();
    writer.into_channel().unwrap().into_bytes()
}

fn unpack<const W: u32>(bytes: &[u8], out: &mut [u8], config: &CodecConfig) -> usize {
    let mut reader = BitPackReader::<_, W>::new(bytes, config);
    reader.read(out).unwrap()
}

fn bench_bitpack(c: &mut Criterion) {
    let config = CodecConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    let values: Vec<u8> = (0..100_000).map(|_| rng.gen_range(0..4)).collect();

    let mut group = c.benchmark_group("bitpack_width2");
    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("encode_batched", |b| {
        b.iter(|| pack::<2>(black_box(&values), true, &config))
    });
    group.bench_function("encode_scalar", |b| {
        b.iter(|| pack::<2>(black_box(&values), false, &config))
    });
    let bytes = pack::<2>(&values, true, &config);
    let mut out = vec![0u8; values.len()];
    group.bench_function("decode", |b| {
        b.iter(|| unpack::<2>(black_box(&bytes), &mut out, &config))
    });
    group.finish();

    let bools: Vec<u8> = (0..100_000).map(|_| rng.gen_range(0..2)).collect();
    let mut group = c.benchmark_group("bitpack_width1");
    group.throughput(Throughput::Elements(bools.len() as u64));
    group.bench_function("encode_batched", |b| {
        b.iter(|| pack::<1>(black_box(&bools), true, &config))
    });
    group.finish();
}

// ============================================================================
// Derived Encoders
// ============================================================================

macro_rules! bench_roundtrip {
    ($group:expr, $name:literal, $writer:ty, $reader:ty, $values:expr, $config:expr, $size:expr) => {{
        let values = $values;
        let config = $config;
        $group.bench_with_input(BenchmarkId::new(concat!($name, "_encode"), $size), values, |b, values| {
            b.iter(|| {
                let mut writer = <$writer>::open(vec![MemoryChannel::new()], config).unwrap();
                writer.write_batch(black_box(values)).unwrap();
                writer.commit().unwrap();
                writer.into_channels().unwrap()
            })
        });

        let mut writer = <$writer>::open(vec![MemoryChannel::new()], config).unwrap();
        writer.write_batch(values).unwrap();
        writer.commit().unwrap();
        let bytes = writer.into_channels().unwrap().remove(0).into_bytes();
        $group.bench_with_input(BenchmarkId::new(concat!($name, "_decode"), $size), &bytes, |b, bytes| {
            let mut out = values.to_vec();
            b.iter(|| {
                let mut reader = <$reader>::open(vec![bytes.as_slice()], config).unwrap();
                reader.read(&mut out[..]).unwrap()
            })
        });
    }};
}

fn bench_derived_timestamps(c: &mut Criterion) {
    let config = CodecConfig::default();
    let mut group = c.benchmark_group("timestamps");

    for size in [1_000, 100_000].iter() {
        let timestamps = generate_timestamps(*size);
        group.throughput(Throughput::Elements(*size as u64));
        bench_roundtrip!(group, "delta", DeltaWriter<i64, MemoryChannel>, DeltaReader<i64, &[u8]>, &timestamps, &config, size);
        bench_roundtrip!(group, "delta_delta", DeltaDeltaWriter<i64, MemoryChannel>, DeltaDeltaReader<i64, &[u8]>, &timestamps, &config, size);
        bench_roundtrip!(group, "dfcm", DfcmWriter<i64, MemoryChannel>, DfcmReader<i64, &[u8]>, &timestamps, &config, size);
    }
    group.finish();
}

fn bench_derived_floats(c: &mut Criterion) {
    let config = CodecConfig::default();
    let mut group = c.benchmark_group("floats");

    for size in [1_000, 100_000].iter() {
        let values = generate_values(*size);
        group.throughput(Throughput::Elements(*size as u64));
        bench_roundtrip!(group, "xor", XorWriter<f64, MemoryChannel>, XorReader<f64, &[u8]>, &values, &config, size);
        bench_roundtrip!(group, "dfcm", DfcmWriter<f64, MemoryChannel>, DfcmReader<f64, &[u8]>, &values, &config, size);
    }
    group.finish();
}

// ============================================================================
// Resume
// ============================================================================

fn bench_resume(c: &mut Criterion) {
    let config = CodecConfig::default();
    let timestamps = generate_timestamps(100_000);
    let mut group = c.benchmark_group("resume_delta_delta");
    group.throughput(Throughput::Elements(timestamps.len() as u64));

    group.bench_function("append_memory", |b| {
        b.iter_batched(
            || {
                let mut writer =
                    DeltaDeltaWriter::<i64, _>::open(vec![MemoryChannel::new()], &config).unwrap();
                writer.write_batch(&timestamps).unwrap();
                writer.commit().unwrap();
                writer.into_channels().unwrap()
            },
            |channels| {
                DeltaDeltaWriter::<i64, _>::resume(channels, timestamps.len() as u64, &config)
                    .unwrap()
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.bench_function("replay_compressed", |b| {
        b.iter_batched(
            || {
                let channel = CompressedChannel::new(MemoryChannel::new());
                let mut writer = DeltaDeltaWriter::<i64, _>::open(vec![channel], &config).unwrap();
                writer.write_batch(&timestamps).unwrap();
                writer.commit().unwrap();
                writer.into_channels().unwrap()
            },
            |channels| {
                DeltaDeltaWriter::<i64, _>::resume(channels, timestamps.len() as u64, &config)
                    .unwrap()
            },
            criterion::BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_compression_ratio(c: &mut Criterion) {
    let config = CodecConfig::default();
    let timestamps = generate_timestamps(10_000);
    let raw_size = timestamps.len() * std::mem::size_of::<i64>();

    c.bench_function("compressed_channel_ratio", |b| {
        b.iter(|| {
            let channel = CompressedChannel::new(MemoryChannel::new());
            let mut writer = DeltaDeltaWriter::<i64, _>::open(vec![channel], &config).unwrap();
            writer.write_batch(&timestamps).unwrap();
            writer.commit().unwrap();
            let channel = writer.into_channels().unwrap().remove(0);
            // The inner channel holds the finished deflate stream.
            let compressed = channel.into_inner().unwrap();

            // Return ratio for verification (not part of benchmark timing)
            black_box(raw_size as f64 / compressed.len().max(1) as f64)
        })
    });
}

criterion_group!(
    benches,
    // Adaptive
    bench_adaptive,
    // Bit packing
    bench_bitpack,
    // Derived encoders
    bench_derived_timestamps,
    bench_derived_floats,
    // Resume
    bench_resume,
    bench_compression_ratio,
);
criterion_main!(benches);

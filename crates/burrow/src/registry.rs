//! Dynamic codec selection by value kind and encoding.
//!
//! The page layer knows each column only by its [`ColumnSpec`]. This module
//! maps every supported spec to constructors that return type-erased
//! [`DynColumnWriter`] / [`DynColumnReader`] objects over boxed channels.
//! Values cross the erased boundary as [`ColumnValues`] (borrowed, for
//! writes) and [`ColumnData`] (owned, for reads).
//!
//! # Supported combinations
//!
//! | Value kind                                  | Encodings                                     |
//! |---------------------------------------------|-----------------------------------------------|
//! | `Bool`, `UInt1`, `UInt2`, `UInt4`           | BitPacked                                     |
//! | `UInt8`, `Int8`, `UInt16`, `Int16`          | BitPacked, Delta, Xor                         |
//! | 32/64-bit integers, `Timestamp`, `Duration` | Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm |
//! | `Float32`, `Float64`                        | Plain, Adaptive, Xor, Dfcm                    |
//! | `Decimal128`                                | Plain                                         |
//! | `Utf8`, `Bytes`                             | VarLen                                        |

use crate::channel::{BoxedChannel, BoxedSource};
use crate::codec::{
    BitPackReader, BitPackWriter, Codec, ColumnCodec, ColumnDecoder, DeltaDeltaReader,
    DeltaDeltaWriter, DeltaReader, DeltaWriter, DfcmReader, DfcmWriter, NumericReader,
    NumericWriter, PlainReader, PlainWriter, ValueReader, ValueWriter, VarLenReader,
    VarLenWriter, XorReader, XorWriter,
};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::value::{Duration, Timestamp};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Logical type of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean, one bit per value.
    Bool,
    /// Unsigned 1-bit integer stored in a `u8`.
    UInt1,
    /// Unsigned 2-bit integer stored in a `u8`.
    UInt2,
    /// Unsigned 4-bit integer stored in a `u8`.
    UInt4,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// IEEE 754 single precision.
    Float32,
    /// IEEE 754 double precision.
    Float64,
    /// 128-bit decimal, stored as its unscaled `i128`.
    Decimal128,
    /// Nanosecond timestamp.
    Timestamp,
    /// Nanosecond duration.
    Duration,
    /// Nullable UTF-8 string.
    Utf8,
    /// Nullable opaque byte string.
    Bytes,
}

impl ValueKind {
    /// Every value kind, in declaration order.
    pub const ALL: [ValueKind; 19] = [
        Self::Bool,
        Self::UInt1,
        Self::UInt2,
        Self::UInt4,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::Decimal128,
        Self::Timestamp,
        Self::Duration,
        Self::Utf8,
        Self::Bytes,
    ];

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UInt1 => "uint1",
            Self::UInt2 => "uint2",
            Self::UInt4 => "uint4",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Decimal128 => "decimal128",
            Self::Timestamp => "timestamp",
            Self::Duration => "duration",
            Self::Utf8 => "utf8",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stream encoding of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Fixed-width little-endian values.
    Plain,
    /// Exact-width bit packing.
    BitPacked,
    /// Paired adaptive-width integers (sign-folded for signed kinds).
    Adaptive,
    /// Sign-folded difference from the previous value.
    Delta,
    /// Frame-based delta-delta.
    DeltaDelta,
    /// XOR with the previous value.
    Xor,
    /// Differential finite context method prediction.
    Dfcm,
    /// Length-prefixed variable-length values.
    VarLen,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value kind and encoding of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    /// Logical type of the values.
    pub kind: ValueKind,
    /// Stream encoding.
    pub encoding: Encoding,
}

impl ColumnSpec {
    /// Creates a column spec.
    pub const fn new(kind: ValueKind, encoding: Encoding) -> Self {
        Self { kind, encoding }
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.encoding)
    }
}

/// Borrowed batch of values for a dynamic writer.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum ColumnValues<'a> {
    Bool(&'a [bool]),
    UInt1(&'a [u8]),
    UInt2(&'a [u8]),
    UInt4(&'a [u8]),
    UInt8(&'a [u8]),
    UInt16(&'a [u16]),
    UInt32(&'a [u32]),
    UInt64(&'a [u64]),
    Int8(&'a [i8]),
    Int16(&'a [i16]),
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
    Decimal128(&'a [i128]),
    Timestamp(&'a [Timestamp]),
    Duration(&'a [Duration]),
    Utf8(&'a [Option<&'a str>]),
    Bytes(&'a [Option<&'a [u8]>]),
}

/// Owned values produced by a dynamic reader.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ColumnData {
    Bool(Vec<bool>),
    UInt1(Vec<u8>),
    UInt2(Vec<u8>),
    UInt4(Vec<u8>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Decimal128(Vec<i128>),
    Timestamp(Vec<Timestamp>),
    Duration(Vec<Duration>),
    Utf8(Vec<Option<String>>),
    Bytes(Vec<Option<Vec<u8>>>),
}

macro_rules! for_each_variant {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::Bool($inner) => $body,
            Self::UInt1($inner) => $body,
            Self::UInt2($inner) => $body,
            Self::UInt4($inner) => $body,
            Self::UInt8($inner) => $body,
            Self::UInt16($inner) => $body,
            Self::UInt32($inner) => $body,
            Self::UInt64($inner) => $body,
            Self::Int8($inner) => $body,
            Self::Int16($inner) => $body,
            Self::Int32($inner) => $body,
            Self::Int64($inner) => $body,
            Self::Float32($inner) => $body,
            Self::Float64($inner) => $body,
            Self::Decimal128($inner) => $body,
            Self::Timestamp($inner) => $body,
            Self::Duration($inner) => $body,
            Self::Utf8($inner) => $body,
            Self::Bytes($inner) => $body,
        }
    };
}

macro_rules! kind_of_variant {
    ($value:expr) => {
        match $value {
            Self::Bool(_) => ValueKind::Bool,
            Self::UInt1(_) => ValueKind::UInt1,
            Self::UInt2(_) => ValueKind::UInt2,
            Self::UInt4(_) => ValueKind::UInt4,
            Self::UInt8(_) => ValueKind::UInt8,
            Self::UInt16(_) => ValueKind::UInt16,
            Self::UInt32(_) => ValueKind::UInt32,
            Self::UInt64(_) => ValueKind::UInt64,
            Self::Int8(_) => ValueKind::Int8,
            Self::Int16(_) => ValueKind::Int16,
            Self::Int32(_) => ValueKind::Int32,
            Self::Int64(_) => ValueKind::Int64,
            Self::Float32(_) => ValueKind::Float32,
            Self::Float64(_) => ValueKind::Float64,
            Self::Decimal128(_) => ValueKind::Decimal128,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Duration(_) => ValueKind::Duration,
            Self::Utf8(_) => ValueKind::Utf8,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    };
}

impl ColumnValues<'_> {
    /// Value kind of the batch.
    pub fn kind(&self) -> ValueKind {
        kind_of_variant!(self)
    }

    /// Number of values in the batch.
    pub fn len(&self) -> usize {
        for_each_variant!(self, values => values.len())
    }

    /// Returns true if the batch holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ColumnData {
    /// Creates an empty buffer for values of `kind`.
    pub fn new(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => Self::Bool(Vec::new()),
            ValueKind::UInt1 => Self::UInt1(Vec::new()),
            ValueKind::UInt2 => Self::UInt2(Vec::new()),
            ValueKind::UInt4 => Self::UInt4(Vec::new()),
            ValueKind::UInt8 => Self::UInt8(Vec::new()),
            ValueKind::UInt16 => Self::UInt16(Vec::new()),
            ValueKind::UInt32 => Self::UInt32(Vec::new()),
            ValueKind::UInt64 => Self::UInt64(Vec::new()),
            ValueKind::Int8 => Self::Int8(Vec::new()),
            ValueKind::Int16 => Self::Int16(Vec::new()),
            ValueKind::Int32 => Self::Int32(Vec::new()),
            ValueKind::Int64 => Self::Int64(Vec::new()),
            ValueKind::Float32 => Self::Float32(Vec::new()),
            ValueKind::Float64 => Self::Float64(Vec::new()),
            ValueKind::Decimal128 => Self::Decimal128(Vec::new()),
            ValueKind::Timestamp => Self::Timestamp(Vec::new()),
            ValueKind::Duration => Self::Duration(Vec::new()),
            ValueKind::Utf8 => Self::Utf8(Vec::new()),
            ValueKind::Bytes => Self::Bytes(Vec::new()),
        }
    }

    /// Value kind of the buffer.
    pub fn kind(&self) -> ValueKind {
        kind_of_variant!(self)
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        for_each_variant!(self, values => values.len())
    }

    /// Returns true if no values are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all values, keeping the kind.
    pub fn clear(&mut self) {
        for_each_variant!(self, values => values.clear())
    }
}

/// A column writer with its value type erased.
pub trait DynColumnWriter: Send {
    /// Kind and encoding of the column.
    fn spec(&self) -> ColumnSpec;

    /// Number of channels the writer is bound to.
    fn channel_count(&self) -> usize;

    /// Appends a batch. Fails with [`CodecError::TypeMismatch`] if the batch
    /// kind differs from the column's.
    fn write(&mut self, values: ColumnValues<'_>) -> Result<()>;

    /// Emits all half-formed encoder state.
    fn commit(&mut self) -> Result<()>;

    /// Pushes buffered bytes to the channels.
    fn flush(&mut self) -> Result<()>;

    /// Clears encoder state before any byte was emitted.
    fn reset(&mut self) -> Result<()>;

    /// Flushes buffered bytes and returns the channels.
    fn into_channels(self: Box<Self>) -> Result<Vec<BoxedChannel>>;
}

/// A column reader with its value type erased.
pub trait DynColumnReader: Send {
    /// Kind and encoding of the column.
    fn spec(&self) -> ColumnSpec;

    /// Decodes up to `count` values, appending them to `out`, and returns
    /// how many were decoded. A short count marks the end of committed data.
    fn read(&mut self, out: &mut ColumnData, count: usize) -> Result<usize>;
}

/// Fixed-size item types that cross the erased boundary as plain slices.
trait ColumnItem: Copy + Default + Send + 'static {
    fn values<'a>(values: ColumnValues<'a>) -> Option<&'a [Self]>;
    fn output(data: &mut ColumnData) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_column_item {
    ($($ty:ty => $($variant:ident)|+;)*) => {$(
        impl ColumnItem for $ty {
            fn values<'a>(values: ColumnValues<'a>) -> Option<&'a [Self]> {
                match values {
                    $(ColumnValues::$variant(values))|+ => Some(values),
                    _ => None,
                }
            }

            fn output(data: &mut ColumnData) -> Option<&mut Vec<Self>> {
                match data {
                    $(ColumnData::$variant(values))|+ => Some(values),
                    _ => None,
                }
            }
        }
    )*};
}

impl_column_item! {
    bool => Bool;
    u8 => UInt1 | UInt2 | UInt4 | UInt8;
    u16 => UInt16;
    u32 => UInt32;
    u64 => UInt64;
    i8 => Int8;
    i16 => Int16;
    i32 => Int32;
    i64 => Int64;
    f32 => Float32;
    f64 => Float64;
    i128 => Decimal128;
    Timestamp => Timestamp;
    Duration => Duration;
}

fn check_kind(spec: ColumnSpec, actual: ValueKind) -> Result<()> {
    if spec.kind == actual {
        Ok(())
    } else {
        Err(CodecError::TypeMismatch {
            expected: spec.kind,
            actual: actual.name(),
        })
    }
}

struct TypedWriter<T, W> {
    spec: ColumnSpec,
    writer: W,
    _item: PhantomData<fn(T)>,
}

impl<T, W> DynColumnWriter for TypedWriter<T, W>
where
    T: ColumnItem,
    W: ValueWriter<T> + ColumnCodec<BoxedChannel> + Send,
{
    fn spec(&self) -> ColumnSpec {
        self.spec
    }

    fn channel_count(&self) -> usize {
        self.writer.channel_count()
    }

    fn write(&mut self, values: ColumnValues<'_>) -> Result<()> {
        check_kind(self.spec, values.kind())?;
        let values = T::values(values).ok_or(CodecError::TypeMismatch {
            expected: self.spec.kind,
            actual: values.kind().name(),
        })?;
        self.writer.write_batch(values)
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.commit()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    fn reset(&mut self) -> Result<()> {
        self.writer.reset()
    }

    fn into_channels(self: Box<Self>) -> Result<Vec<BoxedChannel>> {
        self.writer.into_channels()
    }
}

struct TypedReader<T, R> {
    spec: ColumnSpec,
    reader: R,
    _item: PhantomData<fn() -> T>,
}

impl<T, R> DynColumnReader for TypedReader<T, R>
where
    T: ColumnItem,
    R: ValueReader<T> + Send,
{
    fn spec(&self) -> ColumnSpec {
        self.spec
    }

    fn read(&mut self, out: &mut ColumnData, count: usize) -> Result<usize> {
        check_kind(self.spec, out.kind())?;
        let actual = out.kind().name();
        let values = T::output(out).ok_or(CodecError::TypeMismatch {
            expected: self.spec.kind,
            actual,
        })?;
        let start = values.len();
        values.resize(start + count, T::default());
        let n = self.reader.read(&mut values[start..])?;
        values.truncate(start + n);
        Ok(n)
    }
}

struct VarLenColumnWriter {
    spec: ColumnSpec,
    writer: VarLenWriter<BoxedChannel>,
}

impl DynColumnWriter for VarLenColumnWriter {
    fn spec(&self) -> ColumnSpec {
        self.spec
    }

    fn channel_count(&self) -> usize {
        self.writer.channel_count()
    }

    fn write(&mut self, values: ColumnValues<'_>) -> Result<()> {
        check_kind(self.spec, values.kind())?;
        match values {
            ColumnValues::Utf8(values) => self.writer.write_batch(values),
            ColumnValues::Bytes(values) => self.writer.write_batch(values),
            other => Err(CodecError::TypeMismatch {
                expected: self.spec.kind,
                actual: other.kind().name(),
            }),
        }
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.commit()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    fn reset(&mut self) -> Result<()> {
        self.writer.reset()
    }

    fn into_channels(self: Box<Self>) -> Result<Vec<BoxedChannel>> {
        self.writer.into_channels()
    }
}

struct VarLenColumnReader {
    spec: ColumnSpec,
    reader: VarLenReader<BoxedSource>,
}

impl DynColumnReader for VarLenColumnReader {
    fn spec(&self) -> ColumnSpec {
        self.spec
    }

    fn read(&mut self, out: &mut ColumnData, count: usize) -> Result<usize> {
        check_kind(self.spec, out.kind())?;
        match out {
            ColumnData::Utf8(values) => {
                let start = values.len();
                values.resize(start + count, None);
                let n = ValueReader::<Option<String>>::read(&mut self.reader, &mut values[start..])?;
                values.truncate(start + n);
                Ok(n)
            }
            ColumnData::Bytes(values) => {
                let start = values.len();
                values.resize(start + count, None);
                let n = ValueReader::<Option<Vec<u8>>>::read(&mut self.reader, &mut values[start..])?;
                values.truncate(start + n);
                Ok(n)
            }
            other => Err(CodecError::TypeMismatch {
                expected: self.spec.kind,
                actual: other.kind().name(),
            }),
        }
    }
}

type OpenWriterFn =
    fn(ColumnSpec, Vec<BoxedChannel>, &CodecConfig) -> Result<Box<dyn DynColumnWriter>>;
type ResumeWriterFn =
    fn(ColumnSpec, Vec<BoxedChannel>, u64, &CodecConfig) -> Result<Box<dyn DynColumnWriter>>;
type OpenReaderFn =
    fn(ColumnSpec, Vec<BoxedSource>, &CodecConfig) -> Result<Box<dyn DynColumnReader>>;

/// Constructors registered for one column spec.
pub struct CodecEntry {
    /// The supported combination.
    pub spec: ColumnSpec,
    open_writer: OpenWriterFn,
    resume_writer: ResumeWriterFn,
    open_reader: OpenReaderFn,
}

impl fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecEntry").field("spec", &self.spec).finish()
    }
}

fn open_typed<T, W>(
    spec: ColumnSpec,
    channels: Vec<BoxedChannel>,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnWriter>>
where
    T: ColumnItem,
    W: ValueWriter<T> + ColumnCodec<BoxedChannel> + Send + 'static,
{
    Ok(Box::new(TypedWriter::<T, W> {
        spec,
        writer: W::open(channels, config)?,
        _item: PhantomData,
    }))
}

fn resume_typed<T, W>(
    spec: ColumnSpec,
    channels: Vec<BoxedChannel>,
    prior_rows: u64,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnWriter>>
where
    T: ColumnItem,
    W: ValueWriter<T> + ColumnCodec<BoxedChannel> + Send + 'static,
{
    Ok(Box::new(TypedWriter::<T, W> {
        spec,
        writer: W::resume(channels, prior_rows, config)?,
        _item: PhantomData,
    }))
}

fn read_typed<T, R>(
    spec: ColumnSpec,
    sources: Vec<BoxedSource>,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnReader>>
where
    T: ColumnItem,
    R: ValueReader<T> + ColumnDecoder<BoxedSource> + Send + 'static,
{
    Ok(Box::new(TypedReader::<T, R> {
        spec,
        reader: R::open(sources, config)?,
        _item: PhantomData,
    }))
}

fn open_varlen(
    spec: ColumnSpec,
    channels: Vec<BoxedChannel>,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnWriter>> {
    Ok(Box::new(VarLenColumnWriter {
        spec,
        writer: VarLenWriter::open(channels, config)?,
    }))
}

fn resume_varlen(
    spec: ColumnSpec,
    channels: Vec<BoxedChannel>,
    prior_rows: u64,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnWriter>> {
    Ok(Box::new(VarLenColumnWriter {
        spec,
        writer: VarLenWriter::resume(channels, prior_rows, config)?,
    }))
}

fn read_varlen(
    spec: ColumnSpec,
    sources: Vec<BoxedSource>,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnReader>> {
    Ok(Box::new(VarLenColumnReader {
        spec,
        reader: VarLenReader::open(sources, config)?,
    }))
}

macro_rules! typed_entry {
    ($kind:ident, $encoding:ident, $item:ty, $writer:ty, $reader:ty) => {
        CodecEntry {
            spec: ColumnSpec::new(ValueKind::$kind, Encoding::$encoding),
            open_writer: open_typed::<$item, $writer>,
            resume_writer: resume_typed::<$item, $writer>,
            open_reader: read_typed::<$item, $reader>,
        }
    };
}

macro_rules! entry {
    ($kind:ident, BitPacked ($width:literal), $item:ty) => {
        typed_entry!(
            $kind,
            BitPacked,
            $item,
            BitPackWriter<BoxedChannel, $width>,
            BitPackReader<BoxedSource, $width>
        )
    };
    ($kind:ident, Plain, $item:ty) => {
        typed_entry!($kind, Plain, $item, PlainWriter<$item, BoxedChannel>, PlainReader<$item, BoxedSource>)
    };
    ($kind:ident, Adaptive, $item:ty) => {
        typed_entry!($kind, Adaptive, $item, NumericWriter<$item, BoxedChannel>, NumericReader<$item, BoxedSource>)
    };
    ($kind:ident, Delta, $item:ty) => {
        typed_entry!($kind, Delta, $item, DeltaWriter<$item, BoxedChannel>, DeltaReader<$item, BoxedSource>)
    };
    ($kind:ident, DeltaDelta, $item:ty) => {
        typed_entry!($kind, DeltaDelta, $item, DeltaDeltaWriter<$item, BoxedChannel>, DeltaDeltaReader<$item, BoxedSource>)
    };
    ($kind:ident, Xor, $item:ty) => {
        typed_entry!($kind, Xor, $item, XorWriter<$item, BoxedChannel>, XorReader<$item, BoxedSource>)
    };
    ($kind:ident, Dfcm, $item:ty) => {
        typed_entry!($kind, Dfcm, $item, DfcmWriter<$item, BoxedChannel>, DfcmReader<$item, BoxedSource>)
    };
    ($kind:ident, VarLen, $item:ty) => {
        CodecEntry {
            spec: ColumnSpec::new(ValueKind::$kind, Encoding::VarLen),
            open_writer: open_varlen,
            resume_writer: resume_varlen,
            open_reader: read_varlen,
        }
    };
}

macro_rules! registry {
    ($($kind:ident : $item:ty => [$($encoding:ident $(($width:literal))?),+];)*) => {
        static REGISTRY: &[CodecEntry] = &[
            $($(entry!($kind, $encoding $(($width))?, $item),)+)*
        ];
    };
}

registry! {
    Bool: bool => [BitPacked(1)];
    UInt1: u8 => [BitPacked(1)];
    UInt2: u8 => [BitPacked(2)];
    UInt4: u8 => [BitPacked(4)];
    UInt8: u8 => [BitPacked(8), Delta, Xor];
    Int8: i8 => [BitPacked(8), Delta, Xor];
    UInt16: u16 => [BitPacked(16), Delta, Xor];
    Int16: i16 => [BitPacked(16), Delta, Xor];
    UInt32: u32 => [Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm];
    Int32: i32 => [Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm];
    UInt64: u64 => [Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm];
    Int64: i64 => [Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm];
    Timestamp: Timestamp => [Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm];
    Duration: Duration => [Plain, Adaptive, Delta, DeltaDelta, Xor, Dfcm];
    Float32: f32 => [Plain, Adaptive, Xor, Dfcm];
    Float64: f64 => [Plain, Adaptive, Xor, Dfcm];
    Decimal128: i128 => [Plain];
    Utf8: String => [VarLen];
    Bytes: Vec<u8> => [VarLen];
}

/// All registered codec entries.
pub fn entries() -> &'static [CodecEntry] {
    REGISTRY
}

/// Encodings registered for `kind`, in registry order.
pub fn supported_encodings(kind: ValueKind) -> Vec<Encoding> {
    REGISTRY
        .iter()
        .filter(|entry| entry.spec.kind == kind)
        .map(|entry| entry.spec.encoding)
        .collect()
}

/// Finds the entry for `spec`.
pub fn lookup(spec: ColumnSpec) -> Result<&'static CodecEntry> {
    REGISTRY
        .iter()
        .find(|entry| entry.spec == spec)
        .ok_or_else(|| CodecError::Unsupported {
            kind: spec.kind,
            encoding: spec.encoding,
            valid: supported_encodings(spec.kind),
        })
}

/// Number of channels a column with `spec` needs under `config`.
pub fn channel_count(spec: ColumnSpec, config: &CodecConfig) -> Result<usize> {
    let entry = lookup(spec)?;
    Ok(match entry.spec.encoding {
        Encoding::VarLen => config.varlen_layout.channel_count(),
        _ => 1,
    })
}

/// Binds a fresh writer for `spec` to empty channels.
pub fn open_writer(
    spec: ColumnSpec,
    channels: Vec<BoxedChannel>,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnWriter>> {
    let entry = lookup(spec)?;
    debug!("Opening {} writer on {} channels", spec, channels.len());
    (entry.open_writer)(spec, channels, config)
}

/// Reopens a writer for `spec` over channels holding `prior_rows` committed
/// values.
pub fn resume_writer(
    spec: ColumnSpec,
    channels: Vec<BoxedChannel>,
    prior_rows: u64,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnWriter>> {
    let entry = lookup(spec)?;
    debug!("Resuming {} writer after {} prior values", spec, prior_rows);
    (entry.resume_writer)(spec, channels, prior_rows, config)
}

/// Binds a reader for `spec` to the committed content of its channels.
pub fn open_reader(
    spec: ColumnSpec,
    sources: Vec<BoxedSource>,
    config: &CodecConfig,
) -> Result<Box<dyn DynColumnReader>> {
    let entry = lookup(spec)?;
    (entry.open_reader)(spec, sources, config)
}

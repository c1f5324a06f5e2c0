//! Burrow - Alopex Column Stream Codecs
//!
//! This crate provides the per-column encoding layer of the Alopex columnar
//! time series storage engine. Each column of a page is written through a
//! codec bound to one or more byte channels; the page layer owns the
//! channels and decides when to commit.
//!
//! # Components
//!
//! - [`codec`]: adaptive paired integers, bit packing, plain, variable-length,
//!   delta, XOR, delta-delta and DFCM codecs
//! - [`Channel`]: the byte stream a codec appends to, with
//!   [`MemoryChannel`], [`FileChannel`] and [`CompressedChannel`]
//! - [`registry`]: selection of a codec by [`ValueKind`] and [`Encoding`]
//!   behind a type-erased interface
//! - [`resume`]: reopening a writer over a partially written column
//!
//! # Example
//!
//! ```rust
//! use alopex_burrow::{
//!     registry, BoxedChannel, CodecConfig, ColumnData, ColumnSpec, ColumnValues, Encoding,
//!     MemoryChannel, Timestamp, ValueKind,
//! };
//!
//! let config = CodecConfig::default();
//! let spec = ColumnSpec::new(ValueKind::Timestamp, Encoding::DeltaDelta);
//! let channel: BoxedChannel = Box::new(MemoryChannel::new());
//!
//! let mut writer = registry::open_writer(spec, vec![channel], &config)?;
//! let times: Vec<Timestamp> = (0..100).map(|i| Timestamp(1_700_000_000 + i * 10)).collect();
//! writer.write(ColumnValues::Timestamp(&times))?;
//! writer.commit()?;
//!
//! let mut channels = writer.into_channels()?;
//! let source = channels[0].take_contents()?;
//! let mut reader = registry::open_reader(spec, vec![source], &config)?;
//! let mut out = ColumnData::new(ValueKind::Timestamp);
//! assert_eq!(reader.read(&mut out, 1000)?, 100);
//! # Ok::<(), alopex_burrow::CodecError>(())
//! ```

#![deny(missing_docs)]

pub mod bits;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod registry;
pub mod resume;
pub mod value;

pub use channel::{BoxedChannel, BoxedSource, Channel, CompressedChannel, FileChannel, MemoryChannel};
pub use config::{CodecConfig, VarLenLayout};
pub use error::{CodecError, Result};
pub use registry::{
    ColumnData, ColumnSpec, ColumnValues, DynColumnReader, DynColumnWriter, Encoding, ValueKind,
};
pub use value::{BitCast, Duration, Timestamp};

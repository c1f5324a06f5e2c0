//! Error and Result types for Burrow codec operations.

use crate::registry::{Encoding, ValueKind};
use std::io;
use thiserror::Error;

/// A convenience `Result` type for Burrow operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// The error type for codec operations.
///
/// Truncated or malformed input is never reported through this type: readers
/// signal the end of usable data with a short read count instead.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The requested (value kind, encoding) combination has no codec.
    #[error("Unsupported column codec: {kind:?} with {encoding:?} encoding (valid encodings for {kind:?}: {valid:?})")]
    Unsupported {
        /// Requested value kind.
        kind: ValueKind,
        /// Requested encoding.
        encoding: Encoding,
        /// Encodings registered for `kind`.
        valid: Vec<Encoding>,
    },

    /// A codec was bound to the wrong number of channels.
    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelCount {
        /// Channels the codec requires.
        expected: usize,
        /// Channels supplied by the caller.
        actual: usize,
    },

    /// Values handed to a dynamic column codec do not match its value kind.
    #[error("Value type mismatch: column holds {expected:?}, got {actual}")]
    TypeMismatch {
        /// Value kind of the column.
        expected: ValueKind,
        /// Name of the value variant that was supplied.
        actual: &'static str,
    },

    /// A value does not fit the bit width of its packed column.
    #[error("Value out of range: {bits:#x} does not fit in {width} bits")]
    OutOfRange {
        /// Raw bits of the rejected value.
        bits: u16,
        /// Bit width of the column.
        width: u32,
    },

    /// The codec was used in a way its lifecycle does not allow.
    #[error("Invalid codec state: {0}")]
    InvalidState(&'static str),

    /// Underlying channel I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

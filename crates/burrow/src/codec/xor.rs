//! XOR encoding: each value is transmitted as its bits XOR the previous
//! value's bits.
//!
//! Slowly changing floats share sign, exponent and high mantissa bits with
//! their predecessor, so the XOR has long runs of leading zero bytes that the
//! adaptive codec trims away. Identical values transmit as zero and collapse
//! into zero runs.

use crate::bits::Word;
use crate::codec::delta::{Difference, DifferenceReader, DifferenceWriter};

/// Bitwise XOR against the previous word.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xor;

impl Difference for Xor {
    const NAME: &'static str = "xor";

    #[inline]
    fn encode<W: Word>(previous: W, current: W) -> W {
        current ^ previous
    }

    #[inline]
    fn decode<W: Word>(previous: W, transmitted: W) -> W {
        previous ^ transmitted
    }
}

/// XOR writer.
pub type XorWriter<T, C> = DifferenceWriter<Xor, T, C>;

/// XOR reader.
pub type XorReader<T, R> = DifferenceReader<Xor, T, R>;

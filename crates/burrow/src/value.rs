//! Column value types and their bit-level adapters.
//!
//! Complex types (timestamps, durations, floats) are stored by reinterpreting
//! their bits as an unsigned [`Word`] and delegating to the integer codecs.
//! Byte order is fixed by the primitive codecs (little-endian), so the adapters
//! only reinterpret.

use crate::codec::PrimitiveWord;
use std::fmt::Debug;

/// A point in time as signed nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from nanoseconds since the Unix epoch.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since the Unix epoch.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }
}

/// A signed span of time in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub i64);

impl Duration {
    /// Creates a duration from signed nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Signed nanoseconds.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }
}

/// Bit-for-bit mapping between a column value and an unsigned word.
pub trait BitCast: Copy + Default + Debug + PartialEq + Send + 'static {
    /// Word the value is reinterpreted as.
    type Word: PrimitiveWord;

    /// True for two's complement integer types, which are sign-folded when
    /// written without a derived transform.
    const SIGNED: bool = false;

    /// Reinterprets the value as its word.
    fn to_word(self) -> Self::Word;

    /// Reinterprets a word as a value.
    fn from_word(word: Self::Word) -> Self;

    /// Appends the words of `values` to `words`.
    fn to_words(values: &[Self], words: &mut Vec<Self::Word>) {
        words.extend(values.iter().map(|value| value.to_word()));
    }

    /// Converts `words` into `values`, pairwise.
    fn from_words(words: &[Self::Word], values: &mut [Self]) {
        for (value, word) in values.iter_mut().zip(words) {
            *value = Self::from_word(*word);
        }
    }
}

macro_rules! impl_bitcast_unsigned {
    ($($ty:ty),*) => {$(
        impl BitCast for $ty {
            type Word = $ty;

            #[inline]
            fn to_word(self) -> $ty {
                self
            }

            #[inline]
            fn from_word(word: $ty) -> Self {
                word
            }

            fn to_words(values: &[Self], words: &mut Vec<$ty>) {
                words.extend_from_slice(values);
            }

            fn from_words(words: &[$ty], values: &mut [Self]) {
                let n = words.len().min(values.len());
                values[..n].copy_from_slice(&words[..n]);
            }
        }
    )*};
}

macro_rules! impl_bitcast_signed {
    ($($ty:ty => $word:ty),*) => {$(
        impl BitCast for $ty {
            type Word = $word;
            const SIGNED: bool = true;

            #[inline]
            fn to_word(self) -> $word {
                self as $word
            }

            #[inline]
            fn from_word(word: $word) -> Self {
                word as $ty
            }
        }
    )*};
}

impl_bitcast_unsigned!(u8, u16, u32, u64);
impl_bitcast_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);

impl BitCast for f32 {
    type Word = u32;

    #[inline]
    fn to_word(self) -> u32 {
        self.to_bits()
    }

    #[inline]
    fn from_word(word: u32) -> Self {
        f32::from_bits(word)
    }
}

impl BitCast for f64 {
    type Word = u64;

    #[inline]
    fn to_word(self) -> u64 {
        self.to_bits()
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        f64::from_bits(word)
    }
}

impl BitCast for Timestamp {
    type Word = u64;
    const SIGNED: bool = true;

    #[inline]
    fn to_word(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        Self(word as i64)
    }
}

impl BitCast for Duration {
    type Word = u64;
    const SIGNED: bool = true;

    #[inline]
    fn to_word(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        Self(word as i64)
    }
}

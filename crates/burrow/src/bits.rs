//! Bit-level primitives shared by every codec.
//!
//! Everything here is pure: zero-byte counting picks the narrowest byte span
//! that can hold a value, sign folding (zig-zag) maps small negative numbers
//! onto small unsigned numbers, and the [`Word`] trait gives the derived
//! encoders one fixed-width integer vocabulary for `u8`, `u16`, `u32` and `u64`.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::BitXor;

/// Number of all-zero bytes above the highest set bit of `value`.
///
/// Returns 4 for zero.
#[inline]
pub fn leading_zero_bytes_u32(value: u32) -> u32 {
    value.leading_zeros() / 8
}

/// Number of all-zero bytes below the lowest set bit of `value`.
///
/// Returns 4 for zero.
#[inline]
pub fn trailing_zero_bytes_u32(value: u32) -> u32 {
    value.trailing_zeros() / 8
}

/// Number of all-zero bytes above the highest set bit of `value`.
///
/// Returns 8 for zero.
#[inline]
pub fn leading_zero_bytes_u64(value: u64) -> u32 {
    value.leading_zeros() / 8
}

/// Number of all-zero bytes below the lowest set bit of `value`.
///
/// Returns 8 for zero.
#[inline]
pub fn trailing_zero_bytes_u64(value: u64) -> u32 {
    value.trailing_zeros() / 8
}

/// Zig-zag folds a signed 32-bit integer: 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...
#[inline]
pub fn fold_sign_i32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`fold_sign_i32`].
#[inline]
pub fn unfold_sign_u32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag folds a signed 64-bit integer.
#[inline]
pub fn fold_sign_i64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`fold_sign_i64`].
#[inline]
pub fn unfold_sign_u64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Fixed-width unsigned integer capability used by the derived encoders.
///
/// Values of every column type are reinterpreted as one of these words before
/// they reach a primitive codec; signed semantics (sign folding, signed
/// minimum) are applied on the two's complement reading of the same bits.
pub trait Word:
    Copy + Eq + Ord + Default + Debug + Hash + BitXor<Output = Self> + Send + Sync + 'static
{
    /// Width in bits.
    const BITS: u32;
    /// Width in bytes.
    const BYTES: usize;
    /// The all-zero word.
    const ZERO: Self;

    /// Two's complement subtraction.
    fn wrapping_sub(self, rhs: Self) -> Self;
    /// Two's complement addition.
    fn wrapping_add(self, rhs: Self) -> Self;
    /// Zig-zag folds the signed reading of this word.
    fn fold_sign(self) -> Self;
    /// Inverse of [`Word::fold_sign`].
    fn unfold_sign(self) -> Self;
    /// Returns the smaller of two words compared as signed integers.
    fn signed_min(self, other: Self) -> Self;
    /// Number of all-zero high-order bytes.
    fn leading_zero_bytes(self) -> u32;
    /// Number of all-zero low-order bytes.
    fn trailing_zero_bytes(self) -> u32;
    /// Zero-extends to 64 bits.
    fn to_u64(self) -> u64;
    /// Truncates a 64-bit value to this width.
    fn from_u64(value: u64) -> Self;
}

macro_rules! impl_word {
    ($unsigned:ty, $signed:ty) => {
        impl Word for $unsigned {
            const BITS: u32 = <$unsigned>::BITS;
            const BYTES: usize = std::mem::size_of::<$unsigned>();
            const ZERO: Self = 0;

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$unsigned>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$unsigned>::wrapping_add(self, rhs)
            }

            #[inline]
            fn fold_sign(self) -> Self {
                let signed = self as $signed;
                ((signed << 1) ^ (signed >> (<$signed>::BITS - 1))) as $unsigned
            }

            #[inline]
            fn unfold_sign(self) -> Self {
                (((self >> 1) as $signed) ^ -((self & 1) as $signed)) as $unsigned
            }

            #[inline]
            fn signed_min(self, other: Self) -> Self {
                if (other as $signed) < (self as $signed) {
                    other
                } else {
                    self
                }
            }

            #[inline]
            fn leading_zero_bytes(self) -> u32 {
                self.leading_zeros() / 8
            }

            #[inline]
            fn trailing_zero_bytes(self) -> u32 {
                self.trailing_zeros() / 8
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_u64(value: u64) -> Self {
                value as $unsigned
            }
        }
    };
}

impl_word!(u8, i8);
impl_word!(u16, i16);
impl_word!(u32, i32);
impl_word!(u64, i64);

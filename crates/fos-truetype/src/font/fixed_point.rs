//! Fixed-Point Arithmetic
//!
//! TrueType stores compound glyph scales and 2x2 transforms as F2Dot14.

use std::ops::{Mul, Neg};

/// 2.14 fixed-point number (16-bit total)
///
/// - 2 bits signed integer part: range -2.0 to just under 2.0
/// - 14 bits fraction: precision of 1/16384
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct F2Dot14(i16);

impl F2Dot14 {
    pub const FRAC_BITS: u32 = 14;
    pub const SCALE: i32 = 1 << Self::FRAC_BITS;

    pub const ZERO: F2Dot14 = F2Dot14(0);
    pub const ONE: F2Dot14 = F2Dot14(Self::SCALE as i16);

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: i16) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> i16 {
        self.0
    }

    /// Create from f32, saturating at the representable range
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        let raw = (value * Self::SCALE as f32).round();
        Self(raw.clamp(i16::MIN as f32, i16::MAX as f32) as i16)
    }

    /// Convert to f32
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }
}

impl Mul for F2Dot14 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let result = (self.0 as i32 * rhs.0 as i32) >> Self::FRAC_BITS;
        Self(result.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
    }
}

impl Neg for F2Dot14 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl From<F2Dot14> for f32 {
    #[inline]
    fn from(value: F2Dot14) -> Self {
        value.to_f32()
    }
}

//! Fixed-Point Arithmetic
//!
//! Font backends report metrics in two fixed-point formats:
//! - 26.6 (sixty-fourths of a pixel) for positions, advances and kerning
//! - 16.16 for scale factors
//!
//! Every conversion to pixels divides by 64.

use std::ops::{Add, Neg, Sub};

/// 26.6 fixed-point number (1/64 pixel units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct F26Dot6(i32);

impl F26Dot6 {
    pub const FRAC_BITS: u32 = 6;
    pub const SCALE: i32 = 1 << Self::FRAC_BITS;

    pub const ZERO: F26Dot6 = F26Dot6(0);
    pub const ONE: F26Dot6 = F26Dot6(Self::SCALE);

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Create from whole pixels
    #[inline]
    pub const fn from_i32(value: i32) -> Self {
        Self(value << Self::FRAC_BITS)
    }

    /// Create from f32 pixels (truncating toward zero)
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::SCALE as f32) as i32)
    }

    /// Convert to f32 pixels
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }

    /// Whole pixels, rounding toward negative infinity
    #[inline]
    pub const fn floor_px(self) -> i32 {
        self.0 >> Self::FRAC_BITS
    }

    /// Round to the nearest whole pixel (still in 26.6)
    #[inline]
    pub const fn pix_round(self) -> Self {
        Self((self.0 + 32) & !63)
    }

    /// Round up to a whole pixel (still in 26.6)
    #[inline]
    pub const fn pix_ceil(self) -> Self {
        Self((self.0 + 63) & !63)
    }

    /// Round down to a whole pixel (still in 26.6)
    #[inline]
    pub const fn pix_floor(self) -> Self {
        Self(self.0 & !63)
    }
}

impl Add for F26Dot6 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for F26Dot6 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for F26Dot6 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl From<i32> for F26Dot6 {
    #[inline]
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

/// 16.16 fixed-point number, used for scale factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Fixed16(i32);

impl Fixed16 {
    pub const FRAC_BITS: u32 = 16;
    pub const SCALE: i32 = 1 << Self::FRAC_BITS;

    pub const ZERO: Fixed16 = Fixed16(0);
    pub const ONE: Fixed16 = Fixed16(Self::SCALE);

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }
}

/// Compute `(a * b) / 0x10000` with rounding, as backends scale font units
///
/// Rounds half away from zero.
pub fn mul_fix(a: i32, b: Fixed16) -> i32 {
    let product = i64::from(a) * i64::from(b.0);
    let rounded = (product.abs() + 0x8000) >> 16;
    let signed = if product < 0 { -rounded } else { rounded };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Compute `(a * 0x10000) / b` with rounding
///
/// Division by zero saturates.
pub fn div_fix(a: i32, b: i32) -> Fixed16 {
    if b == 0 {
        return if a >= 0 { Fixed16(i32::MAX) } else { Fixed16(-i32::MAX) };
    }
    let numerator = (i64::from(a).abs() << 16) + i64::from(b).abs() / 2;
    let quotient = numerator / i64::from(b).abs();
    let signed = if (a < 0) != (b < 0) { -quotient } else { quotient };
    Fixed16(signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f26dot6_basic() {
        let a = F26Dot6::from_i32(10);
        let b = F26Dot6::from_bits(32);

        assert_eq!((a + b).to_f32(), 10.5);
        assert_eq!((a - b).to_f32(), 9.5);
        assert_eq!(a.floor_px(), 10);
        assert_eq!((-b).floor_px(), -1);
    }

    #[test]
    fn test_f26dot6_rounding() {
        assert_eq!(F26Dot6::from_bits(95).pix_round().to_bits(), 64);
        assert_eq!(F26Dot6::from_bits(96).pix_round().to_bits(), 128);
        assert_eq!(F26Dot6::from_bits(65).pix_ceil().to_bits(), 128);
        assert_eq!(F26Dot6::from_bits(127).pix_floor().to_bits(), 64);
        assert_eq!(F26Dot6::from_bits(-1).pix_floor().to_bits(), -64);
    }

    #[test]
    fn test_mul_fix() {
        assert_eq!(mul_fix(100, Fixed16::ONE), 100);
        assert_eq!(mul_fix(100, Fixed16::from_bits(0x8000)), 50);
        assert_eq!(mul_fix(-100, Fixed16::from_bits(0x8000)), -50);
        // 3 * 0.5 = 1.5 rounds away from zero
        assert_eq!(mul_fix(3, Fixed16::from_bits(0x8000)), 2);
        assert_eq!(mul_fix(-3, Fixed16::from_bits(0x8000)), -2);
    }

    #[test]
    fn test_div_fix() {
        assert_eq!(div_fix(1, 2), Fixed16::from_bits(0x8000));
        assert_eq!(div_fix(30 * 64, 2048).to_bits(), 61440);
        assert_eq!(div_fix(-1, 2), Fixed16::from_bits(-0x8000));
        assert_eq!(div_fix(5, 0).to_bits(), i32::MAX);
    }
}

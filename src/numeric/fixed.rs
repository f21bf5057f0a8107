//! Signed fractional fixed-point arithmetic.
//!
//! Values are two's-complement integers scaled by `2^-frac_bits` and held
//! in `total_bits` bits. The rounding behaviour follows the default modes
//! of hardware fixed-point types:
//!
//! - conversion from f64 truncates toward negative infinity
//! - an affine expression is evaluated exactly, with full-width products
//!   and sums
//! - the result is truncated once to `frac_bits` and wrapped to
//!   `total_bits` on assignment
//!
//! Wrapping rather than saturating keeps the fixed-point configuration
//! bit-exact with generated hardware.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchSimError};

use super::Arithmetic;

/// Widest supported format, so that raw values fit in an `i64` and an
/// exact affine accumulation fits in an `i128`.
pub const MAX_TOTAL_BITS: u32 = 63;

/// A fixed-point format: total width and fractional width, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedFormat {
    pub total_bits: u32,
    pub frac_bits: u32,
}

impl FixedFormat {
    /// Create a validated format.
    pub fn new(total_bits: u32, frac_bits: u32) -> Result<Self> {
        let format = Self {
            total_bits,
            frac_bits,
        };
        format.validate()?;
        Ok(format)
    }

    /// Number of integer bits, sign included.
    pub fn int_bits(&self) -> u32 {
        self.total_bits - self.frac_bits
    }

    /// Smallest representable step.
    pub fn resolution(&self) -> f64 {
        (-(self.frac_bits as f64)).exp2()
    }

    /// Largest representable value.
    pub fn max_value(&self) -> f64 {
        let max_raw = (1i64 << (self.total_bits - 1)) - 1;
        max_raw as f64 * self.resolution()
    }

    /// Smallest (most negative) representable value.
    pub fn min_value(&self) -> f64 {
        let min_raw = -(1i64 << (self.total_bits - 1));
        min_raw as f64 * self.resolution()
    }

    /// Wrap an integer into `total_bits` two's complement.
    fn wrap(&self, raw: i128) -> i64 {
        let shift = 128 - self.total_bits;
        (raw.wrapping_shl(shift) >> shift) as i64
    }
}

/// A raw fixed-point value. Its meaning depends on the [`FixedFormat`]
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fixed(i64);

impl Fixed {
    /// Construct from a raw scaled integer.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw scaled integer.
    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl Arithmetic for FixedFormat {
    type Value = Fixed;

    fn quantize(&self, x: f64) -> Fixed {
        if x.is_nan() {
            return Fixed(0);
        }
        let scaled = (x * (self.frac_bits as f64).exp2()).floor();
        Fixed(self.wrap(scaled as i128))
    }

    fn to_f64(&self, value: Fixed) -> f64 {
        value.0 as f64 * self.resolution()
    }

    fn zero(&self) -> Fixed {
        Fixed(0)
    }

    fn affine<I>(&self, constant: Fixed, terms: I) -> Fixed
    where
        I: IntoIterator<Item = (Fixed, Fixed)>,
    {
        // Accumulate at 2 * frac_bits. Wrapping at 128 bits does not change
        // the low total_bits + frac_bits bits, which is all the result keeps.
        let acc = terms.into_iter().fold(
            (constant.0 as i128).wrapping_shl(self.frac_bits),
            |acc, (gain, operand)| acc.wrapping_add((gain.0 as i128).wrapping_mul(operand.0 as i128)),
        );
        Fixed(self.wrap(acc >> self.frac_bits))
    }

    fn is_positive(&self, value: Fixed) -> bool {
        value.0 > 0
    }

    fn is_non_positive(&self, value: Fixed) -> bool {
        value.0 <= 0
    }

    fn label(&self) -> String {
        format!("fixed<{},{}>", self.total_bits, self.frac_bits)
    }

    fn validate(&self) -> Result<()> {
        if self.total_bits < 2 || self.total_bits > MAX_TOTAL_BITS || self.frac_bits >= self.total_bits {
            return Err(SwitchSimError::InvalidFormat {
                total_bits: self.total_bits,
                frac_bits: self.frac_bits,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn q25_13() -> FixedFormat {
        FixedFormat::new(25, 13).unwrap()
    }

    #[test]
    fn test_format_validation() {
        assert!(FixedFormat::new(25, 13).is_ok());
        assert!(FixedFormat::new(64, 10).is_err());
        assert!(FixedFormat::new(8, 8).is_err());
        assert!(FixedFormat::new(1, 0).is_err());

        let literal = FixedFormat {
            total_bits: 0,
            frac_bits: 0,
        };
        assert!(matches!(
            literal.validate(),
            Err(SwitchSimError::InvalidFormat {
                total_bits: 0,
                frac_bits: 0
            })
        ));
    }

    #[test]
    fn test_raw_values() {
        let f = FixedFormat::new(8, 4).unwrap();
        assert_relative_eq!(f.to_f64(Fixed::from_raw(-24)), -1.5);
        assert_eq!(f.quantize(-1.5), Fixed::from_raw(-24));
    }

    #[test]
    fn test_quantize_truncates_toward_negative_infinity() {
        let f = q25_13();
        // 0.025 * 8192 = 204.8
        assert_eq!(f.quantize(0.025).raw(), 204);
        // -0.1 * 8192 = -819.2
        assert_eq!(f.quantize(-0.1).raw(), -820);
        assert_eq!(f.quantize(f64::NAN).raw(), 0);
    }

    #[test]
    fn test_quantize_wraps_on_overflow() {
        let f = FixedFormat::new(8, 4).unwrap();
        // range is [-8, 7.9375]; 8.0 wraps to -8.0
        assert_relative_eq!(f.to_f64(f.quantize(8.0)), -8.0);
        assert_relative_eq!(f.to_f64(f.quantize(7.9375)), 7.9375);
        assert_relative_eq!(f.max_value(), 7.9375);
        assert_relative_eq!(f.min_value(), -8.0);
    }

    #[test]
    fn test_affine_rounds_once() {
        let f = FixedFormat::new(16, 2).unwrap();
        let quarter = f.quantize(0.25);
        let half = f.quantize(0.5);
        // 0.25 * 0.5 + 0.25 * 0.5 = 0.25 exactly; rounding each product
        // separately would give 0.0
        let value = f.affine(f.zero(), [(quarter, half), (quarter, half)]);
        assert_relative_eq!(f.to_f64(value), 0.25);
    }

    #[test]
    fn test_affine_wraps_result() {
        let f = FixedFormat::new(8, 4).unwrap();
        let seven = f.quantize(7.0);
        let one = f.quantize(1.0);
        let value = f.affine(seven, [(one, one)]);
        assert_relative_eq!(f.to_f64(value), -8.0);
    }

    #[test]
    fn test_label() {
        assert_eq!(q25_13().label(), "fixed<25,13>");
        assert_eq!(q25_13().int_bits(), 12);
    }

    proptest! {
        #[test]
        fn quantize_error_below_resolution(x in -2000.0_f64..2000.0_f64) {
            let f = q25_13();
            let q = f.to_f64(f.quantize(x));
            prop_assert!(q <= x);
            prop_assert!(x - q < f.resolution());
        }

        #[test]
        fn affine_matches_float_within_resolution(
            c in -10.0_f64..10.0,
            g in -4.0_f64..4.0,
            v in -50.0_f64..50.0,
        ) {
            let f = q25_13();
            let (cq, gq, vq) = (f.quantize(c), f.quantize(g), f.quantize(v));
            let exact = f.to_f64(cq) + f.to_f64(gq) * f.to_f64(vq);
            let got = f.to_f64(f.affine(cq, [(gq, vq)]));
            prop_assert!(got <= exact);
            prop_assert!(exact - got < f.resolution());
        }
    }
}

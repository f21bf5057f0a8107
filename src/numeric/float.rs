//! Double-precision reference arithmetic.

use super::Arithmetic;

/// IEEE-754 double precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Float64;

impl Arithmetic for Float64 {
    type Value = f64;

    fn quantize(&self, x: f64) -> f64 {
        x
    }

    fn to_f64(&self, value: f64) -> f64 {
        value
    }

    fn zero(&self) -> f64 {
        0.0
    }

    fn affine<I>(&self, constant: f64, terms: I) -> f64
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        terms
            .into_iter()
            .fold(constant, |acc, (gain, operand)| acc + gain * operand)
    }

    fn is_positive(&self, value: f64) -> bool {
        value > 0.0
    }

    fn is_non_positive(&self, value: f64) -> bool {
        value <= 0.0
    }

    fn label(&self) -> String {
        "f64".to_string()
    }
}

//! Numeric configurations for the affine update engine.
//!
//! The engine never touches numbers directly. Every coefficient, state and
//! input value lives in the representation chosen by an [`Arithmetic`]
//! implementation:
//!
//! - [`Float64`] - IEEE double precision, the reference configuration
//! - [`FixedFormat`] - signed fractional fixed point with configurable
//!   width, the hardware configuration
//!
//! Running the same model with both configurations is what the
//! [`harness`](crate::harness) compares.

mod fixed;
mod float;

use crate::error::Result;

pub use fixed::{Fixed, FixedFormat};
pub use float::Float64;

/// A numeric representation usable by the affine update engine.
pub trait Arithmetic {
    /// The stored value type.
    type Value: Copy + PartialEq + std::fmt::Debug;

    /// Convert an f64 into this representation.
    fn quantize(&self, x: f64) -> Self::Value;

    /// Convert a value back to f64 for reporting.
    fn to_f64(&self, value: Self::Value) -> f64;

    /// Zero in this representation.
    fn zero(&self) -> Self::Value;

    /// Evaluate `constant + sum(gain * operand)` and round the result once
    /// into this representation.
    fn affine<I>(&self, constant: Self::Value, terms: I) -> Self::Value
    where
        I: IntoIterator<Item = (Self::Value, Self::Value)>;

    /// Strictly greater than zero.
    fn is_positive(&self, value: Self::Value) -> bool;

    /// Less than or equal to zero.
    fn is_non_positive(&self, value: Self::Value) -> bool;

    /// Short label used in log output.
    fn label(&self) -> String;

    /// Reject configurations that cannot represent values.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

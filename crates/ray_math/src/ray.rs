//! Ray-scaled (1e27) arithmetic
//!
//! All premium rates, utilization rates and accounting indices are ray
//! fixed-point. Multiplication and division round half-up at the last
//! decimal; callers that need a different rounding (tick-duration ceil)
//! reach for the `wide` variants directly.

use crate::wide::{mul_div_floor, mul_div_half_up};

/// Fixed-point scale for rates and indices.
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Half the ray scale, the half-up rounding bias.
pub const HALF_RAY: u128 = RAY / 2;

/// Arithmetic failures. Overflow is a defect in caller inputs, never
/// silently absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    Overflow,
    DivisionByZero,
}

/// Ray-multiply: `a * b / RAY`, half-up.
pub fn ray_mul(a: u128, b: u128) -> Result<u128, MathError> {
    mul_div_half_up(a, b, RAY)
}

/// Ray-divide: `a * RAY / b`, half-up.
pub fn ray_div(a: u128, b: u128) -> Result<u128, MathError> {
    mul_div_half_up(a, RAY, b)
}

/// Ray-multiply rounded toward zero.
pub fn ray_mul_floor(a: u128, b: u128) -> Result<u128, MathError> {
    mul_div_floor(a, b, RAY)
}

/// Checked u128 addition.
pub fn checked_add(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// Checked u128 subtraction.
pub fn checked_sub(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::Overflow)
}

/// Minimum of two u128
pub fn min_u128(a: u128, b: u128) -> u128 {
    if a < b { a } else { b }
}

/// Maximum of two u128
pub fn max_u128(a: u128, b: u128) -> u128 {
    if a > b { a } else { b }
}

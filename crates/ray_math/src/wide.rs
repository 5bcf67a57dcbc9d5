//! 256-bit-intermediate multiply/divide on u128 operands
//!
//! Rate and index math multiplies two ray-scaled u128 values, which
//! overflows u128 long before it overflows the quantities we care about.
//! The product is carried as four 64-bit limbs and divided back down with
//! restoring long division, so `a * b / d` is exact for any operands whose
//! quotient fits in u128.

use crate::ray::MathError;

const MASK64: u128 = (1u128 << 64) - 1;

/// Full 256-bit product of two u128 values as (hi, lo) halves.
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & MASK64);
    let (b_hi, b_lo) = (b >> 64, b & MASK64);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // Middle column: sum of three 64-bit limbs, fits u128
    let mid = (ll >> 64) + (lh & MASK64) + (hl & MASK64);

    let lo = (mid << 64) | (ll & MASK64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Add a u128 into a 256-bit (hi, lo) value.
fn add_wide(hi: u128, lo: u128, add: u128) -> (u128, u128) {
    let (lo, carry) = lo.overflowing_add(add);
    (hi + carry as u128, lo)
}

/// Divide a 256-bit (hi, lo) value by `d`, returning (quotient, remainder).
///
/// Caller must guarantee `d > 0` and `hi < d` so the quotient fits u128.
fn div_wide(hi: u128, lo: u128, d: u128) -> (u128, u128) {
    debug_assert!(d > 0);
    debug_assert!(hi < d);

    let mut rem = hi;
    let mut quot = 0u128;
    let mut i = 128u32;
    while i > 0 {
        i -= 1;
        let bit = (lo >> i) & 1;
        // rem = rem * 2 + bit, tracking the virtual 129th bit
        let overflow = rem >> 127;
        rem = (rem << 1) | bit;
        if overflow == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1u128 << i;
        }
    }
    (quot, rem)
}

/// `a * b / d` rounded toward zero.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = mul_wide(a, b);
    if hi >= d {
        return Err(MathError::Overflow);
    }
    Ok(div_wide(hi, lo, d).0)
}

/// `a * b / d` rounded away from zero.
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = mul_wide(a, b);
    if hi >= d {
        return Err(MathError::Overflow);
    }
    let (quot, rem) = div_wide(hi, lo, d);
    if rem == 0 {
        Ok(quot)
    } else {
        quot.checked_add(1).ok_or(MathError::Overflow)
    }
}

/// `a * b / d` rounded half-up at the last decimal.
pub fn mul_div_half_up(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = mul_wide(a, b);
    let (hi, lo) = add_wide(hi, lo, d / 2);
    if hi >= d {
        return Err(MathError::Overflow);
    }
    Ok(div_wide(hi, lo, d).0)
}

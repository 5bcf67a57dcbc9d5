//! Utilization-based premium rate curve

use parasol_common::ParasolError;
use ray_math::{checked_add, min_u128, ray_div, ray_mul, RAY};

/// Interest-rate style premium formula, all parameters ray-scaled.
///
/// Below `u_optimal` the rate climbs linearly from `r0` to `r0 + r_slope1`.
/// Above it the second slope kicks in, reaching `r0 + r_slope1 + r_slope2`
/// at 100% utilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolFormula {
    /// Target utilization, (0, RAY]
    pub u_optimal: u128,
    /// Base rate at zero utilization
    pub r0: u128,
    /// Slope applied below u_optimal
    pub r_slope1: u128,
    /// Slope applied above u_optimal
    pub r_slope2: u128,
}

impl PoolFormula {
    /// Reject formulas that can never price a cover.
    pub fn validate(&self) -> Result<(), ParasolError> {
        if self.u_optimal == 0 || self.u_optimal > RAY {
            return Err(ParasolError::InvalidFormula);
        }
        let sum = checked_add(self.r0, self.r_slope1)
            .and_then(|s| checked_add(s, self.r_slope2))
            .map_err(ParasolError::from)?;
        if sum == 0 {
            return Err(ParasolError::InvalidFormula);
        }
        Ok(())
    }

    /// Premium rate for a given utilization (ray in, ray out).
    pub fn premium_rate(&self, utilization: u128) -> Result<u128, ParasolError> {
        let u = min_u128(utilization, RAY);
        if u < self.u_optimal {
            let scaled = ray_mul(self.r_slope1, ray_div(u, self.u_optimal)?)?;
            return Ok(checked_add(self.r0, scaled)?);
        }
        let base = checked_add(self.r0, self.r_slope1)?;
        let span = RAY - self.u_optimal;
        if span == 0 {
            // u_optimal == RAY: the second slope has no room to act
            return Ok(base);
        }
        let scaled = ray_mul(self.r_slope2, ray_div(u - self.u_optimal, span)?)?;
        Ok(checked_add(base, scaled)?)
    }
}

/// Covered capital over total liquidity, capped at 100%.
///
/// An empty pool reports zero utilization even while covers are still
/// outstanding (compensation can drain liquidity under live covers);
/// accrual then stops until capital returns.
pub fn utilization(covered_capital: u128, total_liquidity: u128) -> Result<u128, ParasolError> {
    if total_liquidity == 0 {
        return Ok(0);
    }
    let u = ray_div(covered_capital, total_liquidity)?;
    Ok(min_u128(u, RAY))
}

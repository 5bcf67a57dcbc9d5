//! Shared interest settlement for position instructions

use alloc::vec::Vec;

use parasol_common::ParasolError;
use ray_math::{checked_add, checked_sub, min_u128, ray_mul};

use crate::state::{Position, Realization, Registry, VirtualPool};

/// Where the interest realized by a settlement went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettleOutcome {
    /// Net interest paid out to the position owner
    pub owner_payout: u128,
    /// Net interest diverted to the treasury instead of the owner
    pub treasury_payout: u128,
    /// Protocol fee on gross rewards, accrued to the treasury
    pub protocol_fees: u128,
    /// Extra fee on leveraged positions, accrued to the risk wallet
    pub leverage_fee: u128,
}

/// Refresh a pool and fail if expired covers were left unprocessed.
///
/// User-facing mutations must observe a fully caught-up pool, otherwise
/// premium rates and capacity would be computed against stale covers.
pub fn refresh_fully(
    pool: &mut VirtualPool,
    max_crossings: u32,
    now: u64,
) -> Result<(), ParasolError> {
    if pool.refresh(now, max_crossings)? {
        Ok(())
    } else {
        Err(ParasolError::TooManyExpiredCovers)
    }
}

/// Realize a position's accrued interest and route it.
///
/// Pools must already be refreshed and match the position's snapshot order.
/// Each pool takes its protocol fee on the rewards it produced; leveraged
/// positions then pay the leverage fee on gross rewards once per pool beyond
/// the first. The remainder goes to the owner, or to the treasury when
/// `divert_to_treasury` is set (interest earned between a withdrawal
/// commitment and its execution belongs to the protocol).
pub fn settle_interest(
    registry: &mut Registry,
    position: &Position,
    pools: &mut [&mut VirtualPool],
    divert_to_treasury: bool,
) -> Result<(Realization, SettleOutcome), ParasolError> {
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    let realized = position.realize(&views)?;

    let mut protocol_fees = 0u128;
    let mut net = 0u128;
    for (i, pool) in pools.iter().enumerate() {
        let fee_cover = ray_mul(realized.cover_rewards[i], pool.fee_rate)?;
        let fee_strategy = ray_mul(realized.strategy_rewards[i], pool.fee_rate)?;
        protocol_fees = checked_add(protocol_fees, checked_add(fee_cover, fee_strategy)?)?;
        net = checked_add(net, checked_sub(realized.cover_rewards[i], fee_cover)?)?;
        net = checked_add(net, checked_sub(realized.strategy_rewards[i], fee_strategy)?)?;
    }

    let mut leverage_fee = 0u128;
    if pools.len() > 1 {
        let gross = checked_add(
            realized.gross_cover_rewards()?,
            realized.gross_strategy_rewards()?,
        )?;
        let per_extra = ray_mul(gross, registry.config.leverage_fee_rate)?;
        let extra_pools = (pools.len() - 1) as u128;
        leverage_fee = per_extra
            .checked_mul(extra_pools)
            .ok_or(ParasolError::Overflow)?;
        leverage_fee = min_u128(leverage_fee, net);
    }
    let payout = checked_sub(net, leverage_fee)?;

    registry.accrue_treasury(protocol_fees)?;
    registry.accrue_risk(leverage_fee)?;

    let mut outcome = SettleOutcome {
        protocol_fees,
        leverage_fee,
        ..SettleOutcome::default()
    };
    if divert_to_treasury {
        registry.accrue_treasury(payout)?;
        outcome.treasury_payout = payout;
    } else {
        outcome.owner_payout = payout;
    }
    Ok((realized, outcome))
}

/// Re-point the overlap matrix after a position's stored capital changed.
///
/// `overlaps[a][b]` holds the stored capital of positions backing both `a`
/// and `b`, so every ordered pair among the position's pools moves by the
/// same delta.
pub fn adjust_overlaps(
    pools: &mut [&mut VirtualPool],
    old_stored: u128,
    new_stored: u128,
) -> Result<(), ParasolError> {
    if pools.len() < 2 || old_stored == new_stored {
        return Ok(());
    }
    let ids: Vec<u64> = pools.iter().map(|p| p.pool_id).collect();
    for i in 0..pools.len() {
        for (j, id) in ids.iter().enumerate() {
            if i == j {
                continue;
            }
            if new_stored > old_stored {
                pools[i].add_overlap(*id, new_stored - old_stored)?;
            } else {
                pools[i].sub_overlap(*id, old_stored - new_stored);
            }
        }
    }
    Ok(())
}

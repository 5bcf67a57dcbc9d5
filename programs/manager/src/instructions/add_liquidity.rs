//! AddLiquidity instruction - grow an existing position

use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::{adjust_overlaps, refresh_fully, settle_interest, SettleOutcome};
use crate::state::{Position, Registry, VirtualPool};

/// Add capital to a position, realizing accrued interest first.
///
/// Adding while a withdrawal is committed cancels the commitment; the
/// interest earned under it still goes to the treasury.
pub fn process_add_liquidity(
    registry: &mut Registry,
    position: &mut Position,
    pools: &mut [&mut VirtualPool],
    caller: &Pubkey,
    amount: u128,
    now: u64,
) -> Result<SettleOutcome, ParasolError> {
    if *caller != position.owner {
        return Err(ParasolError::OnlyPositionOwner);
    }
    if amount == 0 {
        return Err(ParasolError::BadAmount);
    }
    for pool in pools.iter_mut() {
        if pool.paused {
            return Err(ParasolError::PoolIsPaused);
        }
        refresh_fully(pool, registry.config.max_crossings, now)?;
    }
    let divert = position.is_committed();
    let (realized, outcome) = settle_interest(registry, position, pools, divert)?;
    let new_supplied = realized
        .new_user_capital
        .checked_add(amount)
        .ok_or(ParasolError::Overflow)?;
    for pool in pools.iter_mut() {
        pool.deposit(amount)?;
    }
    adjust_overlaps(pools, position.supplied, new_supplied)?;
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    position.rebase(new_supplied, &views);
    position.commit_timestamp = 0;
    Ok(outcome)
}

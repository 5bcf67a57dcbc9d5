//! RemoveLiquidity instruction - withdraw committed capital

use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::{adjust_overlaps, refresh_fully, settle_interest, SettleOutcome};
use crate::state::{Position, Registry, VirtualPool};

/// Withdraw `amount` from a committed position.
///
/// Requires the withdrawal delay to have elapsed; exactly at the boundary
/// counts. The amount is checked against the claim-adjusted capital, and
/// every pool must retain enough liquidity for its live covers or the
/// whole withdrawal fails. Interest earned since the commitment goes to
/// the treasury, and the commitment is consumed.
pub fn process_remove_liquidity(
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
    if !position.is_committed() {
        return Err(ParasolError::PositionNotCommitted);
    }
    let unlock = position
        .commit_timestamp
        .checked_add(registry.config.withdraw_delay)
        .ok_or(ParasolError::Overflow)?;
    if now < unlock {
        return Err(ParasolError::WithdrawCommitDelayNotReached);
    }
    for pool in pools.iter_mut() {
        if pool.paused {
            return Err(ParasolError::PoolIsPaused);
        }
        refresh_fully(pool, registry.config.max_crossings, now)?;
    }
    let (realized, outcome) = settle_interest(registry, position, pools, true)?;
    if amount == 0 || amount > realized.new_user_capital {
        return Err(ParasolError::BadAmount);
    }
    for pool in pools.iter_mut() {
        pool.withdraw(amount)?;
    }
    let new_supplied = realized.new_user_capital - amount;
    adjust_overlaps(pools, position.supplied, new_supplied)?;
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    position.rebase(new_supplied, &views);
    position.commit_timestamp = 0;
    Ok(outcome)
}

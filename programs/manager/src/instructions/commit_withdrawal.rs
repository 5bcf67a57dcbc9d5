//! Commit and uncommit instructions for the withdrawal delay

use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::{adjust_overlaps, refresh_fully, settle_interest, SettleOutcome};
use crate::state::{Position, Registry, VirtualPool};

/// Stamp a withdrawal commitment, starting the delay clock.
///
/// Interest accrued up to this point is paid to the owner; whatever
/// accrues after it belongs to the treasury until the withdrawal executes
/// or the commitment is cancelled. Re-committing restarts the clock.
pub fn process_commit_remove_liquidity(
    registry: &mut Registry,
    position: &mut Position,
    pools: &mut [&mut VirtualPool],
    caller: &Pubkey,
    now: u64,
) -> Result<SettleOutcome, ParasolError> {
    if *caller != position.owner {
        return Err(ParasolError::OnlyPositionOwner);
    }
    for pool in pools.iter_mut() {
        refresh_fully(pool, registry.config.max_crossings, now)?;
    }
    let (realized, outcome) = settle_interest(registry, position, pools, false)?;
    adjust_overlaps(pools, position.supplied, realized.new_user_capital)?;
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    position.rebase(realized.new_user_capital, &views);
    position.commit_timestamp = now;
    Ok(outcome)
}

/// Cancel a pending withdrawal commitment.
///
/// The interest earned while committed is settled to the treasury, then
/// normal accrual to the owner resumes.
pub fn process_uncommit_remove_liquidity(
    registry: &mut Registry,
    position: &mut Position,
    pools: &mut [&mut VirtualPool],
    caller: &Pubkey,
    now: u64,
) -> Result<SettleOutcome, ParasolError> {
    if *caller != position.owner {
        return Err(ParasolError::OnlyPositionOwner);
    }
    if !position.is_committed() {
        return Err(ParasolError::PositionNotCommitted);
    }
    for pool in pools.iter_mut() {
        refresh_fully(pool, registry.config.max_crossings, now)?;
    }
    let (realized, outcome) = settle_interest(registry, position, pools, true)?;
    adjust_overlaps(pools, position.supplied, realized.new_user_capital)?;
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    position.rebase(realized.new_user_capital, &views);
    position.commit_timestamp = 0;
    Ok(outcome)
}

//! TakeInterest instruction - realize accrued interest

use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::{adjust_overlaps, refresh_fully, settle_interest, SettleOutcome};
use crate::state::{Position, Registry, VirtualPool};

/// Pay out a position's accrued interest without moving capital.
///
/// Works on paused pools; only the reward bookkeeping moves. A pending
/// withdrawal commitment stays in place, but interest realized under it
/// goes to the treasury.
pub fn process_take_interest(
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
    let divert = position.is_committed();
    let (realized, outcome) = settle_interest(registry, position, pools, divert)?;
    adjust_overlaps(pools, position.supplied, realized.new_user_capital)?;
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    position.rebase(realized.new_user_capital, &views);
    Ok(outcome)
}

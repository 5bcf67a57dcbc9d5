//! RegisterCompensation instruction - burn pool capital for a claim

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::refresh_fully;
use crate::state::{Registry, VirtualPool};

/// Pay a resolved claim out of the pool, haircutting every LP.
///
/// Only the claim manager may call this, and pausing a pool does not block
/// it. The pool is refreshed first so the haircut lands on the liquidity
/// that was actually at risk when the claim settles.
pub fn process_register_compensation(
    registry: &Registry,
    pool: &mut VirtualPool,
    caller: &Pubkey,
    claim_id: u64,
    amount: u128,
    now: u64,
) -> Result<(), ParasolError> {
    if *caller != registry.claim_manager {
        return Err(ParasolError::Unauthorized);
    }
    refresh_fully(pool, registry.config.max_crossings, now)?;
    pool.register_compensation(claim_id, amount)
}

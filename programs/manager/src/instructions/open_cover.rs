//! OpenCover instruction - buy cover against a pool

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::refresh_fully;
use crate::state::{Registry, VirtualPool};

/// Open a cover and return its allocated id.
///
/// The pool is caught up to `now` first so the quoted premium rate and the
/// remaining capacity reflect every expiry that already happened.
pub fn process_open_cover(
    registry: &mut Registry,
    pool: &mut VirtualPool,
    owner: Pubkey,
    amount: u128,
    premium_budget: u128,
    now: u64,
) -> Result<u64, ParasolError> {
    if pool.paused {
        return Err(ParasolError::PoolIsPaused);
    }
    refresh_fully(pool, registry.config.max_crossings, now)?;
    let cover_id = registry.next_cover_id;
    pool.open_cover(cover_id, owner, amount, premium_budget, now)?;
    let assigned = registry.allocate_cover_id();
    debug_assert_eq!(assigned, cover_id);
    Ok(cover_id)
}

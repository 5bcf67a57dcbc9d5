//! CloseCover instruction - terminate a cover early

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::refresh_fully;
use crate::state::{ManagerConfig, VirtualPool};

/// Close a live cover and return the unspent premium to refund.
pub fn process_close_cover(
    config: &ManagerConfig,
    pool: &mut VirtualPool,
    caller: &Pubkey,
    cover_id: u64,
    now: u64,
) -> Result<u128, ParasolError> {
    if pool.paused {
        return Err(ParasolError::PoolIsPaused);
    }
    refresh_fully(pool, config.max_crossings, now)?;
    pool.close_cover(cover_id, caller, now)
}

//! UpdateCover instruction - resize a cover or its premium budget

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::refresh_fully;
use crate::state::{CoverChange, ManagerConfig, VirtualPool};

/// Apply an amount or premium change to a live cover.
///
/// Add and remove are mutually exclusive per leg; draining either the
/// amount or the budget to zero closes the cover and refunds the rest.
#[allow(clippy::too_many_arguments)]
pub fn process_update_cover(
    config: &ManagerConfig,
    pool: &mut VirtualPool,
    caller: &Pubkey,
    cover_id: u64,
    amount_to_add: u128,
    amount_to_remove: u128,
    premium_to_add: u128,
    premium_to_remove: u128,
    now: u64,
) -> Result<CoverChange, ParasolError> {
    if pool.paused {
        return Err(ParasolError::PoolIsPaused);
    }
    refresh_fully(pool, config.max_crossings, now)?;
    pool.update_cover(
        cover_id,
        caller,
        amount_to_add,
        amount_to_remove,
        premium_to_add,
        premium_to_remove,
        now,
    )
}

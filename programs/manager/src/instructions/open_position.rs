//! OpenPosition instruction - stake capital across pools

use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::settle::{adjust_overlaps, refresh_fully};
use crate::state::{validate_pool_ids, Position, Registry, VirtualPool};

/// Open a leveraged position supplying `amount` into every listed pool.
///
/// Pools must come in ascending id order and be pairwise compatible in
/// both directions. The same capital backs all of them, which the overlap
/// matrix records pair by pair.
pub fn process_open_position(
    registry: &mut Registry,
    pools: &mut [&mut VirtualPool],
    owner: Pubkey,
    amount: u128,
    wrapped: bool,
    now: u64,
) -> Result<Position, ParasolError> {
    if amount == 0 {
        return Err(ParasolError::BadAmount);
    }
    let ids: Vec<u64> = pools.iter().map(|p| p.pool_id).collect();
    validate_pool_ids(&ids, registry.config.max_leverage)?;
    for i in 0..pools.len() {
        for j in (i + 1)..pools.len() {
            if !pools[i].is_compatible_with(ids[j]) || !pools[j].is_compatible_with(ids[i]) {
                return Err(ParasolError::IncompatiblePools);
            }
        }
    }
    for pool in pools.iter_mut() {
        if pool.paused {
            return Err(ParasolError::PoolIsPaused);
        }
        refresh_fully(pool, registry.config.max_crossings, now)?;
    }
    for pool in pools.iter_mut() {
        pool.deposit(amount)?;
    }
    adjust_overlaps(pools, 0, amount)?;
    let views: Vec<&VirtualPool> = pools.iter().map(|p| &**p).collect();
    let position_id = registry.allocate_position_id();
    Ok(Position::new(position_id, owner, amount, wrapped, &views, now))
}

//! CreatePool instruction - register a new virtual pool

use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use crate::state::{PoolFormula, Registry, VirtualPool};

/// Pool creation parameters, parsed from instruction data.
#[derive(Debug, Clone)]
pub struct CreatePoolArgs {
    pub payment_asset: Pubkey,
    pub strategy_id: u64,
    pub fee_rate: u128,
    pub formula: PoolFormula,
    pub compatible_pools: Vec<u64>,
}

/// Create a pool under a fresh id and wire its compatibility both ways.
///
/// `compat` must hold the pools named in `args.compatible_pools`, in the
/// same order. Every named pool gains the new id in its own list so the
/// compatibility relation stays symmetric.
pub fn process_create_pool(
    registry: &mut Registry,
    pool_key: Pubkey,
    compat: &mut [&mut VirtualPool],
    args: CreatePoolArgs,
    now: u64,
) -> Result<VirtualPool, ParasolError> {
    if compat.len() != args.compatible_pools.len() {
        return Err(ParasolError::AccountMismatch);
    }
    let pool_id = registry.next_pool_id;
    for (have, want) in compat.iter().zip(args.compatible_pools.iter()) {
        if have.pool_id != *want {
            return Err(ParasolError::AccountMismatch);
        }
        if *want >= pool_id {
            return Err(ParasolError::PoolNotFound);
        }
    }
    let pool = VirtualPool::new(
        pool_id,
        args.payment_asset,
        args.strategy_id,
        args.fee_rate,
        args.formula,
        args.compatible_pools,
        now,
    )?;
    let assigned = registry.register_pool(pool_key);
    debug_assert_eq!(assigned, pool_id);
    for have in compat.iter_mut() {
        have.add_compatible(pool_id);
    }
    Ok(pool)
}

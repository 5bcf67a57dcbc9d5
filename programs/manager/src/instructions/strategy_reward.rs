//! PushStrategyReward instruction - credit external yield to a pool

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use crate::state::{Registry, VirtualPool};

/// Distribute strategy yield to the pool's LPs through the reward index.
///
/// Only the strategy manager may call this. The reward sits outside the
/// pool's own asset, so total liquidity is untouched and no refresh is
/// needed.
pub fn process_push_strategy_reward(
    registry: &Registry,
    pool: &mut VirtualPool,
    caller: &Pubkey,
    amount: u128,
) -> Result<(), ParasolError> {
    if *caller != registry.strategy_manager {
        return Err(ParasolError::Unauthorized);
    }
    pool.push_strategy_reward(amount)
}

//! Shared fixtures for the scenario tests.
//!
//! Every scenario starts from the same registry and pool shape so the
//! numbers in the assertions stay comparable across files: a 4% base rate
//! that doubles at the 50% kink, a 14 day withdrawal delay, and pool
//! accounts keyed by their id byte.

use parasol_manager::{
    process_create_pool, process_initialize, process_open_position, CreatePoolArgs,
    ManagerConfig, PoolFormula, Position, Registry, VirtualPool,
};
use ray_math::RAY;

pub type Pubkey = [u8; 32];

/// Base timestamp for every scenario.
pub const T0: u64 = 1_700_000_000;

pub const GOVERNANCE: Pubkey = [1; 32];
pub const CLAIM_MANAGER: Pubkey = [2; 32];
pub const STRATEGY_MANAGER: Pubkey = [3; 32];
pub const PAYMENT_ASSET: Pubkey = [4; 32];
pub const BUYER: Pubkey = [7; 32];
pub const LP: Pubkey = [9; 32];

/// `n` percent in ray.
pub fn pct(n: u128) -> u128 {
    RAY / 100 * n
}

/// 4% base rate, 8% at the 50% kink, 100% at full utilization.
pub fn default_formula() -> PoolFormula {
    PoolFormula {
        u_optimal: pct(50),
        r0: pct(4),
        r_slope1: pct(4),
        r_slope2: pct(92),
    }
}

pub fn default_config() -> ManagerConfig {
    ManagerConfig {
        withdraw_delay: 14 * 86_400,
        max_leverage: 4,
        leverage_fee_rate: 0,
        max_crossings: 16,
    }
}

pub fn new_registry() -> Registry {
    process_initialize(GOVERNANCE, CLAIM_MANAGER, STRATEGY_MANAGER, default_config())
        .expect("default config is valid")
}

/// Deterministic stand-in for a pool account address.
pub fn pool_key(tag: u8) -> Pubkey {
    [tag; 32]
}

/// Create a standalone pool with no protocol fee.
pub fn new_pool(registry: &mut Registry) -> VirtualPool {
    new_pool_with_fee(registry, 0)
}

pub fn new_pool_with_fee(registry: &mut Registry, fee_rate: u128) -> VirtualPool {
    let tag = registry.next_pool_id as u8;
    let args = CreatePoolArgs {
        payment_asset: PAYMENT_ASSET,
        strategy_id: 0,
        fee_rate,
        formula: default_formula(),
        compatible_pools: Vec::new(),
    };
    process_create_pool(registry, pool_key(tag), &mut [], args, T0)
        .expect("pool creation with no compat list")
}

/// Create a pool compatible with the given earlier pools, wiring both sides.
pub fn new_compatible_pool(
    registry: &mut Registry,
    others: &mut [&mut VirtualPool],
) -> VirtualPool {
    let tag = registry.next_pool_id as u8;
    let ids: Vec<u64> = others.iter().map(|p| p.pool_id).collect();
    let args = CreatePoolArgs {
        payment_asset: PAYMENT_ASSET,
        strategy_id: 0,
        fee_rate: 0,
        formula: default_formula(),
        compatible_pools: ids,
    };
    process_create_pool(registry, pool_key(tag), others, args, T0)
        .expect("compat list matches the passed pools")
}

/// Open a single-pool position for `LP` at the scenario base time.
pub fn seed_position(
    registry: &mut Registry,
    pool: &mut VirtualPool,
    amount: u128,
) -> Position {
    process_open_position(registry, &mut [pool], LP, amount, false, T0)
        .expect("fresh pool accepts a deposit")
}

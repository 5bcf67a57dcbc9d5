//! Compensation, leveraged positions, strategy rewards, and governance.
//!
//! Claims burn pool capital through the claim index so every LP carries a
//! proportional share of the loss, including LPs leveraged across several
//! pools, whose haircuts compound.

use parasol_common::ParasolError;
use parasol_integration_tests::*;
use parasol_manager::{
    process_add_liquidity, process_close_cover, process_commit_remove_liquidity,
    process_open_cover, process_open_position, process_purge_expired,
    process_push_strategy_reward, process_register_compensation, process_remove_liquidity,
    process_set_pool_paused, process_take_interest, process_uncommit_remove_liquidity,
    process_update_config, process_update_cover, ManagerConfig,
};
use ray_math::RAY;

#[test]
fn compensation_haircuts_every_lp() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(600_000).unwrap();
    let mut position = seed_position(&mut registry, &mut pool, 400_000);

    let err =
        process_register_compensation(&registry, &mut pool, &GOVERNANCE, 7, 250_000, T0);
    assert_eq!(err, Err(ParasolError::Unauthorized));
    let err =
        process_register_compensation(&registry, &mut pool, &CLAIM_MANAGER, 7, 0, T0);
    assert_eq!(err, Err(ParasolError::BadAmount));
    let err = process_register_compensation(
        &registry,
        &mut pool,
        &CLAIM_MANAGER,
        7,
        1_000_001,
        T0,
    );
    assert_eq!(err, Err(ParasolError::BadAmount));

    // Paying out a quarter of the pool discounts everyone by a quarter.
    process_register_compensation(&registry, &mut pool, &CLAIM_MANAGER, 7, 250_000, T0)
        .unwrap();
    assert_eq!(pool.claim_index, pct(75));
    assert_eq!(pool.total_liquidity, 750_000);
    assert_eq!(pool.compensation_ids, vec![7]);

    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 0);
    assert_eq!(position.supplied, 300_000);
}

#[test]
fn claims_may_exceed_free_capital() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    seed_position(&mut registry, &mut pool, 400_000);
    process_open_cover(&mut registry, &mut pool, BUYER, 300_000, 10_000, T0).unwrap();

    // A claim is bounded by the pool, not by what covers leave free: the
    // pool may end up thinner than its live covers.
    process_register_compensation(&registry, &mut pool, &CLAIM_MANAGER, 1, 380_000, T0)
        .unwrap();
    assert_eq!(pool.total_liquidity, 20_000);
    assert_eq!(pool.claim_index, pct(5));
    assert_eq!(pool.slot0.covered_capital, 300_000);
    assert_eq!(pool.utilization_now().unwrap(), RAY);
}

#[test]
fn claims_on_leveraged_pools_compound() {
    let mut registry = new_registry();
    let mut a = new_pool(&mut registry);
    let mut b = new_compatible_pool(&mut registry, &mut [&mut a]);
    let mut position = process_open_position(
        &mut registry,
        &mut [&mut a, &mut b],
        LP,
        800_000,
        false,
        T0,
    )
    .unwrap();
    assert_eq!(a.overlaps.get(&b.pool_id), Some(&800_000));
    assert_eq!(b.overlaps.get(&a.pool_id), Some(&800_000));

    process_register_compensation(&registry, &mut a, &CLAIM_MANAGER, 11, 400_000, T0)
        .unwrap();
    process_register_compensation(&registry, &mut b, &CLAIM_MANAGER, 12, 200_000, T0)
        .unwrap();
    assert_eq!(a.claim_index, pct(50));
    assert_eq!(b.claim_index, pct(75));

    // The one capital stake absorbs both pools' losses in sequence:
    // 800k halved by pool a, then cut a further quarter by pool b.
    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut a, &mut b],
        &LP,
        T0,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 0);
    assert_eq!(position.supplied, 300_000);
    assert_eq!(a.overlaps.get(&b.pool_id), Some(&300_000));
    assert_eq!(b.overlaps.get(&a.pool_id), Some(&300_000));

    // Each pool's own ledger only carries its own burn.
    assert_eq!(a.total_liquidity, 400_000);
    assert_eq!(b.total_liquidity, 600_000);
}

#[test]
fn leverage_fee_skims_multi_pool_interest() {
    let mut registry = new_registry();
    let mut a = new_pool_with_fee(&mut registry, pct(10));
    let mut b = new_compatible_pool(&mut registry, &mut [&mut a]);
    let mut position = process_open_position(
        &mut registry,
        &mut [&mut a, &mut b],
        LP,
        400_000,
        false,
        T0,
    )
    .unwrap();

    let config = ManagerConfig {
        leverage_fee_rate: pct(5),
        ..default_config()
    };
    process_update_config(&mut registry, &GOVERNANCE, config).unwrap();

    // Stand in for accrued premiums on both pools.
    a.liquidity_index = pct(110);
    b.liquidity_index = pct(105);

    // Gross interest is 40k + 20k. Pool a takes its 10% cut of its own
    // 40k, and one extra pool's worth of 5% leverage fee comes off the
    // rest.
    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut a, &mut b],
        &LP,
        T0,
    )
    .unwrap();
    assert_eq!(outcome.protocol_fees, 4_000);
    assert_eq!(outcome.leverage_fee, 3_000);
    assert_eq!(outcome.owner_payout, 53_000);
    assert_eq!(outcome.treasury_payout, 0);
    assert_eq!(registry.treasury_accrued, 4_000);
    assert_eq!(registry.risk_accrued, 3_000);
}

#[test]
fn strategy_rewards_flow_through_the_index() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 1_000_000);

    let err = process_push_strategy_reward(&registry, &mut pool, &BUYER, 50_000);
    assert_eq!(err, Err(ParasolError::Unauthorized));
    let err = process_push_strategy_reward(&registry, &mut pool, &STRATEGY_MANAGER, 0);
    assert_eq!(err, Err(ParasolError::BadAmount));

    process_push_strategy_reward(&registry, &mut pool, &STRATEGY_MANAGER, 50_000).unwrap();
    assert_eq!(pool.strategy_reward_index, pct(105));

    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 50_000);
    assert_eq!(outcome.protocol_fees, 0);

    // A pool with no capital has no one to reward.
    let mut empty = new_pool(&mut registry);
    let err = process_push_strategy_reward(&registry, &mut empty, &STRATEGY_MANAGER, 1);
    assert_eq!(err, Err(ParasolError::BadAmount));
}

#[test]
fn pool_sets_must_be_clean_and_compatible() {
    let mut registry = new_registry();
    let mut a = new_pool(&mut registry);
    let mut b = new_compatible_pool(&mut registry, &mut [&mut a]);
    let mut c = new_pool(&mut registry);

    let err = process_open_position(
        &mut registry,
        &mut [&mut b, &mut a],
        LP,
        100_000,
        false,
        T0,
    );
    assert_eq!(err, Err(ParasolError::PoolIdsMustBeUniqueAndAscending));

    let mut a_again = a.clone();
    let err = process_open_position(
        &mut registry,
        &mut [&mut a, &mut a_again],
        LP,
        100_000,
        false,
        T0,
    );
    assert_eq!(err, Err(ParasolError::PoolIdsMustBeUniqueAndAscending));

    let err = process_open_position(
        &mut registry,
        &mut [&mut a, &mut c],
        LP,
        100_000,
        false,
        T0,
    );
    assert_eq!(err, Err(ParasolError::IncompatiblePools));

    let err = process_open_position(&mut registry, &mut [], LP, 100_000, false, T0);
    assert_eq!(err, Err(ParasolError::BadAmount));

    let config = ManagerConfig {
        max_leverage: 1,
        ..default_config()
    };
    process_update_config(&mut registry, &GOVERNANCE, config).unwrap();
    let err = process_open_position(
        &mut registry,
        &mut [&mut a, &mut b],
        LP,
        100_000,
        false,
        T0,
    );
    assert_eq!(err, Err(ParasolError::AmountOfPoolsIsAboveMaxLeverage));
}

#[test]
fn pause_freezes_the_market_but_not_obligations() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 400_000);
    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 100_000, 2_000, T0).unwrap();

    let err = process_set_pool_paused(&registry, &mut pool, &BUYER, true);
    assert_eq!(err, Err(ParasolError::Unauthorized));
    process_set_pool_paused(&registry, &mut pool, &GOVERNANCE, true).unwrap();
    assert!(pool.paused);

    // Market entry and exit are frozen.
    let err = process_open_cover(&mut registry, &mut pool, BUYER, 50_000, 1_000, T0);
    assert_eq!(err, Err(ParasolError::PoolIsPaused));
    let err = process_update_cover(
        &registry.config,
        &mut pool,
        &BUYER,
        cover_id,
        0,
        50_000,
        0,
        0,
        T0,
    );
    assert_eq!(err, Err(ParasolError::PoolIsPaused));
    let err = process_close_cover(&registry.config, &mut pool, &BUYER, cover_id, T0);
    assert_eq!(err, Err(ParasolError::PoolIsPaused));
    let err = process_open_position(&mut registry, &mut [&mut pool], BUYER, 1_000, false, T0);
    assert_eq!(err, Err(ParasolError::PoolIsPaused));
    let err = process_add_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        1_000,
        T0,
    );
    assert_eq!(err, Err(ParasolError::PoolIsPaused));

    // Commitments may be placed and canceled, but not executed.
    process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();
    let delay = registry.config.withdraw_delay;
    let err = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        100_000,
        T0 + delay,
    );
    assert_eq!(err, Err(ParasolError::PoolIsPaused));
    process_uncommit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + delay,
    )
    .unwrap();

    // The clock, claims, and strategy yield keep running.
    assert!(process_purge_expired(&registry.config, &mut pool, 0, T0 + delay).unwrap());
    process_register_compensation(
        &registry,
        &mut pool,
        &CLAIM_MANAGER,
        3,
        50_000,
        T0 + delay,
    )
    .unwrap();
    assert_eq!(pool.claim_index, RAY / 8 * 7);
    assert_eq!(pool.total_liquidity, 350_000);
    process_push_strategy_reward(&registry, &mut pool, &STRATEGY_MANAGER, 7_000).unwrap();
    assert_eq!(pool.strategy_reward_index, pct(102));
    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + delay,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 7_000);
    assert_eq!(position.supplied, 350_000);

    process_set_pool_paused(&registry, &mut pool, &GOVERNANCE, false).unwrap();
    process_open_cover(&mut registry, &mut pool, BUYER, 50_000, 1_000, T0 + delay)
        .unwrap();
}

#[test]
fn config_changes_take_effect_immediately() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 100_000);

    let quick = ManagerConfig {
        withdraw_delay: 3_600,
        ..default_config()
    };
    let err = process_update_config(&mut registry, &BUYER, quick);
    assert_eq!(err, Err(ParasolError::Unauthorized));

    let err = process_update_config(
        &mut registry,
        &GOVERNANCE,
        ManagerConfig {
            max_leverage: 0,
            ..quick
        },
    );
    assert_eq!(err, Err(ParasolError::BadAmount));
    let err = process_update_config(
        &mut registry,
        &GOVERNANCE,
        ManagerConfig {
            max_crossings: 0,
            ..quick
        },
    );
    assert_eq!(err, Err(ParasolError::BadAmount));
    let err = process_update_config(
        &mut registry,
        &GOVERNANCE,
        ManagerConfig {
            leverage_fee_rate: RAY + 1,
            ..quick
        },
    );
    assert_eq!(err, Err(ParasolError::BadAmount));

    process_update_config(&mut registry, &GOVERNANCE, quick).unwrap();
    assert_eq!(registry.config.withdraw_delay, 3_600);

    // The shorter delay applies to a commitment placed right away.
    process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();
    process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        100_000,
        T0 + 3_600,
    )
    .unwrap();
    assert_eq!(pool.total_liquidity, 0);
    assert_eq!(position.supplied, 0);
}

//! Cover lifecycle scenarios: pricing, repricing, refunds, and expiry.
//!
//! The recurring fixture is a 1m pool with a 500k cover: that sits the pool
//! exactly on its 50% kink, so the premium rate is 8%, one tick is 43_200
//! seconds, and a 40_000 budget buys exactly one year of protection.

use parasol_common::{ParasolError, PREMIUM_REMOVE_ALL, YEAR};
use parasol_integration_tests::*;
use parasol_manager::{
    process_close_cover, process_open_cover, process_purge_expired, process_take_interest,
    process_update_cover,
};

#[test]
fn premiums_paid_become_lp_interest() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 1_000_000);

    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();
    assert_eq!(cover_id, 1);
    assert_eq!(pool.premium_rate, pct(8));
    assert_eq!(pool.slot0.seconds_per_tick, 43_200);
    assert_eq!(pool.cover_info(cover_id).unwrap().premiums_left, 40_000);

    // Catch up to the expiry boundary in one pass. The whole year accrues
    // at 8% on half the pool, so the index lands on exactly 1.04.
    let done = process_purge_expired(&registry.config, &mut pool, 0, T0 + YEAR).unwrap();
    assert!(done);
    assert_eq!(pool.liquidity_index, pct(104));
    let info = pool.cover_info(cover_id).unwrap();
    assert!(!info.is_active);
    assert_eq!(info.premiums_left, 0);
    assert_eq!(pool.slot0.covered_capital, 0);
    assert_eq!(pool.slot0.remaining_covers, 0);

    // The full budget the buyer burned surfaces as interest to the sole LP.
    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + YEAR,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 40_000);
    assert_eq!(outcome.treasury_payout, 0);
    assert_eq!(outcome.protocol_fees, 0);
    assert_eq!(outcome.leverage_fee, 0);
    assert_eq!(registry.treasury_accrued, 0);
}

#[test]
fn expiry_fires_exactly_at_the_tick_boundary() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(1_000_000).unwrap();

    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    // One second short of the boundary the cover still stands.
    assert!(process_purge_expired(&registry.config, &mut pool, 0, T0 + YEAR - 1).unwrap());
    assert!(pool.cover_info(cover_id).unwrap().is_active);
    assert_eq!(pool.slot0.tick, 729);

    // At the boundary the crossing fires: the cover ends and its capital
    // frees up for new business.
    assert!(process_purge_expired(&registry.config, &mut pool, 0, T0 + YEAR).unwrap());
    assert!(!pool.cover_info(cover_id).unwrap().is_active);
    assert_eq!(pool.slot0.covered_capital, 0);
    assert_eq!(pool.premium_rate, pct(4));
    assert_eq!(pool.slot0.seconds_per_tick, 86_400);

    let next = process_open_cover(
        &mut registry,
        &mut pool,
        BUYER,
        1_000_000,
        100_000,
        T0 + YEAR,
    )
    .unwrap();
    assert_eq!(next, 2);
    assert_eq!(pool.slot0.covered_capital, 1_000_000);
}

#[test]
fn closing_refunds_unspent_premium() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 1_000_000);
    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    // Half the year gone, half the budget left.
    let half = T0 + YEAR / 2;
    let refund =
        process_close_cover(&registry.config, &mut pool, &BUYER, cover_id, half).unwrap();
    assert_eq!(refund, 20_000);
    assert!(!pool.cover_info(cover_id).unwrap().is_active);
    assert_eq!(pool.slot0.covered_capital, 0);
    assert_eq!(pool.premium_rate, pct(4));
    assert_eq!(pool.slot0.seconds_per_tick, 86_400);

    // The index stopped at 1.02, so burned premium and refund add back up
    // to the original budget.
    assert_eq!(pool.liquidity_index, pct(102));
    let outcome =
        process_take_interest(&mut registry, &mut position, &mut [&mut pool], &LP, half)
            .unwrap();
    assert_eq!(outcome.owner_payout, 20_000);
    assert_eq!(outcome.owner_payout + refund, 40_000);

    // Closing twice is a state conflict, not a second refund.
    let err = process_close_cover(&registry.config, &mut pool, &BUYER, cover_id, half);
    assert_eq!(err, Err(ParasolError::CoverIsExpired));
}

#[test]
fn shrinking_a_cover_reprices_its_duration() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(1_000_000).unwrap();
    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    // Halving the amount drops utilization to 25%, so the rate falls to 6%
    // and the untouched budget stretches over a longer run of slower ticks.
    let change = process_update_cover(
        &registry.config,
        &mut pool,
        &BUYER,
        cover_id,
        0,
        250_000,
        0,
        0,
        T0,
    )
    .unwrap();
    assert_eq!(change.refund, 0);
    assert!(!change.closed);
    assert_eq!(change.last_tick, 1460);
    assert_eq!(pool.premium_rate, pct(6));
    assert_eq!(pool.slot0.seconds_per_tick, 57_600);
    let info = pool.cover_info(cover_id).unwrap();
    assert_eq!(info.amount, 250_000);
    assert_eq!(info.premiums_left, 40_000);

    // Pulling the whole budget unwinds the cover and refunds everything.
    let change = process_update_cover(
        &registry.config,
        &mut pool,
        &BUYER,
        cover_id,
        0,
        0,
        0,
        PREMIUM_REMOVE_ALL,
        T0,
    )
    .unwrap();
    assert_eq!(change.refund, 40_000);
    assert!(change.closed);
    assert_eq!(pool.slot0.covered_capital, 0);
    assert_eq!(pool.premium_rate, pct(4));
    assert!(!pool.cover_info(cover_id).unwrap().is_active);
}

#[test]
fn only_the_cover_owner_may_touch_it() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(1_000_000).unwrap();
    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 200_000, 10_000, T0).unwrap();

    let err = process_close_cover(&registry.config, &mut pool, &LP, cover_id, T0);
    assert_eq!(err, Err(ParasolError::OnlyCoverOwner));
    let err = process_update_cover(
        &registry.config,
        &mut pool,
        &LP,
        cover_id,
        0,
        100_000,
        0,
        0,
        T0,
    );
    assert_eq!(err, Err(ParasolError::OnlyCoverOwner));
    assert!(pool.cover_info(cover_id).unwrap().is_active);

    let err = process_close_cover(&registry.config, &mut pool, &BUYER, 99, T0);
    assert_eq!(err, Err(ParasolError::CoverNotFound));
}

#[test]
fn purge_respects_the_crossing_cap() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(1_000_000).unwrap();

    // Three covers with staggered budgets land in three distinct expiry
    // ticks.
    for budget in [500, 1_000, 2_000] {
        process_open_cover(&mut registry, &mut pool, BUYER, 10_000, budget, T0).unwrap();
    }
    assert_eq!(pool.slot0.remaining_covers, 3);

    // A cap of one crossing per call takes three calls to catch up.
    let far = T0 + 4_000 * 86_400;
    assert!(!process_purge_expired(&registry.config, &mut pool, 1, far).unwrap());
    assert_eq!(pool.slot0.remaining_covers, 2);
    assert!(!process_purge_expired(&registry.config, &mut pool, 1, far).unwrap());
    assert_eq!(pool.slot0.remaining_covers, 1);
    assert!(process_purge_expired(&registry.config, &mut pool, 1, far).unwrap());
    assert_eq!(pool.slot0.remaining_covers, 0);
    assert_eq!(pool.slot0.covered_capital, 0);

    // Zero asks for the configured ceiling, which clears the same backlog
    // in a single call.
    let mut other = new_pool(&mut registry);
    other.deposit(1_000_000).unwrap();
    for budget in [500, 1_000, 2_000] {
        process_open_cover(&mut registry, &mut other, BUYER, 10_000, budget, T0).unwrap();
    }
    assert!(process_purge_expired(&registry.config, &mut other, 0, far).unwrap());
    assert_eq!(other.slot0.remaining_covers, 0);
}

#[test]
fn cover_ids_run_across_pools() {
    let mut registry = new_registry();
    let mut a = new_pool(&mut registry);
    let mut b = new_pool(&mut registry);
    a.deposit(1_000_000).unwrap();
    b.deposit(1_000_000).unwrap();

    let first =
        process_open_cover(&mut registry, &mut a, BUYER, 100_000, 5_000, T0).unwrap();
    let second =
        process_open_cover(&mut registry, &mut b, BUYER, 100_000, 5_000, T0).unwrap();
    let third =
        process_open_cover(&mut registry, &mut a, BUYER, 100_000, 5_000, T0).unwrap();
    assert_eq!((first, second, third), (1, 2, 3));
    assert_eq!(registry.next_cover_id, 4);
}

#[test]
fn open_cover_rejects_what_the_pool_cannot_carry() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(1_000_000).unwrap();

    process_open_cover(&mut registry, &mut pool, BUYER, 600_000, 50_000, T0).unwrap();
    let err = process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 50_000, T0);
    assert_eq!(err, Err(ParasolError::InsufficientCapacity));
    // A rejected open must not burn an id.
    assert_eq!(registry.next_cover_id, 2);

    let err = process_open_cover(&mut registry, &mut pool, BUYER, 100_000, 0, T0);
    assert_eq!(err, Err(ParasolError::BadAmount));

    // An amount too small to accrue any premium cannot be priced.
    let err = process_open_cover(&mut registry, &mut pool, BUYER, 1, 1, T0);
    assert_eq!(err, Err(ParasolError::DurationTooLow));
    assert_eq!(registry.next_cover_id, 2);
}

#[test]
fn premium_quote_tracks_the_current_rate() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(1_000_000).unwrap();
    let cover_id =
        process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    // 40_000 a year at 86_400-second days, rounded half up.
    let info = pool.cover_info(cover_id).unwrap();
    assert_eq!(info.premium_rate, pct(8));
    assert_eq!(info.current_daily_cost, 110);

    // A second cover pushes utilization past the kink; the quote for the
    // first cover reprices with it, but its remaining budget is unchanged
    // because the tick clock rescaled in the same proportion.
    process_open_cover(&mut registry, &mut pool, BUYER, 250_000, 30_000, T0).unwrap();
    assert_eq!(pool.utilization_now().unwrap(), pct(75));
    assert_eq!(pool.premium_rate, pct(54));
    assert_eq!(pool.slot0.seconds_per_tick, 6_400);
    let info = pool.cover_info(cover_id).unwrap();
    assert_eq!(info.premium_rate, pct(54));
    assert_eq!(info.premiums_left, 40_000);
}

//! Liquidity lifecycle scenarios: deposits, the commit-delay-withdraw
//! dance, and how realized interest is routed between owner and treasury.

use parasol_common::{ParasolError, YEAR};
use parasol_integration_tests::*;
use parasol_manager::{
    process_add_liquidity, process_commit_remove_liquidity, process_open_cover,
    process_open_position, process_remove_liquidity, process_take_interest,
    process_uncommit_remove_liquidity, SettleOutcome,
};

const DELAY: u64 = 14 * 86_400;

#[test]
fn withdrawal_waits_out_the_commit_delay() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(600_000).unwrap();
    let mut position = seed_position(&mut registry, &mut pool, 400_000);
    assert_eq!(position.position_id, 1);
    assert_eq!(pool.total_liquidity, 1_000_000);

    // No commitment, no withdrawal.
    let err = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        400_000,
        T0 + DELAY,
    );
    assert_eq!(err, Err(ParasolError::PositionNotCommitted));

    let committed_at = T0 + 3_600;
    let outcome = process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        committed_at,
    )
    .unwrap();
    assert_eq!(outcome, SettleOutcome::default());
    assert!(position.is_committed());

    // One second early is still early.
    let err = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        400_000,
        committed_at + DELAY - 1,
    );
    assert_eq!(err, Err(ParasolError::WithdrawCommitDelayNotReached));

    // The boundary itself counts.
    process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        400_000,
        committed_at + DELAY,
    )
    .unwrap();
    assert_eq!(position.supplied, 0);
    assert!(!position.is_committed());
    assert_eq!(pool.total_liquidity, 600_000);
}

#[test]
fn interest_while_committed_goes_to_the_treasury() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(600_000).unwrap();
    let mut position = seed_position(&mut registry, &mut pool, 400_000);
    process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();

    // A year later the index sits at 1.04; the committed position's 4% on
    // 400k is withheld rather than paid out.
    let outcome = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        400_000,
        T0 + YEAR,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 0);
    assert_eq!(outcome.treasury_payout, 16_000);
    assert_eq!(registry.treasury_accrued, 16_000);
    assert_eq!(pool.total_liquidity, 600_000);
    assert_eq!(position.supplied, 0);
}

#[test]
fn uncommit_reverses_a_pending_withdrawal() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    pool.deposit(600_000).unwrap();
    let mut position = seed_position(&mut registry, &mut pool, 400_000);
    process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();

    // Backing out half a year in still forfeits the interim interest.
    let outcome = process_uncommit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + YEAR / 2,
    )
    .unwrap();
    assert_eq!(outcome.owner_payout, 0);
    assert_eq!(outcome.treasury_payout, 8_000);
    assert_eq!(registry.treasury_accrued, 8_000);
    assert!(!position.is_committed());

    // Uncommitting twice makes no sense.
    let err = process_uncommit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + YEAR / 2,
    );
    assert_eq!(err, Err(ParasolError::PositionNotCommitted));

    // And the withdrawal path is closed again.
    let err = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        400_000,
        T0 + YEAR,
    );
    assert_eq!(err, Err(ParasolError::PositionNotCommitted));
}

#[test]
fn take_interest_pays_the_protocol_its_cut() {
    let mut registry = new_registry();
    let mut pool = new_pool_with_fee(&mut registry, pct(10));
    pool.deposit(600_000).unwrap();
    let mut position = seed_position(&mut registry, &mut pool, 400_000);
    process_open_cover(&mut registry, &mut pool, BUYER, 500_000, 40_000, T0).unwrap();

    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + YEAR,
    )
    .unwrap();
    assert_eq!(outcome.protocol_fees, 1_600);
    assert_eq!(outcome.owner_payout, 14_400);
    assert_eq!(outcome.treasury_payout, 0);
    assert_eq!(registry.treasury_accrued, 1_600);
    assert_eq!(position.supplied, 400_000);

    // The snapshots moved with the payout; an immediate second claim
    // yields nothing.
    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0 + YEAR,
    )
    .unwrap();
    assert_eq!(outcome, SettleOutcome::default());
}

#[test]
fn add_liquidity_extends_cover_capacity() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 400_000);

    process_open_cover(&mut registry, &mut pool, BUYER, 300_000, 10_000, T0).unwrap();
    let err = process_open_cover(&mut registry, &mut pool, BUYER, 200_000, 5_000, T0);
    assert_eq!(err, Err(ParasolError::InsufficientCapacity));

    process_add_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        200_000,
        T0,
    )
    .unwrap();
    assert_eq!(position.supplied, 600_000);
    assert_eq!(pool.total_liquidity, 600_000);

    process_open_cover(&mut registry, &mut pool, BUYER, 200_000, 5_000, T0).unwrap();
    assert_eq!(pool.slot0.covered_capital, 500_000);
}

#[test]
fn withdrawals_cannot_strand_live_covers() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 400_000);
    // This cover outlives the withdrawal delay by a wide margin.
    process_open_cover(&mut registry, &mut pool, BUYER, 300_000, 10_000, T0).unwrap();

    process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        T0,
    )
    .unwrap();

    // Pulling 200k would leave only 200k under a 300k cover.
    let err = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        200_000,
        T0 + DELAY,
    );
    assert_eq!(err, Err(ParasolError::InsufficientCapacity));

    // 100k keeps the cover fully backed and goes through.
    process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        100_000,
        T0 + DELAY,
    )
    .unwrap();
    assert_eq!(pool.total_liquidity, 300_000);
    assert_eq!(pool.slot0.covered_capital, 300_000);
    assert_eq!(position.supplied, 300_000);
}

#[test]
fn position_calls_check_owner_and_amounts() {
    let mut registry = new_registry();
    let mut pool = new_pool(&mut registry);
    let mut position = seed_position(&mut registry, &mut pool, 400_000);

    let err = process_open_position(&mut registry, &mut [&mut pool], LP, 0, false, T0);
    assert_eq!(err, Err(ParasolError::BadAmount));

    let err = process_take_interest(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &BUYER,
        T0,
    );
    assert_eq!(err, Err(ParasolError::OnlyPositionOwner));
    let err = process_add_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &BUYER,
        1,
        T0,
    );
    assert_eq!(err, Err(ParasolError::OnlyPositionOwner));
    let err = process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &BUYER,
        T0,
    );
    assert_eq!(err, Err(ParasolError::OnlyPositionOwner));
    let err = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &BUYER,
        1,
        T0,
    );
    assert_eq!(err, Err(ParasolError::OnlyPositionOwner));

    let err = process_add_liquidity(
        &mut registry,
        &mut position,
        &mut [&mut pool],
        &LP,
        0,
        T0,
    );
    assert_eq!(err, Err(ParasolError::BadAmount));
}

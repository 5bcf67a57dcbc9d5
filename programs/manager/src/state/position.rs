//! Leveraged LP positions and interest realization

use alloc::vec::Vec;

use parasol_common::{ParasolError, MAX_POSITION_POOLS};
use pinocchio::pubkey::Pubkey;
use ray_math::{checked_add, ray_div, ray_mul, RAY};

use super::pool::VirtualPool;

/// Index snapshot taken when a position last realized interest on a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub pool_id: u64,
    pub begin_liquidity_index: u128,
    pub begin_claim_index: u128,
    pub begin_strategy_reward_index: u128,
}

/// An LP position. The same supplied capital backs every listed pool,
/// which is what makes the position leveraged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub position_id: u64,
    pub owner: Pubkey,
    /// Capital currently credited to the owner, shared across pools
    pub supplied: u128,
    /// Supplied through a wrapped token rather than the raw asset
    pub wrapped: bool,
    /// Unix time of the pending withdrawal commitment, 0 if none
    pub commit_timestamp: u64,
    pub created_at: u64,
    pub snapshots: Vec<PoolSnapshot>,
}

/// Interest accrued since the last snapshot, per pool and in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Realization {
    /// Supplied capital after applying every pool's claim haircut
    pub new_user_capital: u128,
    /// Premium yield earned in each pool, pre-fee
    pub cover_rewards: Vec<u128>,
    /// Strategy yield earned in each pool, pre-fee
    pub strategy_rewards: Vec<u128>,
}

impl Realization {
    pub fn gross_cover_rewards(&self) -> Result<u128, ParasolError> {
        sum(&self.cover_rewards)
    }

    pub fn gross_strategy_rewards(&self) -> Result<u128, ParasolError> {
        sum(&self.strategy_rewards)
    }
}

fn sum(values: &[u128]) -> Result<u128, ParasolError> {
    let mut total = 0u128;
    for v in values {
        total = checked_add(total, *v)?;
    }
    Ok(total)
}

impl Position {
    pub fn new(
        position_id: u64,
        owner: Pubkey,
        supplied: u128,
        wrapped: bool,
        pools: &[&VirtualPool],
        created_at: u64,
    ) -> Self {
        Self {
            position_id,
            owner,
            supplied,
            wrapped,
            commit_timestamp: 0,
            created_at,
            snapshots: snapshots_of(pools),
        }
    }

    pub fn pool_ids(&self) -> Vec<u64> {
        self.snapshots.iter().map(|s| s.pool_id).collect()
    }

    pub fn is_committed(&self) -> bool {
        self.commit_timestamp != 0
    }

    /// Compute interest accrued since the snapshots were taken.
    ///
    /// `pools` must be the position's pools in snapshot order; every pool is
    /// expected to be refreshed first so the indexes are current.
    pub fn realize(&self, pools: &[&VirtualPool]) -> Result<Realization, ParasolError> {
        if pools.len() != self.snapshots.len() {
            return Err(ParasolError::AccountMismatch);
        }
        let mut cover_rewards = Vec::with_capacity(pools.len());
        let mut strategy_rewards = Vec::with_capacity(pools.len());
        let mut capital = self.supplied;
        for (snap, pool) in self.snapshots.iter().zip(pools.iter()) {
            if snap.pool_id != pool.pool_id {
                return Err(ParasolError::AccountMismatch);
            }
            let claim_ratio = index_ratio(pool.claim_index, snap.begin_claim_index)?;
            let liquidity_ratio =
                index_ratio(pool.liquidity_index, snap.begin_liquidity_index)?;
            let strategy_ratio =
                index_ratio(pool.strategy_reward_index, snap.begin_strategy_reward_index)?;

            // yield accrues on the claim-adjusted principal in this pool
            let base = ray_mul(self.supplied, claim_ratio)?;
            cover_rewards.push(growth_on(base, liquidity_ratio)?);
            strategy_rewards.push(growth_on(base, strategy_ratio)?);

            capital = ray_mul(capital, claim_ratio)?;
        }
        Ok(Realization {
            new_user_capital: capital,
            cover_rewards,
            strategy_rewards,
        })
    }

    /// Restart interest accrual from the pools' current indexes.
    pub fn rebase(&mut self, supplied: u128, pools: &[&VirtualPool]) {
        self.supplied = supplied;
        self.snapshots = snapshots_of(pools);
    }
}

fn snapshots_of(pools: &[&VirtualPool]) -> Vec<PoolSnapshot> {
    pools
        .iter()
        .map(|p| PoolSnapshot {
            pool_id: p.pool_id,
            begin_liquidity_index: p.liquidity_index,
            begin_claim_index: p.claim_index,
            begin_strategy_reward_index: p.strategy_reward_index,
        })
        .collect()
}

/// Index growth factor since a snapshot. A claim can zero an index, in
/// which case everything snapshotted after that point is wiped as well.
fn index_ratio(current: u128, begin: u128) -> Result<u128, ParasolError> {
    if begin == 0 {
        return Ok(0);
    }
    Ok(ray_div(current, begin)?)
}

/// Yield earned on `base` given an index ratio, zero when the ratio
/// regressed below one.
fn growth_on(base: u128, ratio: u128) -> Result<u128, ParasolError> {
    if ratio <= RAY {
        return Ok(0);
    }
    Ok(ray_mul(base, ratio - RAY)?)
}

/// Validate a position's pool id list: non-empty, strictly ascending,
/// within the configured leverage.
pub fn validate_pool_ids(ids: &[u64], max_leverage: u8) -> Result<(), ParasolError> {
    if ids.is_empty() {
        return Err(ParasolError::BadAmount);
    }
    let limit = (max_leverage as usize).min(MAX_POSITION_POOLS);
    if ids.len() > limit {
        return Err(ParasolError::AmountOfPoolsIsAboveMaxLeverage);
    }
    for pair in ids.windows(2) {
        if pair[0] >= pair[1] {
            return Err(ParasolError::PoolIdsMustBeUniqueAndAscending);
        }
    }
    Ok(())
}

/// Read-only position snapshot for off-chain consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionInfo {
    pub position_id: u64,
    pub owner: Pubkey,
    pub supplied: u128,
    pub wrapped: bool,
    pub commit_timestamp: u64,
    pub pool_ids: Vec<u64>,
    pub new_user_capital: u128,
    pub cover_rewards: Vec<u128>,
    pub strategy_rewards: u128,
}

impl PositionInfo {
    pub fn build(position: &Position, pools: &[&VirtualPool]) -> Result<Self, ParasolError> {
        let realized = position.realize(pools)?;
        Ok(Self {
            position_id: position.position_id,
            owner: position.owner,
            supplied: position.supplied,
            wrapped: position.wrapped,
            commit_timestamp: position.commit_timestamp,
            pool_ids: position.pool_ids(),
            new_user_capital: realized.new_user_capital,
            strategy_rewards: realized.gross_strategy_rewards()?,
            cover_rewards: realized.cover_rewards,
        })
    }
}

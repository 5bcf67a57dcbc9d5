//! Virtual pool state machine: tick clock, compounding indexes, cover ledger

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use parasol_common::{
    ParasolError, MAX_SECONDS_PER_TICK, PREMIUM_REMOVE_ALL, SECONDS_PER_DAY, YEAR,
};
use pinocchio::pubkey::Pubkey;
use ray_math::{
    checked_add, checked_sub, max_u128, min_u128, mul_div_floor, mul_div_half_up, ray_div,
    ray_mul, RAY,
};

use super::cover::{Cover, CoverInfo, END_REASON_CLOSED, END_REASON_EXPIRED, END_REASON_NONE};
use super::curve::{utilization, PoolFormula};
use super::ticks::TickIndex;

/// Hot clock fields, grouped so the account codec can pin them at fixed
/// offsets for off-chain mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    /// Current virtual tick
    pub tick: u32,
    /// Seconds already burned inside the current tick
    pub secs_in_tick: u64,
    /// Wall seconds one tick currently takes
    pub seconds_per_tick: u64,
    /// Capital protected by active covers
    pub covered_capital: u128,
    /// Number of active covers
    pub remaining_covers: u64,
    /// Unix time the clock was last advanced to
    pub last_update: u64,
}

/// Outcome of a cover update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverChange {
    /// Premium owed back to the owner
    pub refund: u128,
    /// True when the update unwound the cover entirely
    pub closed: bool,
    /// Expiry tick after repricing (current tick when closed)
    pub last_tick: u32,
}

/// Read-only pool snapshot for off-chain consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInfo {
    pub pool_id: u64,
    pub payment_asset: Pubkey,
    pub strategy_id: u64,
    pub paused: bool,
    pub formula: PoolFormula,
    pub total_liquidity: u128,
    pub covered_capital: u128,
    pub utilization: u128,
    pub premium_rate: u128,
    pub liquidity_index: u128,
    pub claim_index: u128,
    pub strategy_reward_index: u128,
    pub seconds_per_tick: u64,
    pub tick: u32,
    pub remaining_covers: u64,
    pub compensation_count: u64,
}

/// One insurance pool's complete accounting state.
///
/// Time is discretized into ticks whose wall-clock length varies inversely
/// with the premium rate, so a cover's expiry is a fixed tick number even as
/// the rate moves. All mutating entry points expect the clock to have been
/// brought up to date with `refresh` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPool {
    pub pool_id: u64,
    /// Asset both liquidity and premiums are denominated in
    pub payment_asset: Pubkey,
    /// Yield strategy this pool's idle capital sits in
    pub strategy_id: u64,
    pub created_at: u64,
    pub paused: bool,
    /// Protocol's cut of realized LP interest (ray)
    pub fee_rate: u128,
    pub formula: PoolFormula,
    pub slot0: Slot0,
    /// Premium rate at the current utilization (ray)
    pub premium_rate: u128,
    /// Compounding LP yield index, starts at RAY, never decreases
    pub liquidity_index: u128,
    /// Compounding claim haircut index, starts at RAY, never increases
    pub claim_index: u128,
    /// Compounding strategy reward index, starts at RAY
    pub strategy_reward_index: u128,
    pub total_liquidity: u128,
    /// Pool ids leveraged positions may combine with this one, ascending
    pub compatible_pools: Vec<u64>,
    /// Capital shared with each compatible pool
    pub overlaps: BTreeMap<u64, u128>,
    /// Claim ids that have hit this pool
    pub compensation_ids: Vec<u64>,
    pub(crate) ticks: TickIndex,
    pub(crate) covers: BTreeMap<u64, Cover>,
}

impl VirtualPool {
    pub fn new(
        pool_id: u64,
        payment_asset: Pubkey,
        strategy_id: u64,
        fee_rate: u128,
        formula: PoolFormula,
        compatible_pools: Vec<u64>,
        created_at: u64,
    ) -> Result<Self, ParasolError> {
        formula.validate()?;
        if fee_rate > RAY {
            return Err(ParasolError::BadAmount);
        }
        for pair in compatible_pools.windows(2) {
            if pair[0] >= pair[1] {
                return Err(ParasolError::PoolIdsMustBeUniqueAndAscending);
            }
        }
        if compatible_pools.binary_search(&pool_id).is_ok() {
            return Err(ParasolError::PoolIdsMustBeUniqueAndAscending);
        }
        let premium_rate = formula.premium_rate(0)?;
        Ok(Self {
            pool_id,
            payment_asset,
            strategy_id,
            created_at,
            paused: false,
            fee_rate,
            formula,
            slot0: Slot0 {
                tick: 0,
                secs_in_tick: 0,
                seconds_per_tick: MAX_SECONDS_PER_TICK,
                covered_capital: 0,
                remaining_covers: 0,
                last_update: created_at,
            },
            premium_rate,
            liquidity_index: RAY,
            claim_index: RAY,
            strategy_reward_index: RAY,
            total_liquidity: 0,
            compatible_pools,
            overlaps: BTreeMap::new(),
            compensation_ids: Vec::new(),
            ticks: TickIndex::new(),
            covers: BTreeMap::new(),
        })
    }

    pub fn is_compatible_with(&self, pool_id: u64) -> bool {
        self.compatible_pools.binary_search(&pool_id).is_ok()
    }

    /// Record that a newly created pool lists this one as compatible.
    pub fn add_compatible(&mut self, pool_id: u64) {
        if let Err(pos) = self.compatible_pools.binary_search(&pool_id) {
            self.compatible_pools.insert(pos, pool_id);
        }
    }

    pub fn utilization_now(&self) -> Result<u128, ParasolError> {
        utilization(self.slot0.covered_capital, self.total_liquidity)
    }

    /// Advance the virtual clock to `now`, crossing at most `max_crossings`
    /// expiry ticks.
    ///
    /// Returns false when the cap stopped the catch-up early; the pool is
    /// then consistent as of the last crossing processed and a further call
    /// resumes from there.
    pub fn refresh(&mut self, now: u64, max_crossings: u32) -> Result<bool, ParasolError> {
        if now <= self.slot0.last_update {
            return Ok(true);
        }
        let mut crossings = 0u32;
        while self.slot0.remaining_covers > 0 {
            let next = match self.ticks.next_initialized_at_or_after(self.slot0.tick) {
                Some(t) => t,
                None => break,
            };
            let to_next =
                (next - self.slot0.tick) as u128 * self.slot0.seconds_per_tick as u128;
            // the clock never sits past an initialized tick, so progress
            // inside the current tick is always short of to_next
            let distance = to_next - self.slot0.secs_in_tick as u128;
            let crossed_at = self.slot0.last_update as u128 + distance;
            if crossed_at > now as u128 {
                break;
            }
            if crossings == max_crossings {
                return Ok(false);
            }
            crossings += 1;
            self.accrue(distance as u64)?;
            self.slot0.last_update = crossed_at as u64;
            self.slot0.tick = next;
            self.slot0.secs_in_tick = 0;
            self.expire_bucket(next)?;
            self.retarget()?;
        }
        let dt = now - self.slot0.last_update;
        self.accrue(dt)?;
        if self.slot0.remaining_covers > 0 {
            // partial advance; with no covers the tick stays frozen
            let spt = self.slot0.seconds_per_tick as u128;
            let total = self.slot0.secs_in_tick as u128 + dt as u128;
            let advanced =
                u32::try_from(total / spt).map_err(|_| ParasolError::Overflow)?;
            self.slot0.tick = self
                .slot0
                .tick
                .checked_add(advanced)
                .ok_or(ParasolError::Overflow)?;
            self.slot0.secs_in_tick = (total % spt) as u64;
        }
        self.slot0.last_update = now;
        Ok(true)
    }

    /// Compound the liquidity index over `dt` seconds at the current rate
    /// and utilization.
    fn accrue(&mut self, dt: u64) -> Result<(), ParasolError> {
        if dt == 0 {
            return Ok(());
        }
        let liquidity_rate = ray_mul(self.premium_rate, self.utilization_now()?)?;
        if liquidity_rate == 0 {
            return Ok(());
        }
        let growth = checked_add(
            RAY,
            mul_div_half_up(liquidity_rate, dt as u128, YEAR as u128)?,
        )?;
        self.liquidity_index = ray_mul(self.liquidity_index, growth)?;
        Ok(())
    }

    /// Expire every cover in the bucket at `tick`. The clock must already
    /// stand at the crossing time.
    fn expire_bucket(&mut self, tick: u32) -> Result<(), ParasolError> {
        let ids = self.ticks.take_bucket(tick);
        let ended_at = self.slot0.last_update;
        let mut freed = 0u128;
        for id in &ids {
            let cover = self
                .covers
                .get_mut(id)
                .ok_or(ParasolError::CoverNotFound)?;
            cover.end(ended_at, END_REASON_EXPIRED);
            freed = checked_add(freed, cover.amount)?;
        }
        self.slot0.covered_capital = checked_sub(self.slot0.covered_capital, freed)?;
        self.slot0.remaining_covers = self
            .slot0
            .remaining_covers
            .checked_sub(ids.len() as u64)
            .ok_or(ParasolError::Overflow)?;
        Ok(())
    }

    /// Re-derive the premium rate from utilization and rescale the tick
    /// clock so per-tick premium consumption stays constant.
    fn retarget(&mut self) -> Result<(), ParasolError> {
        let old_rate = self.premium_rate;
        let new_rate = self.formula.premium_rate(self.utilization_now()?)?;
        if new_rate == old_rate {
            return Ok(());
        }
        let slot0 = &mut self.slot0;
        if new_rate == 0 || old_rate == 0 {
            // rate hit zero (or recovered from it): idle at the cap
            slot0.seconds_per_tick = MAX_SECONDS_PER_TICK;
            slot0.secs_in_tick = slot0.secs_in_tick.min(MAX_SECONDS_PER_TICK - 1);
        } else {
            let scaled = mul_div_half_up(
                slot0.seconds_per_tick as u128,
                old_rate,
                new_rate,
            )?;
            let spt = max_u128(min_u128(scaled, MAX_SECONDS_PER_TICK as u128), 1);
            let sit = mul_div_half_up(slot0.secs_in_tick as u128, old_rate, new_rate)?;
            slot0.seconds_per_tick = spt as u64;
            slot0.secs_in_tick = min_u128(sit, spt - 1) as u64;
        }
        self.premium_rate = new_rate;
        Ok(())
    }

    /// Tick at which a budget runs out for `amount` at the current rate.
    fn target_tick(&self, amount: u128, premium_budget: u128) -> Result<u32, ParasolError> {
        let yearly_cost = ray_mul(amount, self.premium_rate)?;
        if yearly_cost == 0 {
            return Err(ParasolError::DurationTooLow);
        }
        let duration_secs = mul_div_floor(premium_budget, YEAR as u128, yearly_cost)?;
        if duration_secs == 0 {
            return Err(ParasolError::DurationTooLow);
        }
        let ticks = duration_secs.div_ceil(self.slot0.seconds_per_tick as u128);
        let ticks = u32::try_from(ticks).map_err(|_| ParasolError::Overflow)?;
        self.slot0
            .tick
            .checked_add(ticks)
            .ok_or(ParasolError::Overflow)
    }

    /// Budget a cover has not yet burned, at the refreshed clock.
    fn premiums_left(&self, cover: &Cover) -> Result<u128, ParasolError> {
        if !cover.is_active() || cover.last_tick <= self.slot0.tick {
            return Ok(0);
        }
        let remaining_ticks = (cover.last_tick - self.slot0.tick) as u128;
        let remaining_secs = remaining_ticks * self.slot0.seconds_per_tick as u128
            - self.slot0.secs_in_tick as u128;
        let yearly_cost = ray_mul(cover.amount, self.premium_rate)?;
        mul_div_half_up(yearly_cost, remaining_secs, YEAR as u128).map_err(ParasolError::from)
    }

    pub fn open_cover(
        &mut self,
        cover_id: u64,
        owner: Pubkey,
        amount: u128,
        premium_budget: u128,
        now: u64,
    ) -> Result<(), ParasolError> {
        if amount == 0 || premium_budget == 0 {
            return Err(ParasolError::BadAmount);
        }
        let available = self
            .total_liquidity
            .saturating_sub(self.slot0.covered_capital);
        if amount > available {
            return Err(ParasolError::InsufficientCapacity);
        }
        self.slot0.covered_capital = checked_add(self.slot0.covered_capital, amount)?;
        self.retarget()?;
        let last_tick = self.target_tick(amount, premium_budget)?;
        let tick_slot = self.ticks.add(last_tick, cover_id);
        self.covers.insert(
            cover_id,
            Cover {
                owner,
                amount,
                start_tick: self.slot0.tick,
                last_tick,
                tick_slot,
                opened_at: now,
                ended_at: 0,
                end_reason: END_REASON_NONE,
            },
        );
        self.slot0.remaining_covers += 1;
        Ok(())
    }

    pub fn update_cover(
        &mut self,
        cover_id: u64,
        caller: &Pubkey,
        amount_to_add: u128,
        amount_to_remove: u128,
        premium_to_add: u128,
        premium_to_remove: u128,
        now: u64,
    ) -> Result<CoverChange, ParasolError> {
        let cover = *self
            .covers
            .get(&cover_id)
            .ok_or(ParasolError::CoverNotFound)?;
        if cover.owner != *caller {
            return Err(ParasolError::OnlyCoverOwner);
        }
        if !cover.is_active() {
            return Err(ParasolError::CoverIsExpired);
        }
        if (amount_to_add > 0 && amount_to_remove > 0)
            || (premium_to_add > 0 && premium_to_remove > 0)
        {
            return Err(ParasolError::BadAmount);
        }
        if amount_to_remove > cover.amount {
            return Err(ParasolError::BadAmount);
        }
        let left = self.premiums_left(&cover)?;
        let new_amount = checked_add(cover.amount, amount_to_add)? - amount_to_remove;
        let (new_budget, base_refund) = if premium_to_remove == PREMIUM_REMOVE_ALL {
            (0, left)
        } else if premium_to_remove > 0 {
            if premium_to_remove > left {
                return Err(ParasolError::BadAmount);
            }
            (left - premium_to_remove, premium_to_remove)
        } else {
            (checked_add(left, premium_to_add)?, 0)
        };

        if new_amount == 0 || new_budget == 0 {
            // fully unwound: any budget not withdrawn explicitly comes back too
            let refund = checked_add(base_refund, new_budget)?;
            self.detach(cover_id)?;
            self.retarget()?;
            if let Some(c) = self.covers.get_mut(&cover_id) {
                c.end(now, END_REASON_CLOSED);
            }
            return Ok(CoverChange {
                refund,
                closed: true,
                last_tick: self.slot0.tick,
            });
        }

        let covered_without = checked_sub(self.slot0.covered_capital, cover.amount)?;
        let available = self.total_liquidity.saturating_sub(covered_without);
        if new_amount > available {
            return Err(ParasolError::InsufficientCapacity);
        }
        self.detach(cover_id)?;
        self.slot0.covered_capital = checked_add(self.slot0.covered_capital, new_amount)?;
        self.retarget()?;
        let last_tick = self.target_tick(new_amount, new_budget)?;
        let tick_slot = self.ticks.add(last_tick, cover_id);
        if let Some(c) = self.covers.get_mut(&cover_id) {
            c.amount = new_amount;
            c.start_tick = self.slot0.tick;
            c.last_tick = last_tick;
            c.tick_slot = tick_slot;
        }
        self.slot0.remaining_covers += 1;
        Ok(CoverChange {
            refund: base_refund,
            closed: false,
            last_tick,
        })
    }

    pub fn close_cover(
        &mut self,
        cover_id: u64,
        caller: &Pubkey,
        now: u64,
    ) -> Result<u128, ParasolError> {
        let cover = *self
            .covers
            .get(&cover_id)
            .ok_or(ParasolError::CoverNotFound)?;
        if cover.owner != *caller {
            return Err(ParasolError::OnlyCoverOwner);
        }
        if !cover.is_active() {
            return Err(ParasolError::CoverIsExpired);
        }
        let refund = self.premiums_left(&cover)?;
        self.detach(cover_id)?;
        self.retarget()?;
        if let Some(c) = self.covers.get_mut(&cover_id) {
            c.end(now, END_REASON_CLOSED);
        }
        Ok(refund)
    }

    /// Pull an active cover out of the tick index and the aggregates,
    /// leaving its ledger record in place for the caller to finalize.
    fn detach(&mut self, cover_id: u64) -> Result<(), ParasolError> {
        let cover = *self
            .covers
            .get(&cover_id)
            .ok_or(ParasolError::CoverNotFound)?;
        let moved = self
            .ticks
            .remove(cover.last_tick, cover_id, cover.tick_slot)?;
        if let Some(moved_id) = moved {
            if let Some(m) = self.covers.get_mut(&moved_id) {
                m.tick_slot = cover.tick_slot;
            }
        }
        self.slot0.covered_capital = checked_sub(self.slot0.covered_capital, cover.amount)?;
        self.slot0.remaining_covers = self
            .slot0
            .remaining_covers
            .checked_sub(1)
            .ok_or(ParasolError::Overflow)?;
        Ok(())
    }

    pub fn deposit(&mut self, amount: u128) -> Result<(), ParasolError> {
        self.total_liquidity = checked_add(self.total_liquidity, amount)?;
        self.retarget()
    }

    /// Remove liquidity; fails rather than let covers exceed what is left.
    pub fn withdraw(&mut self, amount: u128) -> Result<(), ParasolError> {
        let next = checked_sub(self.total_liquidity, amount)
            .map_err(|_| ParasolError::BadAmount)?;
        if self.slot0.covered_capital > next {
            return Err(ParasolError::InsufficientCapacity);
        }
        self.total_liquidity = next;
        self.retarget()
    }

    /// Burn `amount` of pooled capital to pay a claim, haircutting every LP
    /// through the claim index. Covered capital is untouched; the covers
    /// themselves run their normal lifecycle.
    pub fn register_compensation(
        &mut self,
        claim_id: u64,
        amount: u128,
    ) -> Result<(), ParasolError> {
        if amount == 0 || amount > self.total_liquidity {
            return Err(ParasolError::BadAmount);
        }
        let haircut = checked_sub(RAY, ray_div(amount, self.total_liquidity)?)?;
        self.claim_index = ray_mul(self.claim_index, haircut)?;
        self.total_liquidity -= amount;
        self.compensation_ids.push(claim_id);
        self.retarget()
    }

    /// Credit strategy yield to LPs through the reward index. The reward
    /// asset is external, so total liquidity does not move.
    pub fn push_strategy_reward(&mut self, amount: u128) -> Result<(), ParasolError> {
        if amount == 0 || self.total_liquidity == 0 {
            return Err(ParasolError::BadAmount);
        }
        let growth = checked_add(RAY, ray_div(amount, self.total_liquidity)?)?;
        self.strategy_reward_index = ray_mul(self.strategy_reward_index, growth)?;
        Ok(())
    }

    pub fn add_overlap(&mut self, pool_id: u64, amount: u128) -> Result<(), ParasolError> {
        let entry = self.overlaps.entry(pool_id).or_insert(0);
        *entry = checked_add(*entry, amount)?;
        Ok(())
    }

    /// Overlaps are tracked from stored position sizes, which lag realized
    /// haircuts; saturate rather than fault on the residue.
    pub fn sub_overlap(&mut self, pool_id: u64, amount: u128) {
        if let Some(entry) = self.overlaps.get_mut(&pool_id) {
            *entry = entry.saturating_sub(amount);
            if *entry == 0 {
                self.overlaps.remove(&pool_id);
            }
        }
    }

    pub fn cover_info(&self, cover_id: u64) -> Result<CoverInfo, ParasolError> {
        let cover = self
            .covers
            .get(&cover_id)
            .ok_or(ParasolError::CoverNotFound)?;
        let daily = if cover.is_active() {
            let yearly_cost = ray_mul(cover.amount, self.premium_rate)?;
            mul_div_half_up(yearly_cost, SECONDS_PER_DAY as u128, YEAR as u128)?
        } else {
            0
        };
        Ok(CoverInfo {
            cover_id,
            owner: cover.owner,
            amount: cover.amount,
            premium_rate: self.premium_rate,
            premiums_left: self.premiums_left(cover)?,
            current_daily_cost: daily,
            is_active: cover.is_active(),
        })
    }

    pub fn pool_info(&self) -> Result<PoolInfo, ParasolError> {
        Ok(PoolInfo {
            pool_id: self.pool_id,
            payment_asset: self.payment_asset,
            strategy_id: self.strategy_id,
            paused: self.paused,
            formula: self.formula,
            total_liquidity: self.total_liquidity,
            covered_capital: self.slot0.covered_capital,
            utilization: self.utilization_now()?,
            premium_rate: self.premium_rate,
            liquidity_index: self.liquidity_index,
            claim_index: self.claim_index,
            strategy_reward_index: self.strategy_reward_index,
            seconds_per_tick: self.slot0.seconds_per_tick,
            tick: self.slot0.tick,
            remaining_covers: self.slot0.remaining_covers,
            compensation_count: self.compensation_ids.len() as u64,
        })
    }
}

#[cfg(all(test, not(target_os = "solana")))]
#[path = "pool_test.rs"]
mod pool_test;

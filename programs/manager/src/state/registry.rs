//! Global registry: authorities, config, counters, pool directory

use alloc::vec::Vec;

use parasol_common::{ParasolError, MAX_POSITION_POOLS};
use pinocchio::pubkey::Pubkey;
use ray_math::{checked_add, RAY};

/// Tunable protocol parameters, changeable by governance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Seconds between a withdrawal commitment and its execution
    pub withdraw_delay: u64,
    /// Pools a single position may back, at most MAX_POSITION_POOLS
    pub max_leverage: u8,
    /// Extra fee per pool beyond the first, applied to realized interest (ray)
    pub leverage_fee_rate: u128,
    /// Tick crossings a single refresh may process
    pub max_crossings: u32,
}

impl ManagerConfig {
    pub fn validate(&self) -> Result<(), ParasolError> {
        if self.max_leverage == 0 || self.max_leverage as usize > MAX_POSITION_POOLS {
            return Err(ParasolError::BadAmount);
        }
        if self.leverage_fee_rate > RAY || self.max_crossings == 0 {
            return Err(ParasolError::BadAmount);
        }
        Ok(())
    }
}

/// Directory entry tying a pool id to its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEntry {
    pub pool_id: u64,
    pub key: Pubkey,
}

/// Singleton root account for the whole manager deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    /// May change config, pause pools, and collect treasury fees
    pub governance: Pubkey,
    /// May register compensations against pools
    pub claim_manager: Pubkey,
    /// May push strategy rewards into pools
    pub strategy_manager: Pubkey,
    pub config: ManagerConfig,
    /// Protocol fees and diverted interim interest
    pub treasury_accrued: u128,
    /// Leverage risk fees, earmarked for the risk backstop
    pub risk_accrued: u128,
    pub next_pool_id: u64,
    pub next_position_id: u64,
    pub next_cover_id: u64,
    pub pools: Vec<PoolEntry>,
}

impl Registry {
    pub fn new(
        governance: Pubkey,
        claim_manager: Pubkey,
        strategy_manager: Pubkey,
        config: ManagerConfig,
    ) -> Result<Self, ParasolError> {
        config.validate()?;
        Ok(Self {
            governance,
            claim_manager,
            strategy_manager,
            config,
            treasury_accrued: 0,
            risk_accrued: 0,
            next_pool_id: 1,
            next_position_id: 1,
            next_cover_id: 1,
            pools: Vec::new(),
        })
    }

    /// Allocate the next pool id and record its account key.
    pub fn register_pool(&mut self, key: Pubkey) -> u64 {
        let pool_id = self.next_pool_id;
        self.next_pool_id += 1;
        self.pools.push(PoolEntry { pool_id, key });
        pool_id
    }

    pub fn allocate_position_id(&mut self) -> u64 {
        let id = self.next_position_id;
        self.next_position_id += 1;
        id
    }

    pub fn allocate_cover_id(&mut self) -> u64 {
        let id = self.next_cover_id;
        self.next_cover_id += 1;
        id
    }

    pub fn find_pool(&self, pool_id: u64) -> Option<&PoolEntry> {
        self.pools.iter().find(|e| e.pool_id == pool_id)
    }

    /// Check that `key` is the registered account for `pool_id`.
    pub fn expect_pool_key(&self, pool_id: u64, key: &Pubkey) -> Result<(), ParasolError> {
        let entry = self.find_pool(pool_id).ok_or(ParasolError::PoolNotFound)?;
        if entry.key != *key {
            return Err(ParasolError::AccountMismatch);
        }
        Ok(())
    }

    pub fn accrue_treasury(&mut self, amount: u128) -> Result<(), ParasolError> {
        self.treasury_accrued = checked_add(self.treasury_accrued, amount)?;
        Ok(())
    }

    pub fn accrue_risk(&mut self, amount: u128) -> Result<(), ParasolError> {
        self.risk_accrued = checked_add(self.risk_accrued, amount)?;
        Ok(())
    }
}

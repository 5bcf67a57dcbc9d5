//! Account serialization
//!
//! Little-endian, explicit-offset encoding. Every account starts with an
//! 8-byte magic and a u32 version, followed by all fixed-width fields, with
//! variable-length sections last. Keeping the fixed fields at stable
//! offsets lets off-chain consumers read the hot pool clock without
//! decoding the whole account.
//!
//! Pool fixed-prefix layout (offsets in bytes):
//!
//! ```text
//!   0  magic            8
//!   8  version          4
//!  12  pool_id          8
//!  20  payment_asset   32
//!  52  strategy_id      8
//!  60  created_at       8
//!  68  paused           1
//!  69  fee_rate        16
//!  85  formula         64  (u_optimal, r0, r_slope1, r_slope2)
//! 149  premium_rate    16
//! 165  liquidity_index 16
//! 181  claim_index     16
//! 197  strategy_index  16
//! 213  total_liquidity 16
//! 229  slot0           52  (tick u32, secs_in_tick u64, seconds_per_tick
//!                           u64, covered_capital u128, remaining_covers
//!                           u64, last_update u64)
//! 281  variable sections
//! ```

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use super::cover::Cover;
use super::curve::PoolFormula;
use super::pool::{Slot0, VirtualPool};
use super::position::{PoolSnapshot, Position};
use super::registry::{ManagerConfig, PoolEntry, Registry};
use super::ticks::TickIndex;

pub const REGISTRY_MAGIC: [u8; 8] = *b"PSLREG1\0";
pub const POOL_MAGIC: [u8; 8] = *b"PSLPOOL1";
pub const POSITION_MAGIC: [u8; 8] = *b"PSLPOS1\0";
pub const CODEC_VERSION: u32 = 1;

/// Offset of `slot0.tick` in an encoded pool, for off-chain mirrors.
pub const POOL_SLOT0_OFFSET: usize = 229;
pub const POOL_FIXED_PREFIX_LEN: usize = 281;

struct Writer<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ParasolError> {
        let end = self.offset + bytes.len();
        if end > self.buf.len() {
            return Err(ParasolError::AccountTooSmall);
        }
        self.buf[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    fn write_u8(&mut self, v: u8) -> Result<(), ParasolError> {
        self.write_bytes(&[v])
    }

    fn write_u32(&mut self, v: u32) -> Result<(), ParasolError> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_u64(&mut self, v: u64) -> Result<(), ParasolError> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_u128(&mut self, v: u128) -> Result<(), ParasolError> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_pubkey(&mut self, v: &Pubkey) -> Result<(), ParasolError> {
        self.write_bytes(v.as_ref())
    }

    fn write_len(&mut self, len: usize) -> Result<(), ParasolError> {
        let len = u32::try_from(len).map_err(|_| ParasolError::Overflow)?;
        self.write_u32(len)
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, ParasolError> {
        let v = parasol_common::read_u8(self.data, self.offset)
            .map_err(|_| ParasolError::AccountTooSmall)?;
        self.offset += 1;
        Ok(v)
    }

    fn read_u32(&mut self) -> Result<u32, ParasolError> {
        let v = parasol_common::read_u32(self.data, self.offset)
            .map_err(|_| ParasolError::AccountTooSmall)?;
        self.offset += 4;
        Ok(v)
    }

    fn read_u64(&mut self) -> Result<u64, ParasolError> {
        let v = parasol_common::read_u64(self.data, self.offset)
            .map_err(|_| ParasolError::AccountTooSmall)?;
        self.offset += 8;
        Ok(v)
    }

    fn read_u128(&mut self) -> Result<u128, ParasolError> {
        let v = parasol_common::read_u128(self.data, self.offset)
            .map_err(|_| ParasolError::AccountTooSmall)?;
        self.offset += 16;
        Ok(v)
    }

    fn read_pubkey(&mut self) -> Result<Pubkey, ParasolError> {
        let v = parasol_common::read_pubkey(self.data, self.offset)
            .map_err(|_| ParasolError::AccountTooSmall)?;
        self.offset += 32;
        Ok(v)
    }

    fn read_bool(&mut self) -> Result<bool, ParasolError> {
        Ok(self.read_u8()? != 0)
    }
}

fn write_header(w: &mut Writer, magic: &[u8; 8]) -> Result<(), ParasolError> {
    w.write_bytes(magic)?;
    w.write_u32(CODEC_VERSION)
}

fn check_header(r: &mut Reader, magic: &[u8; 8]) -> Result<(), ParasolError> {
    let mut found = [0u8; 8];
    for b in found.iter_mut() {
        *b = r.read_u8().map_err(|_| ParasolError::BadAccountMagic)?;
    }
    if found != *magic {
        return Err(ParasolError::BadAccountMagic);
    }
    let version = r.read_u32().map_err(|_| ParasolError::BadAccountMagic)?;
    if version != CODEC_VERSION {
        return Err(ParasolError::BadAccountMagic);
    }
    Ok(())
}

/// Refuse to initialize over an account that already carries data.
pub fn ensure_uninitialized(data: &[u8]) -> Result<(), ParasolError> {
    if data.len() < 8 {
        return Err(ParasolError::AccountTooSmall);
    }
    if data[..8] != [0u8; 8] {
        return Err(ParasolError::AlreadyInitialized);
    }
    Ok(())
}

pub fn encode_registry(registry: &Registry, buf: &mut [u8]) -> Result<usize, ParasolError> {
    let mut w = Writer::new(buf);
    write_header(&mut w, &REGISTRY_MAGIC)?;
    w.write_pubkey(&registry.governance)?;
    w.write_pubkey(&registry.claim_manager)?;
    w.write_pubkey(&registry.strategy_manager)?;
    w.write_u64(registry.config.withdraw_delay)?;
    w.write_u8(registry.config.max_leverage)?;
    w.write_u128(registry.config.leverage_fee_rate)?;
    w.write_u32(registry.config.max_crossings)?;
    w.write_u128(registry.treasury_accrued)?;
    w.write_u128(registry.risk_accrued)?;
    w.write_u64(registry.next_pool_id)?;
    w.write_u64(registry.next_position_id)?;
    w.write_u64(registry.next_cover_id)?;
    w.write_len(registry.pools.len())?;
    for entry in &registry.pools {
        w.write_u64(entry.pool_id)?;
        w.write_pubkey(&entry.key)?;
    }
    Ok(w.offset)
}

pub fn decode_registry(data: &[u8]) -> Result<Registry, ParasolError> {
    let mut r = Reader::new(data);
    check_header(&mut r, &REGISTRY_MAGIC)?;
    let governance = r.read_pubkey()?;
    let claim_manager = r.read_pubkey()?;
    let strategy_manager = r.read_pubkey()?;
    let config = ManagerConfig {
        withdraw_delay: r.read_u64()?,
        max_leverage: r.read_u8()?,
        leverage_fee_rate: r.read_u128()?,
        max_crossings: r.read_u32()?,
    };
    let treasury_accrued = r.read_u128()?;
    let risk_accrued = r.read_u128()?;
    let next_pool_id = r.read_u64()?;
    let next_position_id = r.read_u64()?;
    let next_cover_id = r.read_u64()?;
    let count = r.read_u32()?;
    let mut pools = Vec::with_capacity(count as usize);
    for _ in 0..count {
        pools.push(PoolEntry {
            pool_id: r.read_u64()?,
            key: r.read_pubkey()?,
        });
    }
    Ok(Registry {
        governance,
        claim_manager,
        strategy_manager,
        config,
        treasury_accrued,
        risk_accrued,
        next_pool_id,
        next_position_id,
        next_cover_id,
        pools,
    })
}

pub fn encode_pool(pool: &VirtualPool, buf: &mut [u8]) -> Result<usize, ParasolError> {
    let mut w = Writer::new(buf);
    write_header(&mut w, &POOL_MAGIC)?;
    w.write_u64(pool.pool_id)?;
    w.write_pubkey(&pool.payment_asset)?;
    w.write_u64(pool.strategy_id)?;
    w.write_u64(pool.created_at)?;
    w.write_u8(pool.paused as u8)?;
    w.write_u128(pool.fee_rate)?;
    w.write_u128(pool.formula.u_optimal)?;
    w.write_u128(pool.formula.r0)?;
    w.write_u128(pool.formula.r_slope1)?;
    w.write_u128(pool.formula.r_slope2)?;
    w.write_u128(pool.premium_rate)?;
    w.write_u128(pool.liquidity_index)?;
    w.write_u128(pool.claim_index)?;
    w.write_u128(pool.strategy_reward_index)?;
    w.write_u128(pool.total_liquidity)?;
    w.write_u32(pool.slot0.tick)?;
    w.write_u64(pool.slot0.secs_in_tick)?;
    w.write_u64(pool.slot0.seconds_per_tick)?;
    w.write_u128(pool.slot0.covered_capital)?;
    w.write_u64(pool.slot0.remaining_covers)?;
    w.write_u64(pool.slot0.last_update)?;

    w.write_len(pool.compatible_pools.len())?;
    for id in &pool.compatible_pools {
        w.write_u64(*id)?;
    }
    w.write_len(pool.overlaps.len())?;
    for (id, amount) in &pool.overlaps {
        w.write_u64(*id)?;
        w.write_u128(*amount)?;
    }
    w.write_len(pool.compensation_ids.len())?;
    for id in &pool.compensation_ids {
        w.write_u64(*id)?;
    }
    w.write_len(pool.ticks.bucket_count())?;
    for (tick, bucket) in pool.ticks.buckets() {
        w.write_u32(*tick)?;
        w.write_len(bucket.len())?;
        for id in bucket {
            w.write_u64(*id)?;
        }
    }
    w.write_len(pool.covers.len())?;
    for (id, cover) in &pool.covers {
        w.write_u64(*id)?;
        w.write_pubkey(&cover.owner)?;
        w.write_u128(cover.amount)?;
        w.write_u32(cover.start_tick)?;
        w.write_u32(cover.last_tick)?;
        w.write_u32(cover.tick_slot)?;
        w.write_u64(cover.opened_at)?;
        w.write_u64(cover.ended_at)?;
        w.write_u8(cover.end_reason)?;
    }
    Ok(w.offset)
}

pub fn decode_pool(data: &[u8]) -> Result<VirtualPool, ParasolError> {
    let mut r = Reader::new(data);
    check_header(&mut r, &POOL_MAGIC)?;
    let pool_id = r.read_u64()?;
    let payment_asset = r.read_pubkey()?;
    let strategy_id = r.read_u64()?;
    let created_at = r.read_u64()?;
    let paused = r.read_bool()?;
    let fee_rate = r.read_u128()?;
    let formula = PoolFormula {
        u_optimal: r.read_u128()?,
        r0: r.read_u128()?,
        r_slope1: r.read_u128()?,
        r_slope2: r.read_u128()?,
    };
    let premium_rate = r.read_u128()?;
    let liquidity_index = r.read_u128()?;
    let claim_index = r.read_u128()?;
    let strategy_reward_index = r.read_u128()?;
    let total_liquidity = r.read_u128()?;
    let slot0 = Slot0 {
        tick: r.read_u32()?,
        secs_in_tick: r.read_u64()?,
        seconds_per_tick: r.read_u64()?,
        covered_capital: r.read_u128()?,
        remaining_covers: r.read_u64()?,
        last_update: r.read_u64()?,
    };

    let count = r.read_u32()?;
    let mut compatible_pools = Vec::with_capacity(count as usize);
    for _ in 0..count {
        compatible_pools.push(r.read_u64()?);
    }
    let count = r.read_u32()?;
    let mut overlaps = BTreeMap::new();
    for _ in 0..count {
        let id = r.read_u64()?;
        let amount = r.read_u128()?;
        overlaps.insert(id, amount);
    }
    let count = r.read_u32()?;
    let mut compensation_ids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        compensation_ids.push(r.read_u64()?);
    }
    let count = r.read_u32()?;
    let mut buckets = BTreeMap::new();
    for _ in 0..count {
        let tick = r.read_u32()?;
        let len = r.read_u32()?;
        let mut bucket = Vec::with_capacity(len as usize);
        for _ in 0..len {
            bucket.push(r.read_u64()?);
        }
        buckets.insert(tick, bucket);
    }
    let count = r.read_u32()?;
    let mut covers = BTreeMap::new();
    for _ in 0..count {
        let id = r.read_u64()?;
        let cover = Cover {
            owner: r.read_pubkey()?,
            amount: r.read_u128()?,
            start_tick: r.read_u32()?,
            last_tick: r.read_u32()?,
            tick_slot: r.read_u32()?,
            opened_at: r.read_u64()?,
            ended_at: r.read_u64()?,
            end_reason: r.read_u8()?,
        };
        covers.insert(id, cover);
    }

    Ok(VirtualPool {
        pool_id,
        payment_asset,
        strategy_id,
        created_at,
        paused,
        fee_rate,
        formula,
        slot0,
        premium_rate,
        liquidity_index,
        claim_index,
        strategy_reward_index,
        total_liquidity,
        compatible_pools,
        overlaps,
        compensation_ids,
        ticks: TickIndex::from_buckets(buckets),
        covers,
    })
}

pub fn encode_position(position: &Position, buf: &mut [u8]) -> Result<usize, ParasolError> {
    let mut w = Writer::new(buf);
    write_header(&mut w, &POSITION_MAGIC)?;
    w.write_u64(position.position_id)?;
    w.write_pubkey(&position.owner)?;
    w.write_u128(position.supplied)?;
    w.write_u8(position.wrapped as u8)?;
    w.write_u64(position.commit_timestamp)?;
    w.write_u64(position.created_at)?;
    w.write_len(position.snapshots.len())?;
    for snap in &position.snapshots {
        w.write_u64(snap.pool_id)?;
        w.write_u128(snap.begin_liquidity_index)?;
        w.write_u128(snap.begin_claim_index)?;
        w.write_u128(snap.begin_strategy_reward_index)?;
    }
    Ok(w.offset)
}

pub fn decode_position(data: &[u8]) -> Result<Position, ParasolError> {
    let mut r = Reader::new(data);
    check_header(&mut r, &POSITION_MAGIC)?;
    let position_id = r.read_u64()?;
    let owner = r.read_pubkey()?;
    let supplied = r.read_u128()?;
    let wrapped = r.read_bool()?;
    let commit_timestamp = r.read_u64()?;
    let created_at = r.read_u64()?;
    let count = r.read_u32()?;
    let mut snapshots = Vec::with_capacity(count as usize);
    for _ in 0..count {
        snapshots.push(PoolSnapshot {
            pool_id: r.read_u64()?,
            begin_liquidity_index: r.read_u128()?,
            begin_claim_index: r.read_u128()?,
            begin_strategy_reward_index: r.read_u128()?,
        });
    }
    Ok(Position {
        position_id,
        owner,
        supplied,
        wrapped,
        commit_timestamp,
        created_at,
        snapshots,
    })
}

//! Fixed-offset view of on-chain pool clocks
//!
//! The pool codec keeps the clock fields at a stable prefix so monitors
//! can read them without decoding tick buckets and covers.

use anyhow::Result;
use parasol_manager::{CODEC_VERSION, POOL_FIXED_PREFIX_LEN, POOL_MAGIC, POOL_SLOT0_OFFSET};

// Field offsets within the fixed pool prefix, matching the program codec.
const POOL_ID_OFFSET: usize = 12;
const PAUSED_OFFSET: usize = 68;

/// Pool clock snapshot (simplified mirror of on-chain state)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolClock {
    pub pool_id: u64,
    pub paused: bool,
    pub tick: u32,
    pub secs_in_tick: u64,
    pub seconds_per_tick: u64,
    pub covered_capital: u128,
    pub remaining_covers: u64,
    pub last_update: u64,
}

impl PoolClock {
    /// Parse the clock out of raw pool account data
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < POOL_FIXED_PREFIX_LEN {
            anyhow::bail!("Pool account data too small: {} bytes", data.len());
        }

        if data[..8] != POOL_MAGIC {
            anyhow::bail!("Pool account has wrong magic");
        }

        let version = read_u32(data, 8);
        if version != CODEC_VERSION {
            anyhow::bail!("Unsupported pool codec version: {}", version);
        }

        Ok(Self {
            pool_id: read_u64(data, POOL_ID_OFFSET),
            paused: data[PAUSED_OFFSET] != 0,
            tick: read_u32(data, POOL_SLOT0_OFFSET),
            secs_in_tick: read_u64(data, POOL_SLOT0_OFFSET + 4),
            seconds_per_tick: read_u64(data, POOL_SLOT0_OFFSET + 12),
            covered_capital: read_u128(data, POOL_SLOT0_OFFSET + 20),
            remaining_covers: read_u64(data, POOL_SLOT0_OFFSET + 36),
            last_update: read_u64(data, POOL_SLOT0_OFFSET + 44),
        })
    }

    /// Estimated unix time of the next tick boundary
    ///
    /// None when the pool holds no covers; its clock may lag freely
    /// because there is nothing to expire.
    pub fn next_crossing(&self) -> Option<i64> {
        if self.remaining_covers == 0 {
            return None;
        }

        let left = self.seconds_per_tick.saturating_sub(self.secs_in_tick);
        Some((self.last_update + left) as i64)
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn read_u128(data: &[u8], offset: usize) -> u128 {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&data[offset..offset + 16]);
    u128::from_le_bytes(buf)
}

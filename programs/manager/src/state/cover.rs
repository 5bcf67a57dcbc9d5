//! Cover records and their lifecycle metadata

use pinocchio::pubkey::Pubkey;

/// Cover never ended
pub const END_REASON_NONE: u8 = 0;
/// Cover ran out of premium and was swept at a tick crossing
pub const END_REASON_EXPIRED: u8 = 1;
/// Cover was closed by its owner
pub const END_REASON_CLOSED: u8 = 2;

/// A time-bounded purchase of protection against pooled capital.
///
/// Ended covers stay in the ledger so their terms remain readable;
/// `ended_at == 0` marks the active ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cover {
    /// Buyer, the only key allowed to update or close
    pub owner: Pubkey,
    /// Capital protected
    pub amount: u128,
    /// Tick the cover was (re)priced at
    pub start_tick: u32,
    /// Tick at which the premium budget runs out
    pub last_tick: u32,
    /// Slot inside the last_tick bucket
    pub tick_slot: u32,
    /// Unix time the cover was opened
    pub opened_at: u64,
    /// Unix time the cover ended, 0 while active
    pub ended_at: u64,
    /// One of the END_REASON constants
    pub end_reason: u8,
}

impl Cover {
    pub fn is_active(&self) -> bool {
        self.ended_at == 0
    }

    pub fn end(&mut self, at: u64, reason: u8) {
        self.ended_at = at;
        self.end_reason = reason;
    }
}

/// Read-only snapshot of a cover for off-chain consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverInfo {
    pub cover_id: u64,
    pub owner: Pubkey,
    pub amount: u128,
    /// Premium rate currently charged to this cover (ray)
    pub premium_rate: u128,
    /// Budget still unconsumed at the pool's refreshed clock
    pub premiums_left: u128,
    /// Premium burned per day at the current rate
    pub current_daily_cost: u128,
    pub is_active: bool,
}

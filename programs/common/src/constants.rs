//! Protocol constants
//!
//! Passed around as named values rather than ambient globals so test code
//! can see exactly which knobs an expression depends on. The ray scale
//! itself lives in `ray_math`.

/// Seconds per year for all per-annum rate math.
pub const YEAR: u64 = 31_536_000;

/// Seconds per day, for daily premium cost quotes.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Ceiling (and initial value) for a pool's seconds-per-tick. A fresh pool
/// burns one tick per day until covers move the premium rate.
pub const MAX_SECONDS_PER_TICK: u64 = 86_400;

/// Hard bound on pools per leveraged position; `max_leverage` config may
/// lower it but never exceed it.
pub const MAX_POSITION_POOLS: usize = 8;

/// Sentinel for `premium_to_remove` meaning "all remaining premium".
pub const PREMIUM_REMOVE_ALL: u128 = u128::MAX;

//! PurgeExpired instruction - permissionless pool catch-up

use parasol_common::ParasolError;

use crate::state::{ManagerConfig, VirtualPool};

/// Advance a pool's clock, crossing at most `max_crossings` expiry ticks.
///
/// Anyone may call this, paused pools included. A zero argument means the
/// configured ceiling; larger requests are clamped to it. Partial progress
/// is kept, so walking a long-idle pool forward is a matter of calling
/// again. Returns whether the pool is now fully caught up.
pub fn process_purge_expired(
    config: &ManagerConfig,
    pool: &mut VirtualPool,
    max_crossings: u32,
    now: u64,
) -> Result<bool, ParasolError> {
    let cap = if max_crossings == 0 {
        config.max_crossings
    } else {
        max_crossings.min(config.max_crossings)
    };
    pool.refresh(now, cap)
}

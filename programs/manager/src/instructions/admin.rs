//! Governance instructions - pause switch and config updates

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use crate::state::{ManagerConfig, Registry, VirtualPool};

/// Flip a pool's pause switch. Governance only.
///
/// A paused pool refuses new covers, cover changes, and liquidity moves;
/// expiry processing and claim settlement keep running.
pub fn process_set_pool_paused(
    registry: &Registry,
    pool: &mut VirtualPool,
    caller: &Pubkey,
    paused: bool,
) -> Result<(), ParasolError> {
    if *caller != registry.governance {
        return Err(ParasolError::Unauthorized);
    }
    pool.paused = paused;
    Ok(())
}

/// Replace the numeric configuration. Governance only.
///
/// Authorities are not rotated here; they are fixed at initialization.
pub fn process_update_config(
    registry: &mut Registry,
    caller: &Pubkey,
    config: ManagerConfig,
) -> Result<(), ParasolError> {
    if *caller != registry.governance {
        return Err(ParasolError::Unauthorized);
    }
    config.validate()?;
    registry.config = config;
    Ok(())
}

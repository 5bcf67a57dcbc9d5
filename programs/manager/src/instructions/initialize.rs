//! Initialize instruction - create the manager registry

use parasol_common::ParasolError;
use pinocchio::pubkey::Pubkey;

use crate::state::{ManagerConfig, Registry};

/// Build the initial registry state.
///
/// Called once at deployment. The three authorities are fixed here;
/// `UpdateConfig` can later replace the numeric configuration but not
/// the authorities.
pub fn process_initialize(
    governance: Pubkey,
    claim_manager: Pubkey,
    strategy_manager: Pubkey,
    config: ManagerConfig,
) -> Result<Registry, ParasolError> {
    Registry::new(governance, claim_manager, strategy_manager, config)
}

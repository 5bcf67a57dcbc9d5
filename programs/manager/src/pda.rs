//! PDA derivation for the manager program

use pinocchio::pubkey::{find_program_address, Pubkey};

/// Seed for the singleton registry account.
pub const REGISTRY_SEED: &[u8] = b"registry";

/// Derive the registry PDA for this program.
pub fn derive_registry_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[REGISTRY_SEED], program_id)
}

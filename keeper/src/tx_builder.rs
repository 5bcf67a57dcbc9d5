//! Transaction builder for pool purges

use parasol_manager::ManagerInstruction;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};

/// Build purge_expired instruction
///
/// This constructs the purge_expired instruction the keeper submits to
/// process tick crossings on a pool whose clock fell behind.
pub fn build_purge_instruction(
    manager_program: &Pubkey,
    registry: &Pubkey,
    pool: &Pubkey,
    max_crossings: u32,
) -> Instruction {
    // Instruction data: discriminator + max_crossings
    let mut data = vec![ManagerInstruction::PurgeExpired as u8];
    data.extend_from_slice(&max_crossings.to_le_bytes());

    // Build account metas; purging needs no signer, the keeper only
    // pays the fee
    let accounts = vec![
        AccountMeta::new_readonly(*registry, false),
        AccountMeta::new(*pool, false),
    ];

    Instruction {
        program_id: *manager_program,
        accounts,
        data,
    }
}

/// Build transaction for a purge
pub fn build_purge_transaction(
    manager_program: &Pubkey,
    registry: &Pubkey,
    pool: &Pubkey,
    max_crossings: u32,
    keeper: &Keypair,
    recent_blockhash: solana_sdk::hash::Hash,
) -> Transaction {
    let instruction = build_purge_instruction(manager_program, registry, pool, max_crossings);

    Transaction::new_signed_with_payer(
        &[instruction],
        Some(&keeper.pubkey()),
        &[keeper],
        recent_blockhash,
    )
}

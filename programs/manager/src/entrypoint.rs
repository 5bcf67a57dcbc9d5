//! Manager program entrypoint

use alloc::vec::Vec;

use pinocchio::{
    account_info::AccountInfo,
    entrypoint,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvars::{clock::Clock, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;

use crate::instructions::{
    process_add_liquidity, process_close_cover, process_commit_remove_liquidity,
    process_create_pool, process_initialize, process_open_cover, process_open_position,
    process_purge_expired, process_push_strategy_reward, process_register_compensation,
    process_remove_liquidity, process_set_pool_paused, process_take_interest,
    process_uncommit_remove_liquidity, process_update_config, process_update_cover,
    CreatePoolArgs, ManagerInstruction, SettleOutcome,
};
use crate::pda::derive_registry_pda;
use crate::state::{
    decode_pool, decode_position, decode_registry, encode_pool, encode_position,
    encode_registry, ensure_uninitialized, ManagerConfig, PoolFormula, Position, Registry,
    VirtualPool,
};
use parasol_common::{
    validate_owner, validate_signer, validate_writable, InstructionReader, ParasolError,
};

entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if instruction_data.is_empty() {
        msg!("Error: Instruction data is empty");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let discriminator = instruction_data[0];
    let instruction = match discriminator {
        0 => ManagerInstruction::Initialize,
        1 => ManagerInstruction::CreatePool,
        2 => ManagerInstruction::OpenPosition,
        3 => ManagerInstruction::AddLiquidity,
        4 => ManagerInstruction::CommitRemoveLiquidity,
        5 => ManagerInstruction::UncommitRemoveLiquidity,
        6 => ManagerInstruction::RemoveLiquidity,
        7 => ManagerInstruction::TakeInterest,
        8 => ManagerInstruction::OpenCover,
        9 => ManagerInstruction::UpdateCover,
        10 => ManagerInstruction::CloseCover,
        11 => ManagerInstruction::PurgeExpired,
        12 => ManagerInstruction::RegisterCompensation,
        13 => ManagerInstruction::PushStrategyReward,
        14 => ManagerInstruction::SetPoolPaused,
        15 => ManagerInstruction::UpdateConfig,
        _ => {
            msg!("Error: Unknown instruction");
            return Err(ParasolError::InvalidInstruction.into());
        }
    };

    match instruction {
        ManagerInstruction::Initialize => {
            msg!("Instruction: Initialize");
            process_initialize_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::CreatePool => {
            msg!("Instruction: CreatePool");
            process_create_pool_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::OpenPosition => {
            msg!("Instruction: OpenPosition");
            process_open_position_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::AddLiquidity => {
            msg!("Instruction: AddLiquidity");
            process_add_liquidity_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::CommitRemoveLiquidity => {
            msg!("Instruction: CommitRemoveLiquidity");
            process_commit_remove_liquidity_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::UncommitRemoveLiquidity => {
            msg!("Instruction: UncommitRemoveLiquidity");
            process_uncommit_remove_liquidity_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::RemoveLiquidity => {
            msg!("Instruction: RemoveLiquidity");
            process_remove_liquidity_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::TakeInterest => {
            msg!("Instruction: TakeInterest");
            process_take_interest_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::OpenCover => {
            msg!("Instruction: OpenCover");
            process_open_cover_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::UpdateCover => {
            msg!("Instruction: UpdateCover");
            process_update_cover_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::CloseCover => {
            msg!("Instruction: CloseCover");
            process_close_cover_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::PurgeExpired => {
            msg!("Instruction: PurgeExpired");
            process_purge_expired_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::RegisterCompensation => {
            msg!("Instruction: RegisterCompensation");
            process_register_compensation_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::PushStrategyReward => {
            msg!("Instruction: PushStrategyReward");
            process_push_strategy_reward_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::SetPoolPaused => {
            msg!("Instruction: SetPoolPaused");
            process_set_pool_paused_inner(program_id, accounts, &instruction_data[1..])
        }
        ManagerInstruction::UpdateConfig => {
            msg!("Instruction: UpdateConfig");
            process_update_config_inner(program_id, accounts, &instruction_data[1..])
        }
    }
}

// Account loading helpers

fn current_time() -> Result<u64, ProgramError> {
    let clock = Clock::get()?;
    Ok(clock.unix_timestamp as u64)
}

/// Verify the registry account is the program's registry PDA.
fn expect_registry_account(
    program_id: &Pubkey,
    account: &AccountInfo,
) -> Result<(), ProgramError> {
    let (expected, _bump) = derive_registry_pda(program_id);
    if account.key() != &expected {
        msg!("Error: Registry account is not the correct PDA");
        return Err(ParasolError::AccountMismatch.into());
    }
    validate_owner(account, program_id)?;
    Ok(())
}

fn load_registry(account: &AccountInfo) -> Result<Registry, ProgramError> {
    let data = account.try_borrow_data()?;
    Ok(decode_registry(&data)?)
}

fn store_registry(account: &AccountInfo, registry: &Registry) -> ProgramResult {
    let mut data = account.try_borrow_mut_data()?;
    encode_registry(registry, &mut data[..])?;
    Ok(())
}

fn load_position(account: &AccountInfo) -> Result<Position, ProgramError> {
    let data = account.try_borrow_data()?;
    Ok(decode_position(&data)?)
}

fn store_position(account: &AccountInfo, position: &Position) -> ProgramResult {
    let mut data = account.try_borrow_mut_data()?;
    encode_position(position, &mut data[..])?;
    Ok(())
}

fn load_pool(account: &AccountInfo) -> Result<VirtualPool, ProgramError> {
    let data = account.try_borrow_data()?;
    Ok(decode_pool(&data)?)
}

fn store_pool(account: &AccountInfo, pool: &VirtualPool) -> ProgramResult {
    let mut data = account.try_borrow_mut_data()?;
    encode_pool(pool, &mut data[..])?;
    Ok(())
}

/// Load a batch of pool accounts, checking each against the registry
/// directory so a foreign account cannot stand in for a pool.
fn load_pools(
    program_id: &Pubkey,
    registry: &Registry,
    accounts: &[AccountInfo],
) -> Result<Vec<VirtualPool>, ProgramError> {
    let mut pools = Vec::with_capacity(accounts.len());
    for account in accounts {
        validate_owner(account, program_id)?;
        validate_writable(account)?;
        let pool = load_pool(account)?;
        registry.expect_pool_key(pool.pool_id, account.key())?;
        pools.push(pool);
    }
    Ok(pools)
}

fn store_pools(accounts: &[AccountInfo], pools: &[VirtualPool]) -> ProgramResult {
    for (account, pool) in accounts.iter().zip(pools.iter()) {
        store_pool(account, pool)?;
    }
    Ok(())
}

/// Log the fee legs of a settlement so off-chain accounting can follow
/// the treasury and risk-wallet accruals.
fn log_fees(outcome: &SettleOutcome) {
    if outcome.protocol_fees > 0 {
        log!("protocol fee: {}", outcome.protocol_fees as u64);
    }
    if outcome.leverage_fee > 0 {
        log!("leverage fee: {}", outcome.leverage_fee as u64);
    }
    if outcome.treasury_payout > 0 {
        log!("treasury interest: {}", outcome.treasury_payout as u64);
    }
}

fn read_config(reader: &mut InstructionReader) -> Result<ManagerConfig, ParasolError> {
    Ok(ManagerConfig {
        withdraw_delay: reader.read_u64()?,
        max_leverage: reader.read_u8()?,
        leverage_fee_rate: reader.read_u128()?,
        max_crossings: reader.read_u32()?,
    })
}

// Instruction processors with account validation

/// Process initialize instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[signer]` Governance authority
///
/// Expected data layout (125 bytes):
/// - governance: Pubkey (32 bytes)
/// - claim_manager: Pubkey (32 bytes)
/// - strategy_manager: Pubkey (32 bytes)
/// - withdraw_delay: u64 (8 bytes)
/// - max_leverage: u8 (1 byte)
/// - leverage_fee_rate: u128 (16 bytes)
/// - max_crossings: u32 (4 bytes)
fn process_initialize_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        msg!("Error: Initialize instruction requires at least 2 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let governance_account = &accounts[1];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_signer(governance_account)?;

    let mut reader = InstructionReader::new(data);
    let governance = reader.read_pubkey()?;
    let claim_manager = reader.read_pubkey()?;
    let strategy_manager = reader.read_pubkey()?;
    let config = read_config(&mut reader)?;

    if governance_account.key() != &governance {
        msg!("Error: Governance account does not match instruction data");
        return Err(ParasolError::AccountMismatch.into());
    }

    {
        let existing = registry_account.try_borrow_data()?;
        ensure_uninitialized(&existing)?;
    }

    let registry = process_initialize(governance, claim_manager, strategy_manager, config)?;
    store_registry(registry_account, &registry)?;

    msg!("Manager initialized successfully");
    Ok(())
}

/// Process create pool instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` New pool account
/// 2. `[signer]` Governance authority
/// 3..N. `[writable]` Compatible pool accounts, in instruction-data order
///
/// Expected data layout (121 + 8 * count bytes):
/// - payment_asset: Pubkey (32 bytes)
/// - strategy_id: u64 (8 bytes)
/// - fee_rate: u128 (16 bytes)
/// - formula: 4 x u128 (64 bytes)
/// - compatible_count: u8 (1 byte)
/// - compatible_pools: [u64; count]
fn process_create_pool_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: CreatePool instruction requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let governance_account = &accounts[2];
    let compat_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(governance_account)?;

    let mut registry = load_registry(registry_account)?;
    if governance_account.key() != &registry.governance {
        msg!("Error: Only governance may create pools");
        return Err(ParasolError::Unauthorized.into());
    }

    let mut reader = InstructionReader::new(data);
    let payment_asset = reader.read_pubkey()?;
    let strategy_id = reader.read_u64()?;
    let fee_rate = reader.read_u128()?;
    let formula = PoolFormula {
        u_optimal: reader.read_u128()?,
        r0: reader.read_u128()?,
        r_slope1: reader.read_u128()?,
        r_slope2: reader.read_u128()?,
    };
    let compatible_count = reader.read_u8()?;
    let mut compatible_pools = Vec::with_capacity(compatible_count as usize);
    for _ in 0..compatible_count {
        compatible_pools.push(reader.read_u64()?);
    }

    {
        let existing = pool_account.try_borrow_data()?;
        ensure_uninitialized(&existing)?;
    }

    let mut compat = load_pools(program_id, &registry, compat_accounts)?;
    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = compat.iter_mut().collect();
    let pool = process_create_pool(
        &mut registry,
        *pool_account.key(),
        &mut refs,
        CreatePoolArgs {
            payment_asset,
            strategy_id,
            fee_rate,
            formula,
            compatible_pools,
        },
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_pool(pool_account, &pool)?;
    store_pools(compat_accounts, &compat)?;

    log!("pool created: {}", pool.pool_id);
    Ok(())
}

/// Process open position instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` New position account
/// 2. `[signer]` Position owner
/// 3..N. `[writable]` Pool accounts, ascending by pool id
///
/// Expected data layout (17 bytes):
/// - amount: u128 (16 bytes)
/// - wrapped: u8 (1 byte)
fn process_open_position_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: OpenPosition instruction requires at least 4 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let position_account = &accounts[1];
    let owner_account = &accounts[2];
    let pool_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_signer(owner_account)?;

    {
        let existing = position_account.try_borrow_data()?;
        ensure_uninitialized(&existing)?;
    }

    let mut registry = load_registry(registry_account)?;
    let mut pools = load_pools(program_id, &registry, pool_accounts)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u128()?;
    let wrapped = reader.read_u8()? != 0;

    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = pools.iter_mut().collect();
    let position = process_open_position(
        &mut registry,
        &mut refs,
        *owner_account.key(),
        amount,
        wrapped,
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_position(position_account, &position)?;
    store_pools(pool_accounts, &pools)?;

    log!("position opened: {}", position.position_id);
    Ok(())
}

/// Process add liquidity instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` Position account
/// 2. `[signer]` Position owner
/// 3..N. `[writable]` Pool accounts, in the position's order
///
/// Expected data layout (16 bytes):
/// - amount: u128 (16 bytes)
fn process_add_liquidity_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: AddLiquidity instruction requires at least 4 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let position_account = &accounts[1];
    let owner_account = &accounts[2];
    let pool_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_signer(owner_account)?;

    let mut registry = load_registry(registry_account)?;
    let mut position = load_position(position_account)?;
    let mut pools = load_pools(program_id, &registry, pool_accounts)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u128()?;

    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = pools.iter_mut().collect();
    let outcome = process_add_liquidity(
        &mut registry,
        &mut position,
        &mut refs,
        owner_account.key(),
        amount,
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_position(position_account, &position)?;
    store_pools(pool_accounts, &pools)?;

    log!("interest paid: {}", outcome.owner_payout as u64);
    log_fees(&outcome);
    Ok(())
}

/// Process commit remove liquidity instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` Position account
/// 2. `[signer]` Position owner
/// 3..N. `[writable]` Pool accounts, in the position's order
///
/// No instruction data.
fn process_commit_remove_liquidity_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    _data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: CommitRemoveLiquidity requires at least 4 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let position_account = &accounts[1];
    let owner_account = &accounts[2];
    let pool_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_signer(owner_account)?;

    let mut registry = load_registry(registry_account)?;
    let mut position = load_position(position_account)?;
    let mut pools = load_pools(program_id, &registry, pool_accounts)?;

    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = pools.iter_mut().collect();
    let outcome = process_commit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut refs,
        owner_account.key(),
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_position(position_account, &position)?;
    store_pools(pool_accounts, &pools)?;

    msg!("Withdrawal committed");
    if outcome.owner_payout > 0 {
        log!("interest paid: {}", outcome.owner_payout as u64);
    }
    log_fees(&outcome);
    Ok(())
}

/// Process uncommit remove liquidity instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` Position account
/// 2. `[signer]` Position owner
/// 3..N. `[writable]` Pool accounts, in the position's order
///
/// No instruction data.
fn process_uncommit_remove_liquidity_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    _data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: UncommitRemoveLiquidity requires at least 4 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let position_account = &accounts[1];
    let owner_account = &accounts[2];
    let pool_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_signer(owner_account)?;

    let mut registry = load_registry(registry_account)?;
    let mut position = load_position(position_account)?;
    let mut pools = load_pools(program_id, &registry, pool_accounts)?;

    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = pools.iter_mut().collect();
    let outcome = process_uncommit_remove_liquidity(
        &mut registry,
        &mut position,
        &mut refs,
        owner_account.key(),
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_position(position_account, &position)?;
    store_pools(pool_accounts, &pools)?;

    msg!("Withdrawal commitment cancelled");
    log_fees(&outcome);
    Ok(())
}

/// Process remove liquidity instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` Position account
/// 2. `[signer]` Position owner
/// 3..N. `[writable]` Pool accounts, in the position's order
///
/// Expected data layout (16 bytes):
/// - amount: u128 (16 bytes)
fn process_remove_liquidity_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: RemoveLiquidity instruction requires at least 4 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let position_account = &accounts[1];
    let owner_account = &accounts[2];
    let pool_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_signer(owner_account)?;

    let mut registry = load_registry(registry_account)?;
    let mut position = load_position(position_account)?;
    let mut pools = load_pools(program_id, &registry, pool_accounts)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u128()?;

    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = pools.iter_mut().collect();
    let outcome = process_remove_liquidity(
        &mut registry,
        &mut position,
        &mut refs,
        owner_account.key(),
        amount,
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_position(position_account, &position)?;
    store_pools(pool_accounts, &pools)?;

    log!("liquidity removed: {}", amount as u64);
    log_fees(&outcome);
    Ok(())
}

/// Process take interest instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` Position account
/// 2. `[signer]` Position owner
/// 3..N. `[writable]` Pool accounts, in the position's order
///
/// No instruction data.
fn process_take_interest_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    _data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: TakeInterest instruction requires at least 4 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let position_account = &accounts[1];
    let owner_account = &accounts[2];
    let pool_accounts = &accounts[3..];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_signer(owner_account)?;

    let mut registry = load_registry(registry_account)?;
    let mut position = load_position(position_account)?;
    let mut pools = load_pools(program_id, &registry, pool_accounts)?;

    let now = current_time()?;
    let mut refs: Vec<&mut VirtualPool> = pools.iter_mut().collect();
    let outcome = process_take_interest(
        &mut registry,
        &mut position,
        &mut refs,
        owner_account.key(),
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_position(position_account, &position)?;
    store_pools(pool_accounts, &pools)?;

    log!("interest paid: {}", outcome.owner_payout as u64);
    log_fees(&outcome);
    Ok(())
}

/// Process open cover instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[writable]` Pool account
/// 2. `[signer]` Cover owner
///
/// Expected data layout (32 bytes):
/// - amount: u128 (16 bytes)
/// - premium_budget: u128 (16 bytes)
fn process_open_cover_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: OpenCover instruction requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let owner_account = &accounts[2];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(owner_account)?;

    let mut registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u128()?;
    let premium_budget = reader.read_u128()?;

    let now = current_time()?;
    let cover_id = process_open_cover(
        &mut registry,
        &mut pool,
        *owner_account.key(),
        amount,
        premium_budget,
        now,
    )?;

    store_registry(registry_account, &registry)?;
    store_pool(pool_account, &pool)?;

    log!("cover opened: {}", cover_id);
    log!("premium added: {}", premium_budget as u64);
    Ok(())
}

/// Process update cover instruction
///
/// Expected accounts:
/// 0. `[]` Registry account (PDA)
/// 1. `[writable]` Pool account
/// 2. `[signer]` Cover owner
///
/// Expected data layout (72 bytes):
/// - cover_id: u64 (8 bytes)
/// - amount_to_add: u128 (16 bytes)
/// - amount_to_remove: u128 (16 bytes)
/// - premium_to_add: u128 (16 bytes)
/// - premium_to_remove: u128 (16 bytes)
fn process_update_cover_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: UpdateCover instruction requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let owner_account = &accounts[2];

    expect_registry_account(program_id, registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(owner_account)?;

    let registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let cover_id = reader.read_u64()?;
    let amount_to_add = reader.read_u128()?;
    let amount_to_remove = reader.read_u128()?;
    let premium_to_add = reader.read_u128()?;
    let premium_to_remove = reader.read_u128()?;

    let now = current_time()?;
    let change = process_update_cover(
        &registry.config,
        &mut pool,
        owner_account.key(),
        cover_id,
        amount_to_add,
        amount_to_remove,
        premium_to_add,
        premium_to_remove,
        now,
    )?;

    store_pool(pool_account, &pool)?;

    if premium_to_add > 0 {
        log!("premium added: {}", premium_to_add as u64);
    }
    log!("cover updated, refund: {}", change.refund as u64);
    Ok(())
}

/// Process close cover instruction
///
/// Expected accounts:
/// 0. `[]` Registry account (PDA)
/// 1. `[writable]` Pool account
/// 2. `[signer]` Cover owner
///
/// Expected data layout (8 bytes):
/// - cover_id: u64 (8 bytes)
fn process_close_cover_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: CloseCover instruction requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let owner_account = &accounts[2];

    expect_registry_account(program_id, registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(owner_account)?;

    let registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let cover_id = reader.read_u64()?;

    let now = current_time()?;
    let refund = process_close_cover(
        &registry.config,
        &mut pool,
        owner_account.key(),
        cover_id,
        now,
    )?;

    store_pool(pool_account, &pool)?;

    log!("cover closed, refund: {}", refund as u64);
    Ok(())
}

/// Process purge expired instruction
///
/// Expected accounts:
/// 0. `[]` Registry account (PDA)
/// 1. `[writable]` Pool account
///
/// Expected data layout (4 bytes):
/// - max_crossings: u32 (4 bytes), 0 for the configured ceiling
fn process_purge_expired_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        msg!("Error: PurgeExpired instruction requires at least 2 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];

    expect_registry_account(program_id, registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;

    let registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let max_crossings = reader.read_u32()?;

    let now = current_time()?;
    let done = process_purge_expired(&registry.config, &mut pool, max_crossings, now)?;

    store_pool(pool_account, &pool)?;

    if done {
        msg!("Pool caught up");
    } else {
        log!("covers remaining: {}", pool.slot0.remaining_covers);
    }
    Ok(())
}

/// Process register compensation instruction
///
/// Expected accounts:
/// 0. `[]` Registry account (PDA)
/// 1. `[writable]` Pool account
/// 2. `[signer]` Claim manager authority
///
/// Expected data layout (24 bytes):
/// - claim_id: u64 (8 bytes)
/// - amount: u128 (16 bytes)
fn process_register_compensation_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: RegisterCompensation requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let caller_account = &accounts[2];

    expect_registry_account(program_id, registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(caller_account)?;

    let registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let claim_id = reader.read_u64()?;
    let amount = reader.read_u128()?;

    let now = current_time()?;
    process_register_compensation(
        &registry,
        &mut pool,
        caller_account.key(),
        claim_id,
        amount,
        now,
    )?;

    store_pool(pool_account, &pool)?;

    log!("compensation registered: {}", claim_id);
    Ok(())
}

/// Process push strategy reward instruction
///
/// Expected accounts:
/// 0. `[]` Registry account (PDA)
/// 1. `[writable]` Pool account
/// 2. `[signer]` Strategy manager authority
///
/// Expected data layout (16 bytes):
/// - amount: u128 (16 bytes)
fn process_push_strategy_reward_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: PushStrategyReward requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let caller_account = &accounts[2];

    expect_registry_account(program_id, registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(caller_account)?;

    let registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u128()?;

    process_push_strategy_reward(&registry, &mut pool, caller_account.key(), amount)?;

    store_pool(pool_account, &pool)?;

    msg!("Strategy reward credited");
    Ok(())
}

/// Process set pool paused instruction
///
/// Expected accounts:
/// 0. `[]` Registry account (PDA)
/// 1. `[writable]` Pool account
/// 2. `[signer]` Governance authority
///
/// Expected data layout (1 byte):
/// - paused: u8 (1 byte, 0 or 1)
fn process_set_pool_paused_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: SetPoolPaused instruction requires at least 3 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let pool_account = &accounts[1];
    let caller_account = &accounts[2];

    expect_registry_account(program_id, registry_account)?;
    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(caller_account)?;

    let registry = load_registry(registry_account)?;
    let mut pool = load_pool(pool_account)?;
    registry.expect_pool_key(pool.pool_id, pool_account.key())?;

    let mut reader = InstructionReader::new(data);
    let paused = reader.read_u8()? != 0;

    process_set_pool_paused(&registry, &mut pool, caller_account.key(), paused)?;

    store_pool(pool_account, &pool)?;

    if paused {
        msg!("Pool paused");
    } else {
        msg!("Pool unpaused");
    }
    Ok(())
}

/// Process update config instruction
///
/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[signer]` Governance authority
///
/// Expected data layout (29 bytes):
/// - withdraw_delay: u64 (8 bytes)
/// - max_leverage: u8 (1 byte)
/// - leverage_fee_rate: u128 (16 bytes)
/// - max_crossings: u32 (4 bytes)
fn process_update_config_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        msg!("Error: UpdateConfig instruction requires at least 2 accounts");
        return Err(ParasolError::InvalidInstruction.into());
    }

    let registry_account = &accounts[0];
    let caller_account = &accounts[1];

    expect_registry_account(program_id, registry_account)?;
    validate_writable(registry_account)?;
    validate_signer(caller_account)?;

    let mut registry = load_registry(registry_account)?;

    let mut reader = InstructionReader::new(data);
    let config = read_config(&mut reader)?;

    process_update_config(&mut registry, caller_account.key(), config)?;

    store_registry(registry_account, &registry)?;

    msg!("Config updated");
    Ok(())
}

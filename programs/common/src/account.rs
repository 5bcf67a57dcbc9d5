//! Account validation helpers shared by instruction plumbing

use crate::error::ParasolError;
use pinocchio::account_info::AccountInfo;
use pinocchio::pubkey::Pubkey;

/// Require the account to be owned by `expected` (normally the program id).
#[inline]
pub fn validate_owner(account: &AccountInfo, expected: &Pubkey) -> Result<(), ParasolError> {
    if account.owner() != expected {
        return Err(ParasolError::InvalidAccountOwner);
    }
    Ok(())
}

/// Require the account to be writable.
#[inline]
pub fn validate_writable(account: &AccountInfo) -> Result<(), ParasolError> {
    if !account.is_writable() {
        return Err(ParasolError::AccountNotWritable);
    }
    Ok(())
}

/// Require the account to have signed the transaction.
#[inline]
pub fn validate_signer(account: &AccountInfo) -> Result<(), ParasolError> {
    if !account.is_signer() {
        return Err(ParasolError::MissingSignature);
    }
    Ok(())
}

/// Require the account key to equal a recorded key.
#[inline]
pub fn validate_key(account: &AccountInfo, expected: &Pubkey) -> Result<(), ParasolError> {
    if account.key() != expected {
        return Err(ParasolError::AccountMismatch);
    }
    Ok(())
}

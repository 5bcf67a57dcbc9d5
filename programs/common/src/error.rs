//! Shared error taxonomy for the parasol programs
//!
//! Every failure is a named, locally-recoverable condition; a rejected call
//! leaves account state exactly as it was. Arithmetic overflow is surfaced
//! as `Overflow` and aborts the call rather than wrapping.

use pinocchio::program_error::ProgramError;
use ray_math::MathError;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParasolError {
    // Instruction / account surface
    InvalidInstruction = 1,
    InvalidAccountOwner = 2,
    AccountNotWritable = 3,
    MissingSignature = 4,
    BadAccountMagic = 5,
    AlreadyInitialized = 6,
    AccountTooSmall = 7,
    /// Passed account does not match the key recorded for that id
    AccountMismatch = 8,

    // Arithmetic
    Overflow = 9,

    // Capacity / validation
    InsufficientCapacity = 10,
    DurationTooLow = 11,
    AmountOfPoolsIsAboveMaxLeverage = 12,
    PoolIdsMustBeUniqueAndAscending = 13,
    IncompatiblePools = 14,
    BadAmount = 15,
    InvalidFormula = 16,

    // State conflicts
    CoverIsExpired = 17,
    CoverNotFound = 18,
    PoolIsPaused = 19,
    PoolNotFound = 20,
    WithdrawCommitDelayNotReached = 21,
    PositionNotCommitted = 22,
    /// Refresh hit the crossing cap; crank PurgeExpired first
    TooManyExpiredCovers = 23,

    // Authorization
    OnlyPositionOwner = 24,
    OnlyCoverOwner = 25,
    Unauthorized = 26,
}

impl ParasolError {
    /// Stable name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ParasolError::InvalidInstruction => "InvalidInstruction",
            ParasolError::InvalidAccountOwner => "InvalidAccountOwner",
            ParasolError::AccountNotWritable => "AccountNotWritable",
            ParasolError::MissingSignature => "MissingSignature",
            ParasolError::BadAccountMagic => "BadAccountMagic",
            ParasolError::AlreadyInitialized => "AlreadyInitialized",
            ParasolError::AccountTooSmall => "AccountTooSmall",
            ParasolError::AccountMismatch => "AccountMismatch",
            ParasolError::Overflow => "Overflow",
            ParasolError::InsufficientCapacity => "InsufficientCapacity",
            ParasolError::DurationTooLow => "DurationTooLow",
            ParasolError::AmountOfPoolsIsAboveMaxLeverage => {
                "AmountOfPoolsIsAboveMaxLeverage"
            }
            ParasolError::PoolIdsMustBeUniqueAndAscending => {
                "PoolIdsMustBeUniqueAndAscending"
            }
            ParasolError::IncompatiblePools => "IncompatiblePools",
            ParasolError::BadAmount => "BadAmount",
            ParasolError::InvalidFormula => "InvalidFormula",
            ParasolError::CoverIsExpired => "CoverIsExpired",
            ParasolError::CoverNotFound => "CoverNotFound",
            ParasolError::PoolIsPaused => "PoolIsPaused",
            ParasolError::PoolNotFound => "PoolNotFound",
            ParasolError::WithdrawCommitDelayNotReached => {
                "WithdrawCommitDelayNotReached"
            }
            ParasolError::PositionNotCommitted => "PositionNotCommitted",
            ParasolError::TooManyExpiredCovers => "TooManyExpiredCovers",
            ParasolError::OnlyPositionOwner => "OnlyPositionOwner",
            ParasolError::OnlyCoverOwner => "OnlyCoverOwner",
            ParasolError::Unauthorized => "Unauthorized",
        }
    }
}

impl From<ParasolError> for ProgramError {
    fn from(e: ParasolError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl From<MathError> for ParasolError {
    fn from(_: MathError) -> Self {
        // Division by zero only arises from corrupt state, treat it the
        // same as overflow: abort the call
        ParasolError::Overflow
    }
}

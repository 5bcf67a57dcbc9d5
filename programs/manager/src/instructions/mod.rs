//! Manager instruction handlers

pub mod add_liquidity;
pub mod admin;
pub mod close_cover;
pub mod commit_withdrawal;
pub mod create_pool;
pub mod initialize;
pub mod open_cover;
pub mod open_position;
pub mod purge_expired;
pub mod register_compensation;
pub mod remove_liquidity;
pub mod settle;
pub mod strategy_reward;
pub mod take_interest;
pub mod update_cover;

pub use add_liquidity::*;
pub use admin::*;
pub use close_cover::*;
pub use commit_withdrawal::*;
pub use create_pool::*;
pub use initialize::*;
pub use open_cover::*;
pub use open_position::*;
pub use purge_expired::*;
pub use register_compensation::*;
pub use remove_liquidity::*;
pub use settle::*;
pub use strategy_reward::*;
pub use take_interest::*;
pub use update_cover::*;

/// Instruction discriminator
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerInstruction {
    /// Initialize the manager registry
    Initialize = 0,
    /// Create a virtual pool and wire its compatibility list
    CreatePool = 1,
    /// Open a leveraged LP position across one or more pools
    OpenPosition = 2,
    /// Add capital to an existing position
    AddLiquidity = 3,
    /// Start the withdrawal delay clock on a position
    CommitRemoveLiquidity = 4,
    /// Cancel a pending withdrawal commitment
    UncommitRemoveLiquidity = 5,
    /// Withdraw committed capital from a position
    RemoveLiquidity = 6,
    /// Realize accrued interest without moving capital
    TakeInterest = 7,
    /// Buy cover against a pool
    OpenCover = 8,
    /// Change a cover's amount or premium budget
    UpdateCover = 9,
    /// Close a cover and refund the unspent premium
    CloseCover = 10,
    /// Advance a pool's clock past expired covers (permissionless)
    PurgeExpired = 11,
    /// Burn pool capital for a resolved claim (claim manager only)
    RegisterCompensation = 12,
    /// Credit external strategy yield to a pool (strategy manager only)
    PushStrategyReward = 13,
    /// Pause or unpause a pool (governance only)
    SetPoolPaused = 14,
    /// Replace the manager configuration (governance only)
    UpdateConfig = 15,
}

// Note: Instruction dispatching is handled in entrypoint.rs
// The functions in this module are called from the entrypoint after
// account deserialization and validation.

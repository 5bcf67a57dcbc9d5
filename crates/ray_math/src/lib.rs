//! Pure fixed-point arithmetic for premium and index accounting
//! No Solana dependencies, no unwrap/panic, all functions total

#![cfg_attr(not(test), no_std)]

pub mod ray;
pub mod wide;

// Re-export commonly used items
pub use ray::*;
pub use wide::*;

#![no_std]

pub mod account;
pub mod constants;
pub mod error;
pub mod instruction;

pub use account::*;
pub use constants::*;
pub use error::*;
pub use instruction::*;

//! Scenario tests for the parasol manager.
//!
//! These drive the state-level instruction handlers end to end, the same
//! functions the on-chain entrypoint dispatches to after account decoding,
//! so every scenario exercises the deployed arithmetic and error paths
//! without a validator in the loop.

pub mod harness;

pub use harness::*;

#![cfg_attr(target_os = "solana", no_std)]

extern crate alloc;

pub mod instructions;
pub mod pda;
pub mod state;

#[cfg(feature = "bpf-entrypoint")]
mod entrypoint;

// Panic handler for no_std builds without the entrypoint macro (which
// installs its own).
#[cfg(all(target_os = "solana", not(test), not(feature = "bpf-entrypoint")))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

pub use instructions::*;
pub use state::*;

pinocchio_pubkey::declare_id!("PgeK4NTqzu1FLSUvhEhVAcDU8Va18nAjkmBej5M846R");

//! Lamport custody program.
//!
//! A signer deposits lamports into a custody account and later withdraws
//! them. The custody account is either an explicitly created 40-byte account
//! or the owner's derived address, which the program allocates on the first
//! deposit.
//!
//! Instruction data is a fixed 9-byte layout (see [`instruction`]); the
//! transition rules live in [`state::machine`] so off-chain ledgers can run
//! exactly what the program runs.

pub mod common;
pub mod constants;
pub mod error;
pub mod instruction;
pub mod instructions;
pub mod macros;
pub mod pda;
pub mod policy;
pub mod processor;
pub mod state;

pub use processor::process_instruction;

solana_program::declare_id!("EbKQVLUFJp38qanC4NwQUqsrWrRV4MUMhFRmTTJKHNMC");

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

//! Off-chain driver for the lamport custody program.
//!
//! [`CustodyClient`] assembles deposit and withdraw envelopes for one owner
//! and hands them to a [`Ledger`]. [`LocalLedger`] executes envelopes in
//! memory with the same state machine the program runs.

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod local;

pub use client::{CustodyClient, CustodyTarget};
pub use config::{AccountMode, ClientConfig};
pub use error::ClientError;
pub use ledger::{Ledger, LedgerAccount};
pub use local::LocalLedger;

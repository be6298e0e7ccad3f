use crate::error::ClientError;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

/// Snapshot of an account as stored by a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerAccount {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

/// The chain as seen from the client: something that can sign-check and
/// execute envelopes atomically and answer a few read queries.
///
/// `submit` blocks until the envelope is confirmed or rejected. Implementations
/// must not retry; a `ClientError::Transport` means the outcome is unknown.
pub trait Ledger {
    fn latest_blockhash(&self) -> Result<Hash, ClientError>;

    /// Lamports an account of `data_len` bytes must hold to be rent exempt.
    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ClientError>;

    fn account(&self, address: &Pubkey) -> Result<Option<LedgerAccount>, ClientError>;

    fn submit(&mut self, envelope: &Transaction) -> Result<Signature, ClientError>;
}

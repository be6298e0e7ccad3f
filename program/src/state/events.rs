use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CustodyRecord {
    pub action: CustodyAction,
    pub custody: Pubkey,
    pub owner: Pubkey,
    pub invoker: Pubkey,
    pub amount: u64,
    pub balance_after: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyAction {
    Initialize,
    Deposit,
    Withdraw,
}

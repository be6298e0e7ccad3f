//! Custody state machine shared by the on-chain processor and off-chain
//! ledgers.
//!
//! Nothing here touches accounts or the runtime: callers hand in a snapshot of
//! the custody account and the invoker, and get back the next stored record
//! plus the lamports that have to move. Applying the result is the caller's
//! job, which keeps the transition rules in one place.

use super::CustodyAccount;
use crate::{
    constants::CUSTODY_ACCOUNT_LEN, error::CustodyError, instruction::CustodyInstruction,
    pda::derive_custody_address, policy::DepositPolicy,
};
use solana_program::{
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    system_program,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyState {
    /// Storage exists but no owner has been recorded yet.
    Uninitialized,
    Active(CustodyAccount),
}

impl CustodyState {
    pub fn from_data(data: &[u8]) -> Result<Self, CustodyError> {
        let account = CustodyAccount::unpack_unchecked(data)
            .map_err(|_| CustodyError::InvalidCustodyAccount)?;
        Ok(if account.is_initialized() {
            Self::Active(account)
        } else {
            Self::Uninitialized
        })
    }

    pub fn balance(&self) -> u64 {
        match self {
            Self::Uninitialized => 0,
            Self::Active(account) => account.balance,
        }
    }
}

/// Where the custody account passed to an instruction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodySlot {
    /// Program-owned storage of the right size.
    Allocated(CustodyState),
    /// The invoker's derived address with no storage yet. `bump` signs the
    /// allocation.
    Unallocated { bump: u8 },
}

/// Classifies a custody account from its address, owning program and data.
pub fn locate(
    program_id: &Pubkey,
    invoker: &Pubkey,
    custody: &Pubkey,
    custody_owner: &Pubkey,
    data: &[u8],
) -> Result<CustodySlot, CustodyError> {
    if custody_owner == program_id {
        if data.len() != CUSTODY_ACCOUNT_LEN {
            return Err(CustodyError::InvalidCustodyAccount);
        }
        return CustodyState::from_data(data).map(CustodySlot::Allocated);
    }

    if system_program::check_id(custody_owner) && data.is_empty() {
        let (expected, bump) = derive_custody_address(invoker, program_id);
        if expected == *custody {
            return Ok(CustodySlot::Unallocated { bump });
        }
    }

    Err(CustodyError::InvalidCustodyAccount)
}

/// The invoking identity as seen by one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invoker {
    pub key: Pubkey,
    pub is_signer: bool,
    /// Spendable lamports at the time the instruction runs.
    pub lamports: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Invoker → custody account.
    IntoCustody(u64),
    /// Custody account → invoker.
    OutOfCustody(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Record to store once the lamports have moved.
    pub account: CustodyAccount,
    pub movement: Movement,
    /// Set when this transition recorded the owner for the first time.
    pub initialized: bool,
}

/// Validates `instruction` against the current state and computes the next one.
pub fn apply(
    state: &CustodyState,
    invoker: &Invoker,
    instruction: CustodyInstruction,
    policy: DepositPolicy,
) -> Result<Transition, CustodyError> {
    if !invoker.is_signer {
        return Err(CustodyError::MissingSignature);
    }

    match instruction {
        CustodyInstruction::Deposit { amount } => deposit(state, invoker, amount, policy),
        CustodyInstruction::Withdraw { amount } => withdraw(state, invoker, amount),
    }
}

fn deposit(
    state: &CustodyState,
    invoker: &Invoker,
    amount: u64,
    policy: DepositPolicy,
) -> Result<Transition, CustodyError> {
    if amount == 0 {
        return Err(CustodyError::InvalidAmount);
    }

    let (mut account, initialized) = match state {
        CustodyState::Uninitialized => (CustodyAccount::new(invoker.key), true),
        CustodyState::Active(account) => {
            if !policy.allows(&account.owner, &invoker.key) {
                return Err(CustodyError::Unauthorized);
            }
            (*account, false)
        }
    };

    if invoker.lamports < amount {
        return Err(CustodyError::InsufficientFunds);
    }

    account.balance = account
        .balance
        .checked_add(amount)
        .ok_or(CustodyError::ArithmeticOverflow)?;

    Ok(Transition {
        account,
        movement: Movement::IntoCustody(amount),
        initialized,
    })
}

fn withdraw(
    state: &CustodyState,
    invoker: &Invoker,
    amount: u64,
) -> Result<Transition, CustodyError> {
    let mut account = match state {
        CustodyState::Uninitialized => return Err(CustodyError::UninitializedAccount),
        CustodyState::Active(account) => *account,
    };

    if account.owner != invoker.key {
        return Err(CustodyError::Unauthorized);
    }

    account.balance = account
        .balance
        .checked_sub(amount)
        .ok_or(CustodyError::InsufficientBalance)?;

    Ok(Transition {
        account,
        movement: Movement::OutOfCustody(amount),
        initialized: false,
    })
}

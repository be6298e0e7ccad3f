//! In-memory ledger that runs envelopes against the custody state machine.
//!
//! Models the parts of the runtime the protocol relies on: signature checks,
//! in-order execution, and all-or-nothing commits. The system program is
//! reduced to `CreateAccount` and `Transfer`. No fees are charged.

use crate::{
    error::ClientError,
    ledger::{Ledger, LedgerAccount},
};
use lamport_custody::{
    constants::CUSTODY_ACCOUNT_LEN,
    error::CustodyError,
    instruction::CustodyInstruction,
    policy::DepositPolicy,
    state::{apply, locate, CustodyAccount, CustodySlot, CustodyState, Invoker, Movement},
};
use solana_sdk::{
    hash::Hash,
    instruction::CompiledInstruction,
    message::Message,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    sanitize::Sanitize,
    signature::Signature,
    system_program,
    transaction::Transaction,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

type Accounts = HashMap<Pubkey, LedgerAccount>;

/// An instruction account as the runtime presents it.
#[derive(Debug, Clone, Copy)]
struct Meta {
    key: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

const SYSTEM_CREATE_ACCOUNT: u32 = 0;
const SYSTEM_ASSIGN: u32 = 1;
const SYSTEM_TRANSFER: u32 = 2;
const SYSTEM_ALLOCATE: u32 = 8;

pub struct LocalLedger {
    program_id: Pubkey,
    policy: DepositPolicy,
    rent: Rent,
    blockhash: Hash,
    accounts: Accounts,
    processed: HashSet<Signature>,
}

impl LocalLedger {
    pub fn new(program_id: Pubkey, policy: DepositPolicy) -> Self {
        Self {
            program_id,
            policy,
            rent: Rent::default(),
            blockhash: Hash::new_unique(),
            accounts: HashMap::new(),
            processed: HashSet::new(),
        }
    }

    /// Credits `lamports` to a system-owned account, creating it if needed.
    pub fn airdrop(&mut self, address: &Pubkey, lamports: u64) {
        let account = self.accounts.entry(*address).or_insert_with(|| LedgerAccount {
            owner: system_program::id(),
            ..LedgerAccount::default()
        });
        account.lamports = account.lamports.saturating_add(lamports);
    }

    pub fn lamports(&self, address: &Pubkey) -> u64 {
        self.accounts.get(address).map_or(0, |a| a.lamports)
    }

    /// Decoded custody record stored at `address`, if it is program storage.
    pub fn custody_account(&self, address: &Pubkey) -> Option<CustodyAccount> {
        self.accounts
            .get(address)
            .filter(|a| a.owner == self.program_id)
            .and_then(|a| CustodyAccount::unpack_unchecked(&a.data).ok())
    }

    fn execute(
        &self,
        working: &mut Accounts,
        message: &Message,
        index: usize,
        instruction: &CompiledInstruction,
    ) -> Result<(), ClientError> {
        let program_id = message.account_keys[instruction.program_id_index as usize];
        let metas: Vec<Meta> = instruction
            .accounts
            .iter()
            .map(|&i| Meta {
                key: message.account_keys[i as usize],
                is_signer: message.is_signer(i as usize),
                is_writable: message.is_writable(i as usize),
            })
            .collect();

        debug!(index, program = %program_id, accounts = metas.len(), "executing instruction");

        if program_id == self.program_id {
            self.execute_custody(working, index, &metas, &instruction.data)
        } else if system_program::check_id(&program_id) {
            execute_system(working, index, &metas, &instruction.data)
        } else {
            Err(ClientError::InvalidEnvelope(format!(
                "instruction {} targets unknown program {}",
                index, program_id
            )))
        }
    }

    fn execute_custody(
        &self,
        working: &mut Accounts,
        index: usize,
        metas: &[Meta],
        data: &[u8],
    ) -> Result<(), ClientError> {
        let reject = |error: CustodyError| ClientError::Rejected { index, error };

        let instruction = CustodyInstruction::unpack(data).map_err(reject)?;
        let [invoker_meta, custody_meta, system_meta] = match metas {
            [invoker, custody, system, ..] => [*invoker, *custody, *system],
            _ => {
                return Err(ClientError::InvalidEnvelope(format!(
                    "instruction {} needs invoker, custody and system program accounts",
                    index
                )))
            }
        };
        let (invoker_key, custody_key) = (invoker_meta.key, custody_meta.key);
        if !invoker_meta.is_signer {
            return Err(reject(CustodyError::MissingSignature));
        }
        if !system_program::check_id(&system_meta.key) {
            return Err(reject(CustodyError::IncorrectSystemProgram));
        }
        if !custody_meta.is_writable {
            return Err(reject(CustodyError::InvalidCustodyAccount));
        }
        if invoker_key == custody_key {
            return Err(reject(CustodyError::InvalidCustodyAccount));
        }

        let mut invoker = working.get(&invoker_key).cloned().unwrap_or_default();
        let mut custody = working.get(&custody_key).cloned().unwrap_or_default();

        let slot = locate(
            &self.program_id,
            &invoker_key,
            &custody_key,
            &custody.owner,
            &custody.data,
        )
        .map_err(reject)?;

        let state = match (slot, instruction) {
            (CustodySlot::Allocated(state), _) => state,
            (CustodySlot::Unallocated { .. }, CustodyInstruction::Deposit { .. }) => {
                let required = self.rent.minimum_balance(CUSTODY_ACCOUNT_LEN);
                let shortfall = required.saturating_sub(custody.lamports);
                invoker.lamports = invoker
                    .lamports
                    .checked_sub(shortfall)
                    .ok_or(reject(CustodyError::InsufficientFunds))?;
                custody.lamports += shortfall;
                custody.owner = self.program_id;
                custody.data = vec![0; CUSTODY_ACCOUNT_LEN];
                debug!(custody = %custody_key, rent = required, "allocated derived custody account");
                CustodyState::Uninitialized
            }
            (CustodySlot::Unallocated { .. }, CustodyInstruction::Withdraw { .. }) => {
                return Err(reject(CustodyError::UninitializedAccount))
            }
        };

        let transition = apply(
            &state,
            &Invoker {
                key: invoker_key,
                is_signer: invoker_meta.is_signer,
                lamports: invoker.lamports,
            },
            instruction,
            self.policy,
        )
        .map_err(reject)?;

        match transition.movement {
            Movement::IntoCustody(amount) => {
                invoker.lamports = invoker
                    .lamports
                    .checked_sub(amount)
                    .ok_or(reject(CustodyError::InsufficientFunds))?;
                custody.lamports = custody
                    .lamports
                    .checked_add(amount)
                    .ok_or(reject(CustodyError::ArithmeticOverflow))?;
            }
            Movement::OutOfCustody(amount) => {
                custody.lamports = custody
                    .lamports
                    .checked_sub(amount)
                    .ok_or(reject(CustodyError::InsufficientBalance))?;
                invoker.lamports = invoker
                    .lamports
                    .checked_add(amount)
                    .ok_or(reject(CustodyError::ArithmeticOverflow))?;
            }
        }
        CustodyAccount::pack(transition.account, &mut custody.data)
            .map_err(|_| reject(CustodyError::InvalidCustodyAccount))?;

        working.insert(invoker_key, invoker);
        working.insert(custody_key, custody);
        Ok(())
    }
}

fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    data.get(offset..offset + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
}

fn read_pubkey(data: &[u8], offset: usize) -> Option<Pubkey> {
    data.get(offset..offset + 32)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .map(Pubkey::new_from_array)
}

fn execute_system(
    working: &mut Accounts,
    index: usize,
    metas: &[Meta],
    data: &[u8],
) -> Result<(), ClientError> {
    let reject = |reason: &str| ClientError::SystemRejected {
        index,
        reason: reason.to_string(),
    };
    let truncated = || reject("truncated instruction");

    let tag = data
        .get(..4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(truncated)?;

    match (tag, metas) {
        (SYSTEM_CREATE_ACCOUNT, [from, to, ..]) => {
            let lamports = read_u64(data, 4).ok_or_else(truncated)?;
            let space = read_u64(data, 12).ok_or_else(truncated)?;
            let owner = read_pubkey(data, 20).ok_or_else(truncated)?;
            if !from.is_signer || !to.is_signer {
                return Err(reject("create_account requires both signatures"));
            }
            if working
                .get(&to.key)
                .is_some_and(|a| a.lamports > 0 || !a.data.is_empty())
            {
                return Err(reject("account already in use"));
            }
            debit(working, &from.key, lamports).ok_or_else(|| reject("insufficient lamports"))?;
            working.insert(
                to.key,
                LedgerAccount {
                    lamports,
                    owner,
                    data: vec![0; space as usize],
                },
            );
            Ok(())
        }
        (SYSTEM_ASSIGN, [account, ..]) => {
            let owner = read_pubkey(data, 4).ok_or_else(truncated)?;
            let target = system_owned(working, account).map_err(reject)?;
            target.owner = owner;
            Ok(())
        }
        (SYSTEM_TRANSFER, [from, to, ..]) => {
            let lamports = read_u64(data, 4).ok_or_else(truncated)?;
            if !from.is_signer {
                return Err(reject("transfer requires the sender's signature"));
            }
            debit(working, &from.key, lamports).ok_or_else(|| reject("insufficient lamports"))?;
            let account = working.entry(to.key).or_insert_with(|| LedgerAccount {
                owner: system_program::id(),
                ..LedgerAccount::default()
            });
            account.lamports = account
                .lamports
                .checked_add(lamports)
                .ok_or_else(|| reject("lamport overflow"))?;
            Ok(())
        }
        (SYSTEM_ALLOCATE, [account, ..]) => {
            let space = read_u64(data, 4).ok_or_else(truncated)?;
            let target = system_owned(working, account).map_err(reject)?;
            if !target.data.is_empty() {
                return Err(reject("account already in use"));
            }
            target.data = vec![0; space as usize];
            Ok(())
        }
        _ => Err(reject("unsupported system instruction")),
    }
}

/// Account a signed `Assign` or `Allocate` may modify.
fn system_owned<'a>(
    working: &'a mut Accounts,
    meta: &Meta,
) -> Result<&'a mut LedgerAccount, &'static str> {
    if !meta.is_signer {
        return Err("missing required signature");
    }
    let account = working.entry(meta.key).or_insert_with(|| LedgerAccount {
        owner: system_program::id(),
        ..LedgerAccount::default()
    });
    if !system_program::check_id(&account.owner) {
        return Err("account is not owned by the system program");
    }
    Ok(account)
}

fn debit(working: &mut Accounts, address: &Pubkey, lamports: u64) -> Option<()> {
    let account = working.get_mut(address)?;
    account.lamports = account.lamports.checked_sub(lamports)?;
    Some(())
}

impl Ledger for LocalLedger {
    fn latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(self.blockhash)
    }

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ClientError> {
        Ok(self.rent.minimum_balance(data_len))
    }

    fn account(&self, address: &Pubkey) -> Result<Option<LedgerAccount>, ClientError> {
        Ok(self.accounts.get(address).cloned())
    }

    fn submit(&mut self, envelope: &Transaction) -> Result<Signature, ClientError> {
        envelope
            .sanitize()
            .map_err(|e| ClientError::InvalidEnvelope(e.to_string()))?;
        envelope
            .verify()
            .map_err(|e| ClientError::InvalidEnvelope(e.to_string()))?;
        if envelope.message.recent_blockhash != self.blockhash {
            return Err(ClientError::Transport("blockhash not found".to_string()));
        }
        let signature = envelope.signatures[0];
        if self.processed.contains(&signature) {
            return Err(ClientError::InvalidEnvelope(
                "envelope already processed".to_string(),
            ));
        }

        // Everything runs against a copy; it replaces the ledger only if every
        // instruction succeeds.
        let mut working = self.accounts.clone();
        for (index, instruction) in envelope.message.instructions.iter().enumerate() {
            if let Err(error) = self.execute(&mut working, &envelope.message, index, instruction) {
                warn!(%signature, %error, "envelope rejected");
                return Err(error);
            }
        }

        self.accounts = working;
        self.processed.insert(signature);
        info!(%signature, instructions = envelope.message.instructions.len(), "envelope committed");
        Ok(signature)
    }
}

use crate::{
    config::{AccountMode, ClientConfig},
    error::ClientError,
    ledger::Ledger,
};
use lamport_custody::{
    constants::CUSTODY_ACCOUNT_LEN, instruction, instruction::sol_to_lamports,
    pda::derive_custody_address, state::CustodyAccount,
};
use solana_sdk::{
    instruction::Instruction,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction, system_program,
    transaction::Transaction,
};
use tracing::{debug, info};

/// Which custody account a client drives. Fixed when the client is built.
pub enum CustodyTarget {
    /// The owner's derived address; the program allocates it on first deposit.
    Derived,
    /// A caller-held keypair; the client allocates it in the first deposit
    /// envelope and it co-signs that envelope.
    Explicit(Keypair),
}

impl CustodyTarget {
    pub fn from_mode(mode: AccountMode) -> Self {
        match mode {
            AccountMode::Derived => Self::Derived,
            AccountMode::Explicit => Self::Explicit(Keypair::new()),
        }
    }

    pub fn address(&self, owner: &Pubkey, program_id: &Pubkey) -> Pubkey {
        match self {
            Self::Derived => derive_custody_address(owner, program_id).0,
            Self::Explicit(account) => account.pubkey(),
        }
    }
}

/// Builds and submits custody envelopes for one owner.
pub struct CustodyClient<L> {
    ledger: L,
    program_id: Pubkey,
    owner: Keypair,
    target: CustodyTarget,
}

impl<L: Ledger> CustodyClient<L> {
    pub fn new(ledger: L, program_id: Pubkey, owner: Keypair, target: CustodyTarget) -> Self {
        Self {
            ledger,
            program_id,
            owner,
            target,
        }
    }

    pub fn from_config(ledger: L, config: &ClientConfig, owner: Keypair) -> Result<Self, ClientError> {
        Ok(Self::new(
            ledger,
            config.program_id()?,
            owner,
            CustodyTarget::from_mode(config.account_mode),
        ))
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn owner(&self) -> Pubkey {
        self.owner.pubkey()
    }

    pub fn custody_address(&self) -> Pubkey {
        self.target.address(&self.owner.pubkey(), &self.program_id)
    }

    /// Current custody record, `None` until storage exists.
    pub fn custody(&self) -> Result<Option<CustodyAccount>, ClientError> {
        let account = match self.ledger.account(&self.custody_address())? {
            Some(account) if account.owner == self.program_id => account,
            _ => return Ok(None),
        };
        let record = CustodyAccount::unpack_unchecked(&account.data)
            .map_err(|e| ClientError::InvalidEnvelope(format!("custody data: {}", e)))?;
        Ok(record.is_initialized().then_some(record))
    }

    /// Instructions for one deposit. An explicit account without program
    /// storage is allocated first, funded for rent exemption. Lamports already
    /// sitting at that address count towards the reserve.
    pub fn deposit_instructions(&self, amount: u64) -> Result<Vec<Instruction>, ClientError> {
        let owner = self.owner.pubkey();
        let custody = self.custody_address();
        let mut instructions = Vec::with_capacity(4);

        if let CustodyTarget::Explicit(account) = &self.target {
            let existing = self.ledger.account(&custody)?;
            let needs_storage = existing
                .as_ref()
                .map_or(true, |a| system_program::check_id(&a.owner) && a.data.is_empty());
            if needs_storage {
                let reserve = self
                    .ledger
                    .minimum_balance_for_rent_exemption(CUSTODY_ACCOUNT_LEN)?;
                let held = existing.as_ref().map_or(0, |a| a.lamports);
                debug!(custody = %custody, reserve, held, "allocating explicit custody account");
                if held == 0 {
                    instructions.push(system_instruction::create_account(
                        &owner,
                        &custody,
                        reserve,
                        CUSTODY_ACCOUNT_LEN as u64,
                        &self.program_id,
                    ));
                } else {
                    if held < reserve {
                        instructions.push(system_instruction::transfer(
                            &owner,
                            &custody,
                            reserve - held,
                        ));
                    }
                    instructions.push(system_instruction::allocate(
                        &account.pubkey(),
                        CUSTODY_ACCOUNT_LEN as u64,
                    ));
                    instructions.push(system_instruction::assign(
                        &account.pubkey(),
                        &self.program_id,
                    ));
                }
            }
        }

        instructions.push(instruction::deposit(&self.program_id, &owner, &custody, amount));
        Ok(instructions)
    }

    pub fn deposit(&mut self, amount: u64) -> Result<Signature, ClientError> {
        let instructions = self.deposit_instructions(amount)?;
        let signature = self.submit(&instructions)?;
        info!(%signature, amount, custody = %self.custody_address(), "deposit confirmed");
        Ok(signature)
    }

    /// Deposits a SOL-denominated amount; rejects amounts that are not a
    /// whole number of lamports before anything is sent.
    pub fn deposit_sol(&mut self, sol: f64) -> Result<Signature, ClientError> {
        self.deposit(sol_to_lamports(sol)?)
    }

    pub fn withdraw(&mut self, amount: u64) -> Result<Signature, ClientError> {
        let ix = instruction::withdraw(
            &self.program_id,
            &self.owner.pubkey(),
            &self.custody_address(),
            amount,
        );
        let signature = self.submit(&[ix])?;
        info!(%signature, amount, custody = %self.custody_address(), "withdrawal confirmed");
        Ok(signature)
    }

    /// Signs `instructions` as one envelope paid by the owner and submits it.
    pub fn submit(&mut self, instructions: &[Instruction]) -> Result<Signature, ClientError> {
        let envelope = self.envelope(instructions)?;
        debug!(instructions = instructions.len(), "submitting envelope");
        self.ledger.submit(&envelope)
    }

    fn envelope(&self, instructions: &[Instruction]) -> Result<Transaction, ClientError> {
        let mut envelope = Transaction::new_with_payer(instructions, Some(&self.owner.pubkey()));
        let required = envelope.message.signer_keys();

        let mut signers: Vec<&Keypair> = vec![&self.owner];
        if let CustodyTarget::Explicit(account) = &self.target {
            if required.contains(&&account.pubkey()) {
                signers.push(account);
            }
        }

        envelope
            .try_sign(signers.as_slice(), self.ledger.latest_blockhash()?)
            .map_err(|e| ClientError::InvalidEnvelope(e.to_string()))?;
        Ok(envelope)
    }
}

use crate::{constants::INSTRUCTION_LEN, error::CustodyError};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    system_program,
};

/// Discriminant byte of an encoded instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Deposit = 0,
    Withdraw = 1,
}

impl TryFrom<u8> for InstructionKind {
    type Error = CustodyError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Deposit),
            1 => Ok(Self::Withdraw),
            _ => Err(CustodyError::MalformedInstruction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyInstruction {
    /// Moves `amount` lamports from the invoker into custody.
    /// Allocates and initializes a derived custody account on first use.
    ///
    /// Accounts:
    /// - [signer, writable] Invoker
    /// - [writable] Custody account (derived or explicit)
    /// - [] System program
    Deposit { amount: u64 },

    /// Returns `amount` lamports from custody to the owner.
    ///
    /// Accounts:
    /// - [signer, writable] Owner
    /// - [writable] Custody account
    /// - [] System program
    Withdraw { amount: u64 },
}

impl CustodyInstruction {
    /// Builds an instruction from an unchecked integer amount.
    pub fn new(kind: InstructionKind, amount: i128) -> Result<Self, CustodyError> {
        let amount = u64::try_from(amount).map_err(|_| CustodyError::InvalidAmount)?;
        Ok(match kind {
            InstructionKind::Deposit => Self::Deposit { amount },
            InstructionKind::Withdraw => Self::Withdraw { amount },
        })
    }

    pub fn kind(&self) -> InstructionKind {
        match self {
            Self::Deposit { .. } => InstructionKind::Deposit,
            Self::Withdraw { .. } => InstructionKind::Withdraw,
        }
    }

    pub fn amount(&self) -> u64 {
        match *self {
            Self::Deposit { amount } | Self::Withdraw { amount } => amount,
        }
    }

    pub fn pack(&self) -> [u8; INSTRUCTION_LEN] {
        let mut data = [0u8; INSTRUCTION_LEN];
        data[0] = self.kind() as u8;
        data[1..].copy_from_slice(&self.amount().to_le_bytes());
        data
    }

    pub fn unpack(input: &[u8]) -> Result<Self, CustodyError> {
        let data: &[u8; INSTRUCTION_LEN] = input
            .try_into()
            .map_err(|_| CustodyError::MalformedInstruction)?;
        let (tag, amount) = data.split_at(1);
        let kind = InstructionKind::try_from(tag[0])?;
        let mut amount_bytes = [0u8; 8];
        amount_bytes.copy_from_slice(amount);
        let amount = u64::from_le_bytes(amount_bytes);
        Ok(match kind {
            InstructionKind::Deposit => Self::Deposit { amount },
            InstructionKind::Withdraw => Self::Withdraw { amount },
        })
    }
}

/// Encodes `(kind, amount)` into the 9-byte wire format.
pub fn encode(kind: InstructionKind, amount: i128) -> Result<[u8; INSTRUCTION_LEN], CustodyError> {
    CustodyInstruction::new(kind, amount).map(|ix| ix.pack())
}

/// Decodes the 9-byte wire format.
pub fn decode(bytes: &[u8]) -> Result<(InstructionKind, u64), CustodyError> {
    CustodyInstruction::unpack(bytes).map(|ix| (ix.kind(), ix.amount()))
}

/// Converts a floating point lamport count, rejecting anything that is not a
/// whole `u64`.
pub fn amount_from_f64(lamports: f64) -> Result<u64, CustodyError> {
    // 2^64 is exactly representable; everything at or above it overflows.
    const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;
    if !lamports.is_finite() || lamports < 0.0 || lamports >= U64_LIMIT || lamports.fract() != 0.0
    {
        return Err(CustodyError::InvalidAmount);
    }
    Ok(lamports as u64)
}

pub fn sol_to_lamports(sol: f64) -> Result<u64, CustodyError> {
    amount_from_f64(sol * LAMPORTS_PER_SOL as f64)
}

fn custody_accounts(invoker: &Pubkey, custody: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*invoker, true),
        AccountMeta::new(*custody, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

/// Creates a `Deposit` instruction.
pub fn deposit(program_id: &Pubkey, invoker: &Pubkey, custody: &Pubkey, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: custody_accounts(invoker, custody),
        data: CustodyInstruction::Deposit { amount }.pack().to_vec(),
    }
}

/// Creates a `Withdraw` instruction.
pub fn withdraw(program_id: &Pubkey, owner: &Pubkey, custody: &Pubkey, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: custody_accounts(owner, custody),
        data: CustodyInstruction::Withdraw { amount }.pack().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wire_layout() {
        let bytes = encode(InstructionKind::Withdraw, 20_000_000).unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..], &20_000_000u64.to_le_bytes());

        let bytes = encode(InstructionKind::Deposit, u64::MAX as i128).unwrap();
        assert_eq!(bytes, [0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert_eq!(
            encode(InstructionKind::Deposit, -1),
            Err(CustodyError::InvalidAmount)
        );
        assert_eq!(
            encode(InstructionKind::Withdraw, u64::MAX as i128 + 1),
            Err(CustodyError::InvalidAmount)
        );
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        assert_eq!(decode(&[]), Err(CustodyError::MalformedInstruction));
        assert_eq!(decode(&[0; 8]), Err(CustodyError::MalformedInstruction));
        assert_eq!(decode(&[0; 10]), Err(CustodyError::MalformedInstruction));
    }

    #[test]
    fn test_decode_rejects_unknown_discriminant() {
        let mut bytes = [0u8; INSTRUCTION_LEN];
        bytes[0] = 2;
        assert_eq!(decode(&bytes), Err(CustodyError::MalformedInstruction));
        bytes[0] = 0xff;
        assert_eq!(decode(&bytes), Err(CustodyError::MalformedInstruction));
    }

    #[test]
    fn test_float_amounts() {
        assert_eq!(sol_to_lamports(0.02), Ok(20_000_000));
        assert_eq!(amount_from_f64(0.0), Ok(0));
        assert_eq!(amount_from_f64(1.5), Err(CustodyError::InvalidAmount));
        assert_eq!(amount_from_f64(-1.0), Err(CustodyError::InvalidAmount));
        assert_eq!(amount_from_f64(f64::NAN), Err(CustodyError::InvalidAmount));
        assert_eq!(amount_from_f64(f64::INFINITY), Err(CustodyError::InvalidAmount));
        assert_eq!(amount_from_f64(1e20), Err(CustodyError::InvalidAmount));
        assert_eq!(sol_to_lamports(1.5e-9), Err(CustodyError::InvalidAmount));
    }

    #[test]
    fn test_builder_account_list() {
        let program_id = Pubkey::new_unique();
        let invoker = Pubkey::new_unique();
        let custody = Pubkey::new_unique();
        let ix = deposit(&program_id, &invoker, &custody, 10);

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, custody);
        assert!(!ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[2].pubkey, system_program::id());
        assert!(!ix.accounts[2].is_signer && !ix.accounts[2].is_writable);
        assert_eq!(
            CustodyInstruction::unpack(&ix.data),
            Ok(CustodyInstruction::Deposit { amount: 10 })
        );
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(amount in any::<u64>(), withdraw in any::<bool>()) {
            let kind = if withdraw { InstructionKind::Withdraw } else { InstructionKind::Deposit };
            let bytes = encode(kind, amount as i128).unwrap();
            prop_assert_eq!(decode(&bytes), Ok((kind, amount)));
        }

        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..16)) {
            let result = decode(&bytes);
            if bytes.len() != INSTRUCTION_LEN || bytes[0] > 1 {
                prop_assert_eq!(result, Err(CustodyError::MalformedInstruction));
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}

use solana_program::program_error::ProgramError;
use thiserror::Error;

/// Errors raised by the custody program and its shared protocol code.
///
/// The discriminant of each variant is its on-chain `Custom` error code, so
/// the order of this enum is part of the wire contract.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Amount is not a whole number of lamports representable as u64")]
    InvalidAmount,

    #[error("Instruction data must be 9 bytes with discriminant 0 or 1")]
    MalformedInstruction,

    #[error("Invoker cannot cover the deposit")]
    InsufficientFunds,

    #[error("Invoker is not the custody account owner")]
    Unauthorized,

    #[error("Withdrawal exceeds the stored balance")]
    InsufficientBalance,

    #[error("Invoker must sign the instruction")]
    MissingSignature,

    #[error("Custody account not initialized yet")]
    UninitializedAccount,

    #[error("Custody account is neither program storage nor the invoker's derived address")]
    InvalidCustodyAccount,

    #[error("Third account must be the system program")]
    IncorrectSystemProgram,

    #[error("Arithmetic overflow in balance calculation")]
    ArithmeticOverflow,
}

impl From<CustodyError> for ProgramError {
    fn from(e: CustodyError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl TryFrom<u32> for CustodyError {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::InvalidAmount,
            1 => Self::MalformedInstruction,
            2 => Self::InsufficientFunds,
            3 => Self::Unauthorized,
            4 => Self::InsufficientBalance,
            5 => Self::MissingSignature,
            6 => Self::UninitializedAccount,
            7 => Self::InvalidCustodyAccount,
            8 => Self::IncorrectSystemProgram,
            9 => Self::ArithmeticOverflow,
            other => return Err(other),
        })
    }
}

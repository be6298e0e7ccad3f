use lamport_custody::error::CustodyError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// Bad input caught before anything was submitted.
    #[error("Invalid input: {0}")]
    Codec(#[from] CustodyError),

    /// The custody program rejected instruction `index`; nothing was applied.
    #[error("Instruction {index} rejected: {error}")]
    Rejected { index: usize, error: CustodyError },

    /// A non-custody instruction (e.g. account creation) failed; nothing was applied.
    #[error("Instruction {index} rejected by system program: {reason}")]
    SystemRejected { index: usize, reason: String },

    #[error("Malformed envelope: {0}")]
    InvalidEnvelope(String),

    /// Submission or confirmation failed; the envelope may or may not have landed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Only transport failures are worth retrying, and only once the caller
    /// knows the envelope did not land.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The custody error behind this failure, if any.
    pub fn custody_error(&self) -> Option<CustodyError> {
        match self {
            Self::Codec(error) | Self::Rejected { error, .. } => Some(*error),
            _ => None,
        }
    }
}

// SEEDS
pub const CUSTODY_SEED: &[u8] = b"deposit";

// LAYOUT
/// Instruction data: 1-byte discriminant + u64 amount.
pub const INSTRUCTION_LEN: usize = 1 + 8;
/// Custody account data: 32-byte owner + u64 balance.
pub const CUSTODY_ACCOUNT_LEN: usize = 32 + 8;

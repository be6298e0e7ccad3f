use solana_program::pubkey::Pubkey;

/// Who may fund an already initialized custody account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepositPolicy {
    /// Only the stored owner may deposit.
    #[default]
    OwnerOnly,
    /// Any signer may deposit; the lamports are credited to the owner.
    AnyFunder,
}

impl DepositPolicy {
    /// Policy the program was built with (`open-deposits` feature).
    pub const fn configured() -> Self {
        if cfg!(feature = "open-deposits") {
            Self::AnyFunder
        } else {
            Self::OwnerOnly
        }
    }

    pub fn allows(&self, owner: &Pubkey, invoker: &Pubkey) -> bool {
        match self {
            Self::OwnerOnly => owner == invoker,
            Self::AnyFunder => true,
        }
    }
}

use crate::constants::CUSTODY_ACCOUNT_LEN;
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// Persistent record of a custody account.
///
/// Layout:
///   [0..32]  owner   (all zeroes while uninitialized)
///   [32..40] balance (u64, little-endian)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustodyAccount {
    /// The only identity allowed to withdraw. Fixed at initialization.
    pub owner: Pubkey,
    /// Lamports held for `owner`, excluding the rent reserve.
    pub balance: u64,
}

impl CustodyAccount {
    pub fn new(owner: Pubkey) -> Self {
        Self { owner, balance: 0 }
    }
}

impl Sealed for CustodyAccount {}

impl IsInitialized for CustodyAccount {
    fn is_initialized(&self) -> bool {
        self.owner != Pubkey::default()
    }
}

impl Pack for CustodyAccount {
    const LEN: usize = CUSTODY_ACCOUNT_LEN;

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, CUSTODY_ACCOUNT_LEN];
        let (owner_dst, balance_dst) = mut_array_refs![dst, 32, 8];
        owner_dst.copy_from_slice(self.owner.as_ref());
        *balance_dst = self.balance.to_le_bytes();
    }

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, CUSTODY_ACCOUNT_LEN];
        let (owner, balance) = array_refs![src, 32, 8];
        Ok(Self {
            owner: Pubkey::new_from_array(*owner),
            balance: u64::from_le_bytes(*balance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_owner_then_balance() {
        let owner = Pubkey::new_unique();
        let account = CustodyAccount {
            owner,
            balance: 75_000_000,
        };
        let mut data = [0u8; CustodyAccount::LEN];
        CustodyAccount::pack(account, &mut data).unwrap();

        assert_eq!(&data[..32], owner.as_ref());
        assert_eq!(&data[32..], &75_000_000u64.to_le_bytes());
        assert_eq!(CustodyAccount::unpack(&data).unwrap(), account);
    }

    #[test]
    fn test_zeroed_storage_is_uninitialized() {
        let data = [0u8; CustodyAccount::LEN];
        assert_eq!(
            CustodyAccount::unpack(&data),
            Err(ProgramError::UninitializedAccount)
        );
        assert!(!CustodyAccount::unpack_unchecked(&data)
            .unwrap()
            .is_initialized());
    }

    #[test]
    fn test_wrong_size_rejected() {
        assert_eq!(
            CustodyAccount::unpack_unchecked(&[0u8; 41]),
            Err(ProgramError::InvalidAccountData)
        );
    }
}

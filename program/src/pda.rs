use crate::constants::CUSTODY_SEED;
use solana_program::pubkey::Pubkey;

/// Derives the custody address of `owner` under `program_id`.
///
/// Returns the canonical bump, so the address is always off-curve and has no
/// private key.
pub fn derive_custody_address(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_with_seed(owner, program_id, CUSTODY_SEED)
}

pub fn derive_with_seed(owner: &Pubkey, program_id: &Pubkey, seed: &[u8]) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seed, owner.as_ref()], program_id)
}

/// Seeds the program signs a derived custody allocation with.
pub fn custody_signer_seeds<'a>(owner: &'a Pubkey, bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
    [CUSTODY_SEED, owner.as_ref(), bump]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derivation_is_off_curve_and_signable() {
        let program_id = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let (address, bump) = derive_custody_address(&owner, &program_id);

        assert!(!address.is_on_curve());
        let bump = [bump];
        let seeds = custody_signer_seeds(&owner, &bump);
        assert_eq!(
            Pubkey::create_program_address(&seeds, &program_id).unwrap(),
            address
        );
    }

    #[test]
    fn test_seed_literal_changes_address() {
        let program_id = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        assert_ne!(
            derive_with_seed(&owner, &program_id, b"deposit").0,
            derive_with_seed(&owner, &program_id, b"vault").0
        );
        assert_eq!(
            derive_with_seed(&owner, &program_id, CUSTODY_SEED),
            derive_custody_address(&owner, &program_id)
        );
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(owner in any::<[u8; 32]>(), program in any::<[u8; 32]>()) {
            let owner = Pubkey::new_from_array(owner);
            let program_id = Pubkey::new_from_array(program);
            prop_assert_eq!(
                derive_custody_address(&owner, &program_id),
                derive_custody_address(&owner, &program_id)
            );
        }

        #[test]
        fn distinct_owners_never_collide(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            prop_assume!(a != b);
            let program_id = Pubkey::new_unique();
            prop_assert_ne!(
                derive_custody_address(&Pubkey::new_from_array(a), &program_id).0,
                derive_custody_address(&Pubkey::new_from_array(b), &program_id).0
            );
        }
    }
}

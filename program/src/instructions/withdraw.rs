use crate::{
    common::log_transition,
    error::CustodyError,
    instruction::CustodyInstruction,
    policy::DepositPolicy,
    state::{apply, locate, CustodyAccount, CustodyAction, CustodySlot, Invoker},
    validate,
};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program_pack::Pack,
    pubkey::Pubkey,
    system_program,
};

pub fn withdraw(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    msg!("Starting withdraw...");
    msg!("amount: {}", amount);

    let account_info_iter = &mut accounts.iter();

    let invoker = next_account_info(account_info_iter)?;
    let custody = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate!(invoker.is_signer, CustodyError::MissingSignature)?;
    validate!(
        system_program::check_id(system_program.key),
        CustodyError::IncorrectSystemProgram,
        "Expected system program, got {}",
        system_program.key
    )?;
    validate!(
        custody.is_writable,
        CustodyError::InvalidCustodyAccount,
        "Custody account must be writable"
    )?;

    let slot = locate(
        program_id,
        invoker.key,
        custody.key,
        custody.owner,
        &custody.try_borrow_data()?,
    )?;
    let state = match slot {
        CustodySlot::Allocated(state) => state,
        CustodySlot::Unallocated { .. } => {
            msg!("Custody account {} has no storage", custody.key);
            return Err(CustodyError::UninitializedAccount.into());
        }
    };

    let transition = apply(
        &state,
        &Invoker {
            key: *invoker.key,
            is_signer: invoker.is_signer,
            lamports: invoker.lamports(),
        },
        CustodyInstruction::Withdraw { amount },
        DepositPolicy::configured(),
    )?;

    // The program owns the custody account, so lamports move without a CPI.
    let custody_lamports = custody
        .lamports()
        .checked_sub(amount)
        .ok_or(CustodyError::InsufficientBalance)?;
    let invoker_lamports = invoker
        .lamports()
        .checked_add(amount)
        .ok_or(CustodyError::ArithmeticOverflow)?;
    **custody.try_borrow_mut_lamports()? = custody_lamports;
    **invoker.try_borrow_mut_lamports()? = invoker_lamports;

    CustodyAccount::pack(transition.account, &mut custody.try_borrow_mut_data()?)?;

    msg!(
        "Withdrawal successful: {} lamports, balance {}",
        amount,
        transition.account.balance
    );
    log_transition(
        CustodyAction::Withdraw,
        custody.key,
        invoker.key,
        amount,
        &transition,
    )
}

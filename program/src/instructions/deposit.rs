use crate::{
    common::{allocate_custody_account, log_transition},
    error::CustodyError,
    instruction::CustodyInstruction,
    policy::DepositPolicy,
    state::{apply, locate, CustodyAccount, CustodyAction, CustodySlot, CustodyState, Invoker},
    validate,
};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
};

pub fn deposit(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    msg!("Starting deposit...");
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
        CustodySlot::Unallocated { bump } => {
            msg!("Allocating derived custody account {}", custody.key);
            allocate_custody_account(program_id, invoker, custody, system_program, bump)?;
            CustodyState::Uninitialized
        }
    };

    let transition = apply(
        &state,
        &Invoker {
            key: *invoker.key,
            is_signer: invoker.is_signer,
            lamports: invoker.lamports(),
        },
        CustodyInstruction::Deposit { amount },
        DepositPolicy::configured(),
    )?;

    invoke(
        &system_instruction::transfer(invoker.key, custody.key, amount),
        &[invoker.clone(), custody.clone(), system_program.clone()],
    )?;

    CustodyAccount::pack(transition.account, &mut custody.try_borrow_mut_data()?)?;

    msg!(
        "Deposit successful: {} lamports, balance {}",
        amount,
        transition.account.balance
    );
    log_transition(
        CustodyAction::Deposit,
        custody.key,
        invoker.key,
        amount,
        &transition,
    )
}

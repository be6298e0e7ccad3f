use crate::{
    constants::CUSTODY_ACCOUNT_LEN,
    pda::custody_signer_seeds,
    state::{CustodyAction, CustodyRecord, Transition},
};
use borsh::BorshSerialize;
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    log::sol_log_data,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{rent::Rent, Sysvar},
};

/// Emits `record` as a borsh-encoded program data log.
pub fn log_data<T: BorshSerialize>(record: &T) -> ProgramResult {
    let data = borsh::to_vec(record).map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
    sol_log_data(&[&data]);
    Ok(())
}

/// Logs the records for a committed transition.
pub fn log_transition(
    action: CustodyAction,
    custody: &Pubkey,
    invoker: &Pubkey,
    amount: u64,
    transition: &Transition,
) -> ProgramResult {
    if transition.initialized {
        log_data(&CustodyRecord {
            action: CustodyAction::Initialize,
            custody: *custody,
            owner: transition.account.owner,
            invoker: *invoker,
            amount: 0,
            balance_after: 0,
        })?;
    }
    log_data(&CustodyRecord {
        action,
        custody: *custody,
        owner: transition.account.owner,
        invoker: *invoker,
        amount,
        balance_after: transition.account.balance,
    })
}

/// Gives the payer's derived custody address rent-exempt storage owned by the
/// program.
///
/// The address may already hold lamports sent to it directly, in which case
/// `create_account` would fail; top up, allocate and assign instead.
pub fn allocate_custody_account<'a>(
    program_id: &Pubkey,
    payer: &AccountInfo<'a>,
    custody: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    bump: u8,
) -> ProgramResult {
    let rent = Rent::get()?;
    let required_lamports = rent.minimum_balance(CUSTODY_ACCOUNT_LEN);
    let bump = [bump];
    let seeds = custody_signer_seeds(payer.key, &bump);

    if custody.lamports() == 0 {
        invoke_signed(
            &system_instruction::create_account(
                payer.key,
                custody.key,
                required_lamports,
                CUSTODY_ACCOUNT_LEN as u64,
                program_id,
            ),
            &[payer.clone(), custody.clone(), system_program.clone()],
            &[&seeds[..]],
        )?;
        msg!("Custody account created: {}", custody.key);
        return Ok(());
    }

    let shortfall = required_lamports.saturating_sub(custody.lamports());
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer.key, custody.key, shortfall),
            &[payer.clone(), custody.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(custody.key, CUSTODY_ACCOUNT_LEN as u64),
        &[custody.clone(), system_program.clone()],
        &[&seeds[..]],
    )?;
    invoke_signed(
        &system_instruction::assign(custody.key, program_id),
        &[custody.clone(), system_program.clone()],
        &[&seeds[..]],
    )?;
    msg!("Pre-funded custody account allocated: {}", custody.key);

    Ok(())
}

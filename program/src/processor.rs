use crate::instruction::CustodyInstruction;
use crate::instructions::{deposit, withdraw};
use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = CustodyInstruction::unpack(instruction_data)?;
    match instruction {
        CustodyInstruction::Deposit { amount } => deposit(program_id, accounts, amount),
        CustodyInstruction::Withdraw { amount } => withdraw(program_id, accounts, amount),
    }
}

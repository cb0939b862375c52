// Round Lottery
// A round-based pooled lottery on Solana: stakes are pooled per round and one
// stake-weighted winner takes the whole round

// Core modules
pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;

// Game logic and its collaborators
pub mod events;
pub mod game;
pub mod ledger;
pub mod oracle;
pub mod randomness;
pub mod selection;
pub mod vault;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::error::LotteryError;

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if let Err(error) = processor::Processor::process(program_id, accounts, instruction_data) {
        match error {
            ProgramError::Custom(code) => match LotteryError::from_code(code) {
                Some(lottery_error) => msg!("Error: {}", lottery_error),
                None => msg!("Error: custom program error {}", code),
            },
            ref other => msg!("Error: {}", other),
        }
        return Err(error);
    }
    Ok(())
}

use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
    sysvar::slot_hashes,
};
use std::convert::TryInto;
use std::mem::size_of;

use crate::{
    error::LotteryError,
    utils::{find_config_address, find_game_state_address, find_vault_address},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LotteryInstruction {
    /// Create the config, game state and vault accounts
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer for the new accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The game state account (PDA)
    /// 3. `[writable]` The vault account (PDA)
    /// 4. `[]` The system program
    Initialize {
        /// Minimum seconds between two round closures
        round_duration: u64,
    },

    /// Stake lamports in the current round and the rounds after it
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the stake
    /// 1. `[]` The config account
    /// 2. `[writable]` The game state account
    /// 3. `[writable]` The vault account
    /// 4. `[]` The system program
    EnterGame {
        /// Number of consecutive rounds to enter, starting with the current one
        round_count: u64,
        /// Lamports staked in each of those rounds
        stake_per_round: u64,
    },

    /// Close the current round and draw its winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any user (anyone can close a round once the cooldown elapsed)
    /// 1. `[]` The config account
    /// 2. `[writable]` The game state account
    /// 3. `[]` The SlotHashes sysvar
    StartGame,

    /// Withdraw the caller's unclaimed winnings
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player claiming
    /// 1. `[]` The config account
    /// 2. `[writable]` The game state account
    /// 3. `[writable]` The vault account
    ClaimPrize,

    /// Log the current round and publish it as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The game state account
    /// 2. `[]` The vault account
    GetCurrentGameStatus,
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (round_duration, _) = Self::unpack_u64(rest)?;
                Self::Initialize { round_duration }
            }
            1 => {
                let (round_count, rest) = Self::unpack_u64(rest)?;
                let (stake_per_round, _) = Self::unpack_u64(rest)?;
                Self::EnterGame {
                    round_count,
                    stake_per_round,
                }
            }
            2 => Self::StartGame,
            3 => Self::ClaimPrize,
            4 => Self::GetCurrentGameStatus,
            _ => return Err(LotteryError::InvalidInstructionData.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::Initialize { round_duration } => {
                buf.push(0);
                buf.extend_from_slice(&round_duration.to_le_bytes());
            }
            Self::EnterGame {
                round_count,
                stake_per_round,
            } => {
                buf.push(1);
                buf.extend_from_slice(&round_count.to_le_bytes());
                buf.extend_from_slice(&stake_per_round.to_le_bytes());
            }
            Self::StartGame => buf.push(2),
            Self::ClaimPrize => buf.push(3),
            Self::GetCurrentGameStatus => buf.push(4),
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(LotteryError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }
}

/// Create initialize instruction
pub fn initialize(program_id: &Pubkey, payer: &Pubkey, round_duration: u64) -> Instruction {
    let data = LotteryInstruction::Initialize { round_duration }.pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(find_config_address(program_id).0, false),
        AccountMeta::new(find_game_state_address(program_id).0, false),
        AccountMeta::new(find_vault_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_game instruction
pub fn enter_game(
    program_id: &Pubkey,
    player: &Pubkey,
    round_count: u64,
    stake_per_round: u64,
) -> Instruction {
    let data = LotteryInstruction::EnterGame {
        round_count,
        stake_per_round,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_game_state_address(program_id).0, false),
        AccountMeta::new(find_vault_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create start_game instruction
pub fn start_game(program_id: &Pubkey, caller: &Pubkey) -> Instruction {
    let data = LotteryInstruction::StartGame.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_game_state_address(program_id).0, false),
        AccountMeta::new_readonly(slot_hashes::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create claim_prize instruction
pub fn claim_prize(program_id: &Pubkey, player: &Pubkey) -> Instruction {
    let data = LotteryInstruction::ClaimPrize.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_game_state_address(program_id).0, false),
        AccountMeta::new(find_vault_address(program_id).0, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create get_current_game_status instruction
pub fn get_current_game_status(program_id: &Pubkey) -> Instruction {
    let data = LotteryInstruction::GetCurrentGameStatus.pack();

    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new_readonly(find_game_state_address(program_id).0, false),
        AccountMeta::new_readonly(find_vault_address(program_id).0, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

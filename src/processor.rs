use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    error::LotteryError,
    events::ProgramLogSink,
    game::{self, RoundOutcome},
    instruction::LotteryInstruction,
    randomness::SlotHashEntropy,
    state::{GameConfig, GameState, GAME_STATE_SPACE},
    utils::{
        find_config_address, find_game_state_address, find_vault_address,
        verify_program_address, CONFIG_SEED, GAME_STATE_SEED, VAULT_SEED,
    },
    vault::LamportVault,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize { round_duration } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, round_duration, program_id)
            }
            LotteryInstruction::EnterGame {
                round_count,
                stake_per_round,
            } => {
                msg!("Instruction: Enter Game");
                Self::process_enter_game(accounts, round_count, stake_per_round, program_id)
            }
            LotteryInstruction::StartGame => {
                msg!("Instruction: Start Game");
                Self::process_start_game(accounts, program_id)
            }
            LotteryInstruction::ClaimPrize => {
                msg!("Instruction: Claim Prize");
                Self::process_claim_prize(accounts, program_id)
            }
            LotteryInstruction::GetCurrentGameStatus => {
                msg!("Instruction: Get Current Game Status");
                Self::process_get_current_game_status(accounts, program_id)
            }
        }
    }

    /// Create the config, game state and vault PDAs and open the first round
    fn process_initialize(
        accounts: &[AccountInfo],
        round_duration: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let game_state_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_system_program(system_program_info)?;

        let (config_key, config_bump) = find_config_address(program_id);
        let (game_state_key, state_bump) = find_game_state_address(program_id);
        let (vault_key, vault_bump) = find_vault_address(program_id);
        if *config_info.key != config_key
            || *game_state_info.key != game_state_key
            || *vault_info.key != vault_key
        {
            msg!("Config, game state and vault must be the program derived addresses");
            return Err(LotteryError::InvalidAccountAddress.into());
        }

        if config_info.owner == program_id {
            let config = GameConfig::unpack_unchecked(&config_info.data.borrow())?;
            if config.is_initialized {
                msg!("Config account is already initialized");
                return Err(LotteryError::AlreadyInitialized.into());
            }
        }

        if round_duration == 0 {
            msg!("Round duration must be greater than zero");
            return Err(ProgramError::InvalidArgument);
        }

        let rent = Rent::get()?;
        Self::create_pda(
            payer_info,
            config_info,
            system_program_info,
            &rent,
            GameConfig::LEN,
            &[CONFIG_SEED, &[config_bump]],
            program_id,
        )?;
        Self::create_pda(
            payer_info,
            game_state_info,
            system_program_info,
            &rent,
            GAME_STATE_SPACE,
            &[GAME_STATE_SEED, &[state_bump]],
            program_id,
        )?;
        Self::create_pda(
            payer_info,
            vault_info,
            system_program_info,
            &rent,
            0,
            &[VAULT_SEED, &[vault_bump]],
            program_id,
        )?;

        let config = GameConfig::new(round_duration, state_bump, vault_bump);
        let clock = Clock::get()?;
        let mut state = GameState::load(&game_state_info.data.borrow())?;
        game::initialize(&mut state, &config, &clock, &mut ProgramLogSink)?;

        state.store(&mut game_state_info.data.borrow_mut())?;
        GameConfig::pack(config, &mut config_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: Config={}, GameState={}, Vault={}",
            config_info.key,
            game_state_info.key,
            vault_info.key
        );
        Ok(())
    }

    fn process_enter_game(
        accounts: &[AccountInfo],
        round_count: u64,
        stake_per_round: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let game_state_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_system_program(system_program_info)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::check_game_state(game_state_info, &config, program_id)?;
        Self::check_vault(vault_info, &config, program_id)?;

        let mut state = GameState::load(&game_state_info.data.borrow())?;
        let rent_reserve = Rent::get()?.minimum_balance(vault_info.data_len());
        let mut treasury = LamportVault::new(
            vault_info,
            player_info,
            Some(system_program_info),
            rent_reserve,
        );
        let clock = Clock::get()?;

        game::enter_game(
            &mut state,
            &mut treasury,
            &clock,
            &mut ProgramLogSink,
            player_info.key,
            round_count,
            stake_per_round,
        )?;

        let needed = state.encoded_len()?;
        if needed > game_state_info.data_len() {
            Self::grow_game_state(game_state_info, player_info, system_program_info, needed)?;
        }
        state.store(&mut game_state_info.data.borrow_mut())?;
        Ok(())
    }

    /// Resize the game state account, the entering player pays the extra rent
    fn grow_game_state<'a>(
        game_state_info: &AccountInfo<'a>,
        player_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        new_len: usize,
    ) -> ProgramResult {
        let old_len = game_state_info.data_len();
        let top_up = Rent::get()?
            .minimum_balance(new_len)
            .saturating_sub(game_state_info.lamports());

        if top_up > 0 {
            invoke(
                &system_instruction::transfer(player_info.key, game_state_info.key, top_up),
                &[
                    player_info.clone(),
                    game_state_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }
        game_state_info.realloc(new_len, false)?;

        msg!(
            "Game state grown: {} -> {} bytes, {} lamports rent from {}",
            old_len,
            new_len,
            top_up,
            player_info.key
        );
        Ok(())
    }

    fn process_start_game(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let game_state_info = next_account_info(account_info_iter)?;
        let slot_hashes_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        Self::check_game_state(game_state_info, &config, program_id)?;

        let mut state = GameState::load(&game_state_info.data.borrow())?;
        let clock = Clock::get()?;
        let mut oracle = SlotHashEntropy::from_slot_hashes(slot_hashes_info, &clock, state.round)?;

        let outcome = game::start_game(
            &mut state,
            &config,
            &clock,
            &mut oracle,
            &mut ProgramLogSink,
        )?;
        match outcome {
            RoundOutcome::NoPlayers => msg!("Round closed without players"),
            RoundOutcome::CarriedForward { entry } => {
                msg!("Round closed with a single player: {}", entry.player)
            }
            RoundOutcome::Won { winner, prize, .. } => {
                msg!("Round won: Winner={}, Prize={}", winner.player, prize)
            }
        }

        state.store(&mut game_state_info.data.borrow_mut())?;
        Ok(())
    }

    fn process_claim_prize(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let game_state_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        Self::check_game_state(game_state_info, &config, program_id)?;
        Self::check_vault(vault_info, &config, program_id)?;

        let mut state = GameState::load(&game_state_info.data.borrow())?;
        let rent_reserve = Rent::get()?.minimum_balance(vault_info.data_len());
        let mut treasury = LamportVault::new(vault_info, player_info, None, rent_reserve);

        game::claim_prize(&mut state, &mut treasury, &mut ProgramLogSink, player_info.key)?;

        state.store(&mut game_state_info.data.borrow_mut())?;
        Ok(())
    }

    fn process_get_current_game_status(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let game_state_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::check_game_state(game_state_info, &config, program_id)?;
        Self::check_vault(vault_info, &config, program_id)?;

        let state = GameState::load(&game_state_info.data.borrow())?;
        state.ensure_initialized()?;
        let rent_reserve = Rent::get()?.minimum_balance(vault_info.data_len());
        let treasury = LamportVault::read_only(vault_info, rent_reserve);

        let game_status = state.get_game_status();
        let status = state.get_current_game_status()?;
        msg!(
            "Round={}, LastRoundTime={}, Players={}, Prize={}",
            game_status.round,
            state.get_last_round_time(),
            state.get_current_round_player(),
            state.get_current_round_prize()?
        );
        msg!(
            "Vault={}, Unclaimed={}, OpenRounds={}",
            game::vault_balance(&treasury),
            state.unclaimed.total(),
            state.entries.bucket_count()
        );
        for entry in &status.entries {
            msg!("Entry: Player={}, Stake={}", entry.player, entry.stake);
        }

        let data = status
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&data);
        Ok(())
    }

    /// Create a PDA owned by this program. An address that already holds
    /// lamports is topped up to rent exemption, then allocated and assigned.
    fn create_pda<'a>(
        payer_info: &AccountInfo<'a>,
        new_account_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        rent: &Rent,
        space: usize,
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let required_lamports = rent.minimum_balance(space);
        msg!("Creating account {} ({} bytes)", new_account_info.key, space);

        if new_account_info.lamports() == 0 {
            return invoke_signed(
                &system_instruction::create_account(
                    payer_info.key,
                    new_account_info.key,
                    required_lamports,
                    space as u64,
                    program_id,
                ),
                &[
                    payer_info.clone(),
                    new_account_info.clone(),
                    system_program_info.clone(),
                ],
                &[seeds],
            );
        }

        msg!(
            "Account {} is pre-funded with {} lamports",
            new_account_info.key,
            new_account_info.lamports()
        );
        let top_up = required_lamports.saturating_sub(new_account_info.lamports());
        if top_up > 0 {
            invoke(
                &system_instruction::transfer(payer_info.key, new_account_info.key, top_up),
                &[
                    payer_info.clone(),
                    new_account_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }
        invoke_signed(
            &system_instruction::allocate(new_account_info.key, space as u64),
            &[new_account_info.clone(), system_program_info.clone()],
            &[seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(new_account_info.key, program_id),
            &[new_account_info.clone(), system_program_info.clone()],
            &[seeds],
        )
    }

    fn load_config(config_info: &AccountInfo, program_id: &Pubkey) -> Result<GameConfig, ProgramError> {
        if *config_info.key != find_config_address(program_id).0 {
            msg!("Invalid config account address");
            return Err(LotteryError::InvalidAccountAddress.into());
        }
        if config_info.owner != program_id {
            msg!("Config account is not initialized");
            return Err(LotteryError::StateNotInitialized.into());
        }

        let config = GameConfig::unpack_unchecked(&config_info.data.borrow())?;
        if !config.is_initialized {
            msg!("Config account is not initialized");
            return Err(LotteryError::StateNotInitialized.into());
        }
        Ok(config)
    }

    fn check_game_state(
        game_state_info: &AccountInfo,
        config: &GameConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        verify_program_address(game_state_info.key, GAME_STATE_SEED, config.state_bump, program_id)?;
        if game_state_info.owner != program_id {
            msg!("Game state account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    fn check_vault(vault_info: &AccountInfo, config: &GameConfig, program_id: &Pubkey) -> ProgramResult {
        verify_program_address(vault_info.key, VAULT_SEED, config.vault_bump, program_id)?;
        if vault_info.owner != program_id {
            msg!("Vault account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    fn check_system_program(system_program_info: &AccountInfo) -> ProgramResult {
        if *system_program_info.key != system_program::id() {
            msg!("Expected the system program, got {}", system_program_info.key);
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }
}

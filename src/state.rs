use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    borsh::{get_instance_packed_len, try_from_slice_unchecked},
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::{
    error::LotteryError,
    ledger::{Entry, EntryLedger, UnclaimedPrizeLedger},
};

/// Cooldown between two round closures, in seconds
pub const FIXED_ROUND_DURATION: u64 = 90;
/// Declared platform fee. Stored in the config but never applied to stakes
/// or prizes.
pub const PLATFORM_FEE_PERCENTAGE: u8 = 1;
/// Round number the game starts at
pub const INITIAL_ROUND: u64 = 1;
/// Bytes allocated for the game state account at initialization. Entering
/// players grow it with `realloc` and pay rent for the extra bytes.
pub const GAME_STATE_SPACE: usize = 1_024;
/// Most consecutive rounds one deposit can cover
pub const MAX_ROUNDS_AHEAD: u64 = 100;

/// Program configuration account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Minimum seconds between two round closures
    pub round_duration: u64,
    /// Platform fee in percent (unused by the game logic)
    pub platform_fee_percentage: u8,
    /// Bump of the game state PDA
    pub state_bump: u8,
    /// Bump of the vault PDA
    pub vault_bump: u8,
}

impl Sealed for GameConfig {}

impl IsInitialized for GameConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for GameConfig {
    const LEN: usize = 1 + 8 + 1 + 1 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, GameConfig::LEN];
        let (is_initialized, round_duration, platform_fee_percentage, state_bump, vault_bump) =
            array_refs![src, 1, 8, 1, 1, 1];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(GameConfig {
            is_initialized,
            round_duration: u64::from_le_bytes(*round_duration),
            platform_fee_percentage: platform_fee_percentage[0],
            state_bump: state_bump[0],
            vault_bump: vault_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, GameConfig::LEN];
        let (
            is_initialized_dst,
            round_duration_dst,
            platform_fee_percentage_dst,
            state_bump_dst,
            vault_bump_dst,
        ) = mut_array_refs![dst, 1, 8, 1, 1, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *round_duration_dst = self.round_duration.to_le_bytes();
        platform_fee_percentage_dst[0] = self.platform_fee_percentage;
        state_bump_dst[0] = self.state_bump;
        vault_bump_dst[0] = self.vault_bump;
    }
}

impl GameConfig {
    pub fn new(round_duration: u64, state_bump: u8, vault_bump: u8) -> Self {
        Self {
            is_initialized: true,
            round_duration,
            platform_fee_percentage: PLATFORM_FEE_PERCENTAGE,
            state_bump,
            vault_bump,
        }
    }

    /// Earliest timestamp strictly after which the round can close
    pub fn cooldown_ends_at(&self, last_round_time: UnixTimestamp) -> Result<UnixTimestamp, LotteryError> {
        let duration =
            UnixTimestamp::try_from(self.round_duration).map_err(|_| LotteryError::ArithmeticOverflow)?;
        last_round_time
            .checked_add(duration)
            .ok_or(LotteryError::ArithmeticOverflow)
    }
}

/// The single game state account
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub is_initialized: bool,
    /// Round currently accepting resolution
    pub round: u64,
    /// When the previous round closed (or the game was created)
    pub last_round_time: UnixTimestamp,
    pub entries: EntryLedger,
    pub unclaimed: UnclaimedPrizeLedger,
}

/// Round counter and last closure time
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameStatus {
    pub round: u64,
    pub last_round_time: UnixTimestamp,
}

/// Snapshot of the round in progress
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CurrentGameStatus {
    pub round: u64,
    pub last_round_time: UnixTimestamp,
    pub player_count: u64,
    pub prize: u64,
    pub entries: Vec<Entry>,
}

impl GameState {
    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            round: INITIAL_ROUND,
            last_round_time: now,
            entries: EntryLedger::default(),
            unclaimed: UnclaimedPrizeLedger::default(),
        }
    }

    pub fn ensure_initialized(&self) -> Result<(), LotteryError> {
        if self.is_initialized {
            Ok(())
        } else {
            Err(LotteryError::StateNotInitialized)
        }
    }

    /// Decode from account data. Trailing unused space is ignored.
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        try_from_slice_unchecked::<GameState>(data)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    /// Bytes `store` needs
    pub fn encoded_len(&self) -> Result<usize, ProgramError> {
        get_instance_packed_len(self).map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    /// Encode into account data
    pub fn store(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        let bytes = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        if bytes.len() > data.len() {
            return Err(LotteryError::GameStateFull.into());
        }
        data[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn get_game_status(&self) -> GameStatus {
        GameStatus {
            round: self.round,
            last_round_time: self.last_round_time,
        }
    }

    pub fn get_last_round_time(&self) -> UnixTimestamp {
        self.last_round_time
    }

    pub fn get_unclaimed_prize(&self, player: &Pubkey) -> u64 {
        self.unclaimed.get(player)
    }

    pub fn get_current_round_player(&self) -> u64 {
        self.entries.player_count(self.round)
    }

    pub fn get_current_round_prize(&self) -> Result<u64, LotteryError> {
        self.entries.round_total(self.round)
    }

    pub fn get_current_game_status(&self) -> Result<CurrentGameStatus, LotteryError> {
        Ok(CurrentGameStatus {
            round: self.round,
            last_round_time: self.last_round_time,
            player_count: self.get_current_round_player(),
            prize: self.get_current_round_prize()?,
            entries: self
                .entries
                .round(self.round)
                .map(<[Entry]>::to_vec)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_pack_round_trip() {
        let config = GameConfig::new(FIXED_ROUND_DURATION, 254, 253);
        let mut buf = [0u8; GameConfig::LEN];
        GameConfig::pack(config, &mut buf).unwrap();

        let unpacked = GameConfig::unpack(&buf).unwrap();
        assert_eq!(unpacked, config);
        assert_eq!(unpacked.platform_fee_percentage, PLATFORM_FEE_PERCENTAGE);
    }

    #[test]
    fn zeroed_config_is_uninitialized() {
        let buf = [0u8; GameConfig::LEN];
        assert_eq!(
            GameConfig::unpack(&buf),
            Err(ProgramError::UninitializedAccount)
        );
        assert!(!GameConfig::unpack_unchecked(&buf).unwrap().is_initialized);
    }

    #[test]
    fn cooldown_adds_duration() {
        let config = GameConfig::new(90, 0, 0);
        assert_eq!(config.cooldown_ends_at(1_000).unwrap(), 1_090);

        let huge = GameConfig::new(u64::MAX, 0, 0);
        assert_eq!(
            huge.cooldown_ends_at(0),
            Err(LotteryError::ArithmeticOverflow)
        );
    }

    #[test]
    fn zeroed_account_loads_uninitialized() {
        let data = vec![0u8; GAME_STATE_SPACE];
        let state = GameState::load(&data).unwrap();
        assert_eq!(state.ensure_initialized(), Err(LotteryError::StateNotInitialized));
    }

    #[test]
    fn store_then_load_keeps_entries() {
        let mut state = GameState::new(500);
        let player = Pubkey::new_unique();
        state.entries.upsert(INITIAL_ROUND, &player, 75, 500).unwrap();
        state.unclaimed.add(&player, 10).unwrap();

        let mut data = vec![0u8; GAME_STATE_SPACE];
        state.store(&mut data).unwrap();
        let loaded = GameState::load(&data).unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.get_current_round_prize().unwrap(), 75);
        assert_eq!(loaded.get_unclaimed_prize(&player), 10);
    }

    #[test]
    fn many_rounds_ahead_outgrow_initial_space() {
        let mut state = GameState::new(0);
        let griefer = Pubkey::new_unique();
        for round in 1..=MAX_ROUNDS_AHEAD {
            state.entries.upsert(round, &griefer, 1, 0).unwrap();
        }
        let needed = state.encoded_len().unwrap();
        assert!(needed > GAME_STATE_SPACE);

        // an account grown to the encoded length still takes a new player
        state.entries.upsert(1, &Pubkey::new_unique(), 5, 0).unwrap();
        let mut data = vec![0u8; state.encoded_len().unwrap()];
        state.store(&mut data).unwrap();
        assert_eq!(GameState::load(&data).unwrap().get_current_round_player(), 2);
        assert_eq!(state.encoded_len().unwrap(), state.try_to_vec().unwrap().len());
    }

    #[test]
    fn store_rejects_overfull_account() {
        let mut state = GameState::new(0);
        state.entries.upsert(1, &Pubkey::new_unique(), 1, 0).unwrap();
        let mut data = vec![0u8; 16];
        assert_eq!(
            state.store(&mut data),
            Err(ProgramError::from(LotteryError::GameStateFull))
        );
    }

    #[test]
    fn current_status_copies_round_entries() {
        let mut state = GameState::new(42);
        assert_eq!(state.get_current_round_prize().unwrap(), 0);
        assert!(state.get_current_game_status().unwrap().entries.is_empty());

        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        state.entries.upsert(1, &a, 30, 42).unwrap();
        state.entries.upsert(1, &b, 20, 43).unwrap();
        state.entries.upsert(2, &b, 20, 43).unwrap();

        let status = state.get_current_game_status().unwrap();
        assert_eq!(status.round, 1);
        assert_eq!(status.last_round_time, 42);
        assert_eq!(status.player_count, 2);
        assert_eq!(status.prize, 50);
        assert_eq!(status.entries[0].player, a);
        assert_eq!(status.entries[1].player, b);
        assert_eq!(
            state.get_game_status(),
            GameStatus { round: 1, last_round_time: 42 }
        );
    }
}

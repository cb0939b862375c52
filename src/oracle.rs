// Round Lottery - Collaborators consumed by the game core
use solana_program::{
    clock::{Clock, UnixTimestamp},
    program_error::ProgramError,
    pubkey::Pubkey,
};

/// Custodian of every staked lamport
pub trait Treasury {
    /// Move `amount` from `from` into the treasury
    fn withdraw(&mut self, from: &Pubkey, amount: u64) -> Result<(), ProgramError>;

    /// Pay `amount` out of the treasury to `to`
    fn deposit(&mut self, to: &Pubkey, amount: u64) -> Result<(), ProgramError>;

    /// Lamports currently held for the game
    fn balance(&self) -> u64;
}

/// Monotonically non-decreasing time source
pub trait GameClock {
    fn now(&self) -> UnixTimestamp;
}

impl GameClock for Clock {
    fn now(&self) -> UnixTimestamp {
        self.unix_timestamp
    }
}

/// Uniform integer randomness
pub trait RandomnessOracle {
    /// Uniform value in `[low, high_exclusive)`
    fn uniform(&mut self, low: u64, high_exclusive: u64) -> Result<u64, ProgramError>;
}

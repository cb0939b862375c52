use solana_program::{decode_error::DecodeError, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Initialize was called a second time
    #[error("Game already initialized")]
    AlreadyInitialized,

    /// Operation invoked before the one-time setup has run
    #[error("Game state not initialized")]
    StateNotInitialized,

    /// The round cooldown has not elapsed yet
    #[error("Round cannot be closed yet")]
    RoundTooSoon,

    /// Nothing to claim for the caller
    #[error("No unclaimed prize for this account")]
    NoUnclaimedPrize,

    /// The treasury cannot satisfy a transfer
    #[error("Insufficient funds for operation")]
    InsufficientFunds,

    #[error("Round count out of range")]
    InvalidRoundCount,

    #[error("Stake per round must be at least one lamport")]
    InvalidStake,

    /// Random draw outside the ticket range, or nothing to draw from
    #[error("Invalid random draw")]
    InvalidRandomDraw,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// A passed account is not the expected program address
    #[error("Unexpected account address")]
    InvalidAccountAddress,

    /// The serialized game state no longer fits its account
    #[error("Game state account is full")]
    GameStateFull,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl LotteryError {
    /// Map a `ProgramError::Custom` code back to its variant
    pub fn from_code(code: u32) -> Option<Self> {
        use LotteryError::*;
        const ALL: [LotteryError; 12] = [
            InvalidInstructionData,
            AlreadyInitialized,
            StateNotInitialized,
            RoundTooSoon,
            NoUnclaimedPrize,
            InsufficientFunds,
            InvalidRoundCount,
            InvalidStake,
            InvalidRandomDraw,
            ArithmeticOverflow,
            InvalidAccountAddress,
            GameStateFull,
        ];
        ALL.get(code as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_custom_program_error() {
        assert_eq!(
            ProgramError::from(LotteryError::InvalidInstructionData),
            ProgramError::Custom(0)
        );
        assert_eq!(
            ProgramError::from(LotteryError::RoundTooSoon),
            ProgramError::Custom(3)
        );
    }

    #[test]
    fn codes_map_back_to_variants() {
        for code in 0..12 {
            let error = LotteryError::from_code(code).unwrap();
            assert_eq!(ProgramError::from(error), ProgramError::Custom(code));
        }
        assert_eq!(LotteryError::from_code(12), None);
    }
}

// Round Lottery - On-chain randomness source
use solana_program::{
    account_info::AccountInfo,
    clock::Clock,
    hash::{hashv, Hash},
    msg,
    program_error::ProgramError,
    sysvar::slot_hashes,
};

use crate::{error::LotteryError, oracle::RandomnessOracle, utils::generate_random_value};

/// Randomness derived from the most recent slot hash.
///
/// Every draw hashes the seed with a draw counter, so repeated draws within
/// one instruction are independent of each other. Slot hashes are known to
/// the leader that produced them; swap in a VRF-backed oracle where that
/// matters.
pub struct SlotHashEntropy {
    seed: Hash,
    draws: u64,
}

impl SlotHashEntropy {
    pub fn new(seed_material: &[&[u8]]) -> Self {
        Self {
            seed: hashv(seed_material),
            draws: 0,
        }
    }

    /// Seed from the newest `SlotHashes` entry, the clock and the round
    /// being closed
    pub fn from_slot_hashes(
        slot_hashes_info: &AccountInfo,
        clock: &Clock,
        round: u64,
    ) -> Result<Self, ProgramError> {
        if *slot_hashes_info.key != slot_hashes::id() {
            msg!("Expected the SlotHashes sysvar, got {}", slot_hashes_info.key);
            return Err(ProgramError::InvalidArgument);
        }

        // Layout: u64 entry count, then (slot: u64, hash: [u8; 32]) newest first
        let data = slot_hashes_info.try_borrow_data()?;
        let newest = data.get(8..48).ok_or(ProgramError::InvalidAccountData)?;

        Ok(Self::new(&[
            newest,
            clock.slot.to_le_bytes().as_ref(),
            clock.unix_timestamp.to_le_bytes().as_ref(),
            round.to_le_bytes().as_ref(),
        ]))
    }
}

impl RandomnessOracle for SlotHashEntropy {
    fn uniform(&mut self, low: u64, high_exclusive: u64) -> Result<u64, ProgramError> {
        if high_exclusive <= low {
            return Err(LotteryError::InvalidRandomDraw.into());
        }

        let sample = hashv(&[self.seed.as_ref(), self.draws.to_le_bytes().as_ref()]);
        self.draws = self.draws.wrapping_add(1);

        Ok(low + generate_random_value(sample.as_ref(), high_exclusive - low))
    }
}

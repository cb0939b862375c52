// Round Lottery - Entry and prize ledgers
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::error::LotteryError;

/// A player's cumulative stake in one round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Player who owns the stake
    pub player: Pubkey,
    /// Lamports staked in this round
    pub stake: u64,
    /// Time of the first deposit into this round
    pub entered_at: UnixTimestamp,
}

/// Round number -> entries in deposit order.
///
/// List order is what ticket numbers are assigned by, so it must survive
/// serialization unchanged.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryLedger {
    rounds: BTreeMap<u64, Vec<Entry>>,
}

impl EntryLedger {
    /// Entries of `round`, if the round has a bucket
    pub fn round(&self, round: u64) -> Option<&[Entry]> {
        self.rounds.get(&round).map(Vec::as_slice)
    }

    pub fn has_round(&self, round: u64) -> bool {
        self.rounds.contains_key(&round)
    }

    /// Entries of `round`, creating an empty bucket if absent
    pub fn get_or_create_round(&mut self, round: u64) -> &mut Vec<Entry> {
        self.rounds.entry(round).or_default()
    }

    /// Add `amount` to the player's stake in `round`, or append a new entry
    pub fn upsert(
        &mut self,
        round: u64,
        player: &Pubkey,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<(), LotteryError> {
        let entries = self.get_or_create_round(round);
        match entries.iter_mut().find(|entry| entry.player == *player) {
            Some(entry) => {
                entry.stake = entry
                    .stake
                    .checked_add(amount)
                    .ok_or(LotteryError::ArithmeticOverflow)?;
            }
            None => entries.push(Entry {
                player: *player,
                stake: amount,
                entered_at: now,
            }),
        }
        Ok(())
    }

    /// Merge an existing entry into `round`, keeping its original timestamp
    /// when the player has no entry there yet
    pub fn merge(&mut self, round: u64, carried: Entry) -> Result<(), LotteryError> {
        self.upsert(round, &carried.player, carried.stake, carried.entered_at)
    }

    /// Take the whole bucket of `round` out of the ledger
    pub fn remove_round(&mut self, round: u64) -> Option<Vec<Entry>> {
        self.rounds.remove(&round)
    }

    /// Player's stake in `round`, 0 if absent
    pub fn stake_of(&self, round: u64, player: &Pubkey) -> u64 {
        self.round(round)
            .and_then(|entries| entries.iter().find(|entry| entry.player == *player))
            .map_or(0, |entry| entry.stake)
    }

    pub fn player_count(&self, round: u64) -> u64 {
        self.round(round).map_or(0, |entries| entries.len() as u64)
    }

    /// Sum of all stakes in `round`, 0 if the bucket is absent
    pub fn round_total(&self, round: u64) -> Result<u64, LotteryError> {
        total_stake(self.round(round).unwrap_or(&[]))
    }

    /// Number of rounds that currently hold a bucket
    pub fn bucket_count(&self) -> usize {
        self.rounds.len()
    }
}

/// Checked sum of the stakes in an entry list
pub fn total_stake(entries: &[Entry]) -> Result<u64, LotteryError> {
    entries.iter().try_fold(0u64, |acc, entry| {
        acc.checked_add(entry.stake)
            .ok_or(LotteryError::ArithmeticOverflow)
    })
}

/// Winnings credited to players but not yet paid out
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnclaimedPrizeLedger {
    balances: BTreeMap<Pubkey, u64>,
}

impl UnclaimedPrizeLedger {
    pub fn get(&self, player: &Pubkey) -> u64 {
        self.balances.get(player).copied().unwrap_or(0)
    }

    /// Credit `amount` to the player, creating the balance if absent
    pub fn add(&mut self, player: &Pubkey, amount: u64) -> Result<(), LotteryError> {
        let balance = self.balances.entry(*player).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove and return the player's balance, 0 if there is none
    pub fn take(&mut self, player: &Pubkey) -> u64 {
        self.balances.remove(player).unwrap_or(0)
    }

    /// Sum of every outstanding balance
    pub fn total(&self) -> u64 {
        self.balances.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_merges_repeat_deposits() {
        let mut ledger = EntryLedger::default();
        let player = Pubkey::new_unique();

        ledger.upsert(1, &player, 100, 10).unwrap();
        ledger.upsert(1, &player, 250, 20).unwrap();

        let entries = ledger.round(1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stake, 350);
        // first deposit time is kept
        assert_eq!(entries[0].entered_at, 10);
    }

    #[test]
    fn upsert_appends_in_deposit_order() {
        let mut ledger = EntryLedger::default();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        ledger.upsert(4, &b, 5, 1).unwrap();
        ledger.upsert(4, &a, 7, 2).unwrap();
        ledger.upsert(4, &b, 1, 3).unwrap();

        let players: Vec<Pubkey> = ledger.round(4).unwrap().iter().map(|e| e.player).collect();
        assert_eq!(players, vec![b, a]);
        assert_eq!(ledger.round_total(4).unwrap(), 13);
        assert_eq!(ledger.player_count(4), 2);
    }

    #[test]
    fn absent_round_reads_as_empty() {
        let ledger = EntryLedger::default();
        assert!(ledger.round(9).is_none());
        assert_eq!(ledger.round_total(9).unwrap(), 0);
        assert_eq!(ledger.player_count(9), 0);
        assert_eq!(ledger.stake_of(9, &Pubkey::new_unique()), 0);
    }

    #[test]
    fn upsert_rejects_stake_overflow() {
        let mut ledger = EntryLedger::default();
        let player = Pubkey::new_unique();
        ledger.upsert(1, &player, u64::MAX, 0).unwrap();
        assert_eq!(
            ledger.upsert(1, &player, 1, 0),
            Err(LotteryError::ArithmeticOverflow)
        );
        assert_eq!(ledger.stake_of(1, &player), u64::MAX);
    }

    #[test]
    fn take_clears_balance() {
        let mut unclaimed = UnclaimedPrizeLedger::default();
        let player = Pubkey::new_unique();

        unclaimed.add(&player, 40).unwrap();
        unclaimed.add(&player, 2).unwrap();
        assert_eq!(unclaimed.get(&player), 42);

        assert_eq!(unclaimed.take(&player), 42);
        assert_eq!(unclaimed.take(&player), 0);
        assert_eq!(unclaimed.get(&player), 0);
    }

    #[test]
    fn ledgers_survive_borsh() {
        let mut ledger = EntryLedger::default();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        ledger.upsert(2, &a, 3, 0).unwrap();
        ledger.upsert(2, &b, 4, 0).unwrap();

        let bytes = ledger.try_to_vec().unwrap();
        let decoded = EntryLedger::try_from_slice(&bytes).unwrap();
        assert_eq!(decoded, ledger);
        assert_eq!(decoded.round(2).unwrap()[0].player, a);
    }
}

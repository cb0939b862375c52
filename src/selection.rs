// Round Lottery - Weighted winner selection
use crate::{error::LotteryError, ledger::Entry};

/// Outcome of a draw over one round's entries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Copy of the winning entry
    pub winner: Entry,
    /// Number of entries the draw was made over
    pub player_count: u64,
}

/// Pick the entry holding ticket `random_draw + 1`.
///
/// Tickets `1..=prize_total` are handed out in list order, so an entry with
/// stake `s` covers `s` consecutive ticket numbers after everything listed
/// before it. `random_draw` must lie in `[0, prize_total)` and `prize_total`
/// must equal the sum of the stakes.
pub fn select_winner(
    entries: &[Entry],
    prize_total: u64,
    random_draw: u64,
) -> Result<Selection, LotteryError> {
    if entries.is_empty() || random_draw >= prize_total {
        return Err(LotteryError::InvalidRandomDraw);
    }

    // random_draw < prize_total, so this cannot overflow
    let mut remaining = random_draw + 1;
    for entry in entries {
        if remaining <= entry.stake {
            return Ok(Selection {
                winner: *entry,
                player_count: entries.len() as u64,
            });
        }
        remaining -= entry.stake;
    }

    // Only reachable when prize_total overstates the stakes
    Err(LotteryError::InvalidRandomDraw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::pubkey::Pubkey;

    fn entry(stake: u64) -> Entry {
        Entry {
            player: Pubkey::new_unique(),
            stake,
            entered_at: 0,
        }
    }

    #[test]
    fn tickets_follow_list_order() {
        let entries = [entry(3), entry(1), entry(6)];

        let winners: Vec<Pubkey> = (0..10)
            .map(|draw| select_winner(&entries, 10, draw).unwrap().winner.player)
            .collect();

        let a = entries[0].player;
        let b = entries[1].player;
        let c = entries[2].player;
        assert_eq!(winners, vec![a, a, a, b, c, c, c, c, c, c]);
    }

    #[test]
    fn returns_player_count_and_stake() {
        let entries = [entry(5), entry(5)];
        let selection = select_winner(&entries, 10, 9).unwrap();
        assert_eq!(selection.player_count, 2);
        assert_eq!(selection.winner, entries[1]);
    }

    #[test]
    fn rejects_out_of_range_draws() {
        let entries = [entry(2), entry(2)];
        assert_eq!(
            select_winner(&entries, 4, 4),
            Err(LotteryError::InvalidRandomDraw)
        );
        assert_eq!(select_winner(&[], 0, 0), Err(LotteryError::InvalidRandomDraw));
    }

    #[test]
    fn rejects_overstated_total() {
        let entries = [entry(2), entry(2)];
        assert_eq!(
            select_winner(&entries, 10, 7),
            Err(LotteryError::InvalidRandomDraw)
        );
    }
}

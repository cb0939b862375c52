// Round Lottery - Notifications
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, log::sol_log_data, msg, pubkey::Pubkey};

/// Structured notifications emitted by the game
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    GameInitialized {
        round: u64,
        round_duration: u64,
        started_at: UnixTimestamp,
    },
    /// A deposit was spread over `first_round..=last_round`
    EntryRecorded {
        player: Pubkey,
        stake_per_round: u64,
        first_round: u64,
        last_round: u64,
        current_round: u64,
    },
    RoundStarting {
        round: u64,
        player_count: u64,
        prize: u64,
    },
    /// Emitted once per entry before the round is resolved
    EntryObserved {
        round: u64,
        player: Pubkey,
        stake: u64,
        entered_at: UnixTimestamp,
    },
    Winner {
        round: u64,
        player: Pubkey,
        prize: u64,
        player_count: u64,
        winning_stake: u64,
    },
    /// Round closed without a payout. With one player `prize` is the stake
    /// that was carried into the next round.
    NoWinner {
        round: u64,
        player_count: u64,
        prize: u64,
    },
    RoundAdvanced {
        previous_round: u64,
        round: u64,
    },
    TimestampUpdated {
        last_round_time: UnixTimestamp,
    },
    PrizeClaimed {
        player: Pubkey,
        amount: u64,
    },
}

/// Fire-and-forget event consumer
pub trait NotificationSink {
    fn emit(&mut self, event: LotteryEvent);
}

/// Collects events in emission order
impl NotificationSink for Vec<LotteryEvent> {
    fn emit(&mut self, event: LotteryEvent) {
        self.push(event);
    }
}

/// Writes events to the program log: a readable line plus the borsh bytes
/// as log data for indexers
pub struct ProgramLogSink;

impl NotificationSink for ProgramLogSink {
    fn emit(&mut self, event: LotteryEvent) {
        msg!("Event: {:?}", event);
        if let Ok(bytes) = event.try_to_vec() {
            sol_log_data(&[bytes.as_slice()]);
        }
    }
}

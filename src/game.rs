// Round Lottery - Game core
//
// Every operation validates and computes everything it needs before the
// first write to `GameState`, so a failed call leaves the state untouched.
use solana_program::{
    clock::UnixTimestamp, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    error::LotteryError,
    events::{LotteryEvent, NotificationSink},
    ledger::Entry,
    oracle::{GameClock, RandomnessOracle, Treasury},
    selection::select_winner,
    state::{GameConfig, GameState, MAX_ROUNDS_AHEAD},
};

/// How a round was resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Nobody entered the round
    NoPlayers,
    /// The only entry moved into the next round without a payout
    CarriedForward { entry: Entry },
    /// `prize` was credited to the winner's unclaimed balance
    Won {
        winner: Entry,
        prize: u64,
        player_count: u64,
    },
}

/// One-time setup of a freshly allocated game state
pub fn initialize<C: GameClock, N: NotificationSink>(
    state: &mut GameState,
    config: &GameConfig,
    clock: &C,
    sink: &mut N,
) -> ProgramResult {
    if state.is_initialized {
        msg!("Game state is already initialized");
        return Err(LotteryError::AlreadyInitialized.into());
    }

    *state = GameState::new(clock.now());

    msg!(
        "Game initialized: round={}, round_duration={}s",
        state.round,
        config.round_duration
    );
    sink.emit(LotteryEvent::GameInitialized {
        round: state.round,
        round_duration: config.round_duration,
        started_at: state.last_round_time,
    });
    Ok(())
}

/// Stake `stake_per_round` in each of the next `round_count` rounds,
/// starting with the current one
pub fn enter_game<T, C, N>(
    state: &mut GameState,
    treasury: &mut T,
    clock: &C,
    sink: &mut N,
    player: &Pubkey,
    round_count: u64,
    stake_per_round: u64,
) -> ProgramResult
where
    T: Treasury,
    C: GameClock,
    N: NotificationSink,
{
    state.ensure_initialized()?;

    if round_count == 0 || round_count > MAX_ROUNDS_AHEAD {
        msg!(
            "Round count must be between 1 and {}, got {}",
            MAX_ROUNDS_AHEAD,
            round_count
        );
        return Err(LotteryError::InvalidRoundCount.into());
    }
    if stake_per_round == 0 {
        msg!("Stake per round must be greater than zero");
        return Err(LotteryError::InvalidStake.into());
    }

    let total = round_count
        .checked_mul(stake_per_round)
        .ok_or(LotteryError::ArithmeticOverflow)?;
    let first_round = state.round;
    let last_round = first_round
        .checked_add(round_count - 1)
        .ok_or(LotteryError::ArithmeticOverflow)?;

    for round in first_round..=last_round {
        state
            .entries
            .stake_of(round, player)
            .checked_add(stake_per_round)
            .ok_or(LotteryError::ArithmeticOverflow)?;
    }

    let now = clock.now();
    msg!(
        "Entering rounds {}..={} with {} lamports each ({} total)",
        first_round,
        last_round,
        stake_per_round,
        total
    );
    treasury.withdraw(player, total)?;

    for round in first_round..=last_round {
        state.entries.upsert(round, player, stake_per_round, now)?;
    }

    sink.emit(LotteryEvent::EntryRecorded {
        player: *player,
        stake_per_round,
        first_round,
        last_round,
        current_round: state.round,
    });
    Ok(())
}

/// Close the current round and move on to the next one.
///
/// Callable by anyone once the cooldown has elapsed.
pub fn start_game<C, R, N>(
    state: &mut GameState,
    config: &GameConfig,
    clock: &C,
    oracle: &mut R,
    sink: &mut N,
) -> Result<RoundOutcome, ProgramError>
where
    C: GameClock,
    R: RandomnessOracle,
    N: NotificationSink,
{
    state.ensure_initialized()?;

    let now = clock.now();
    let opens_at = config.cooldown_ends_at(state.last_round_time)?;
    if now <= opens_at {
        msg!("Round {} can be closed after {}, now {}", state.round, opens_at, now);
        return Err(LotteryError::RoundTooSoon.into());
    }

    let round = state.round;
    let next_round = round.checked_add(1).ok_or(LotteryError::ArithmeticOverflow)?;
    let prize = state.entries.round_total(round)?;
    let player_count = state.entries.player_count(round);

    let outcome = match state.entries.round(round) {
        None | Some([]) => RoundOutcome::NoPlayers,
        Some([sole]) => {
            state
                .entries
                .stake_of(next_round, &sole.player)
                .checked_add(sole.stake)
                .ok_or(LotteryError::ArithmeticOverflow)?;
            RoundOutcome::CarriedForward { entry: *sole }
        }
        Some(entries) => {
            let draw = oracle.uniform(0, prize)?;
            let selection = select_winner(entries, prize, draw)?;
            state
                .unclaimed
                .get(&selection.winner.player)
                .checked_add(prize)
                .ok_or(LotteryError::ArithmeticOverflow)?;
            msg!("Drew ticket {} of {}", draw + 1, prize);
            RoundOutcome::Won {
                winner: selection.winner,
                prize,
                player_count: selection.player_count,
            }
        }
    };

    msg!(
        "Closing round {}: {} players, {} lamports",
        round,
        player_count,
        prize
    );
    sink.emit(LotteryEvent::RoundStarting {
        round,
        player_count,
        prize,
    });

    let has_bucket = match state.entries.round(round) {
        None => {
            sink.emit(LotteryEvent::NoWinner {
                round,
                player_count: 0,
                prize: 0,
            });
            false
        }
        Some(entries) => {
            for entry in entries {
                sink.emit(LotteryEvent::EntryObserved {
                    round,
                    player: entry.player,
                    stake: entry.stake,
                    entered_at: entry.entered_at,
                });
            }
            true
        }
    };
    if has_bucket {
        resolve(state, round, next_round, &outcome, sink)?;
    }

    update_game_state(state, round, next_round, now, sink);
    Ok(outcome)
}

/// Apply a resolved outcome to a round that has a bucket
fn resolve<N: NotificationSink>(
    state: &mut GameState,
    round: u64,
    next_round: u64,
    outcome: &RoundOutcome,
    sink: &mut N,
) -> ProgramResult {
    match *outcome {
        RoundOutcome::Won {
            winner,
            prize,
            player_count,
        } => {
            state.entries.remove_round(round);
            state.unclaimed.add(&winner.player, prize)?;
            msg!("Round {} won by {} ({} lamports)", round, winner.player, prize);
            sink.emit(LotteryEvent::Winner {
                round,
                player: winner.player,
                prize,
                player_count,
                winning_stake: winner.stake,
            });
        }
        RoundOutcome::CarriedForward { entry } => {
            state.entries.remove_round(round);
            state.entries.merge(next_round, entry)?;
            msg!(
                "Only {} entered round {}, carrying {} lamports into round {}",
                entry.player,
                round,
                entry.stake,
                next_round
            );
            sink.emit(LotteryEvent::NoWinner {
                round,
                player_count: 1,
                prize: entry.stake,
            });
        }
        RoundOutcome::NoPlayers => sink.emit(LotteryEvent::NoWinner {
            round,
            player_count: 0,
            prize: 0,
        }),
    }
    Ok(())
}

/// Drop whatever is left of the closed round and advance the counter
fn update_game_state<N: NotificationSink>(
    state: &mut GameState,
    round: u64,
    next_round: u64,
    now: UnixTimestamp,
    sink: &mut N,
) {
    if state.entries.has_round(round) {
        state.entries.remove_round(round);
    }
    state.round = next_round;
    state.last_round_time = now;

    msg!("Advanced to round {}", next_round);
    sink.emit(LotteryEvent::RoundAdvanced {
        previous_round: round,
        round: next_round,
    });
    sink.emit(LotteryEvent::TimestampUpdated {
        last_round_time: now,
    });
}

/// Pay out the caller's whole unclaimed balance
pub fn claim_prize<T, N>(
    state: &mut GameState,
    treasury: &mut T,
    sink: &mut N,
    player: &Pubkey,
) -> Result<u64, ProgramError>
where
    T: Treasury,
    N: NotificationSink,
{
    state.ensure_initialized()?;

    let amount = state.get_unclaimed_prize(player);
    if amount == 0 {
        msg!("No unclaimed prize for {}", player);
        return Err(LotteryError::NoUnclaimedPrize.into());
    }

    treasury.deposit(player, amount)?;
    state.unclaimed.take(player);

    msg!("{} claimed {} lamports", player, amount);
    sink.emit(LotteryEvent::PrizeClaimed {
        player: *player,
        amount,
    });
    Ok(amount)
}

/// Lamports held by the treasury for the game
pub fn vault_balance<T: Treasury>(treasury: &T) -> u64 {
    treasury.balance()
}

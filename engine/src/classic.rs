use itertools::Itertools;
use types::{total_points, ClassicProgress, Dart, Progress, TurnOutcome, Variant};
use uuid::Uuid;

use crate::{
    rules::{mismatched, Preview, Resolution, VariantEngine, MAX_DARTS},
    GameState, Result,
};

/// Result of taking a visit's total off the remaining score.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Countdown {
    Bust,
    Checkout,
    Remaining(u32),
}

/// Busts below zero or on exactly one; finishing is not required to be on
/// a double.
pub fn countdown(remaining: u32, total: u32) -> Countdown {
    match remaining.checked_sub(total) {
        None | Some(1) => Countdown::Bust,
        Some(0) => Countdown::Checkout,
        Some(left) => Countdown::Remaining(left),
    }
}

#[derive(Debug)]
pub struct ClassicEngine {
    starting_score: u32,
}

impl ClassicEngine {
    pub fn new(starting_score: u32) -> Self {
        Self { starting_score }
    }

    fn remaining(&self, state: &GameState) -> Result<u32> {
        state
            .current_progress()
            .as_classic()
            .map(|p| p.remaining)
            .ok_or_else(|| mismatched(self.variant(), state.current_progress()))
    }
}

impl VariantEngine for ClassicEngine {
    fn variant(&self) -> Variant {
        Variant::Classic {
            starting_score: self.starting_score,
        }
    }

    fn initial_progress(&self) -> Progress {
        Progress::Classic(ClassicProgress {
            remaining: self.starting_score,
        })
    }

    fn resolve(&self, state: &GameState, darts: &[Dart]) -> Result<Resolution> {
        let before = self.remaining(state)?;
        let total = total_points(darts);
        let player = state.current_player();

        let (after, bust, winner) = match countdown(before, total) {
            Countdown::Bust => {
                log::debug!("{player} busts on {total} with {before} remaining");
                (before, true, None)
            }
            Countdown::Checkout => {
                log::info!("{player} checks out {before} with {}", darts.iter().join(", "));
                (0, false, Some(player.id))
            }
            Countdown::Remaining(left) => (left, false, None),
        };

        let scores = if bust {
            vec![0]
        } else {
            darts.iter().map(Dart::points).collect()
        };
        let checkout = if winner.is_some() {
            Vec::new()
        } else {
            checkout::suggest(after)
        };

        Ok(Resolution {
            progress: vec![(
                state.current,
                Progress::Classic(ClassicProgress { remaining: after }),
            )],
            outcome: TurnOutcome::Classic {
                remaining_before: before,
                remaining_after: after,
            },
            scores,
            bust,
            winner,
            checkout,
        })
    }

    fn winner(&self, state: &GameState) -> Option<Uuid> {
        state
            .players
            .iter()
            .zip(&state.progress)
            .find(|(_, progress)| progress.as_classic().is_some_and(|p| p.remaining == 0))
            .map(|(player, _)| player.id)
    }

    fn preview(&self, state: &GameState, darts: &[Dart]) -> Result<Preview> {
        let before = self.remaining(state)?;
        let (remaining, bust, winning) = match countdown(before, total_points(darts)) {
            Countdown::Bust => (before, true, false),
            Countdown::Checkout => (0, false, true),
            Countdown::Remaining(left) => (left, false, false),
        };
        let checkout = if bust || winning {
            Vec::new()
        } else {
            checkout::suggest_within(remaining, MAX_DARTS.saturating_sub(darts.len()))
        };
        Ok(Preview {
            progress: Progress::Classic(ClassicProgress { remaining }),
            bust,
            winning,
            checkout,
        })
    }
}

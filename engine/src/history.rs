//! The turn log and the one transition function every path goes through.
//!
//! Submitting a visit, reloading a game, resynchronising after a duplicate
//! and reverting all fold [`step`] over a prefix of the log, so a state
//! rebuilt from scratch is identical to the one built turn by turn.

use types::{Dart, Turn};
use uuid::Uuid;

use crate::{rules::Resolution, EngineError, GameState, Result, VariantEngine};

/// Append-only record of a game's visits. Turn ids are 1-based positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnHistory {
    turns: Vec<Turn>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn append(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len()
    }

    /// Keeps the first `keep` turns and hands back the rest.
    pub fn truncate(&mut self, keep: usize) -> Vec<Turn> {
        if keep >= self.turns.len() {
            return Vec::new();
        }
        self.turns.split_off(keep)
    }

    /// The turn a player recorded for a given turn number, with its id.
    pub fn find(&self, player_id: Uuid, turn_number: u32) -> Option<(usize, &Turn)> {
        self.turns
            .iter()
            .enumerate()
            .find(|(_, t)| t.player_id == player_id && t.turn_number == turn_number)
            .map(|(idx, t)| (idx + 1, t))
    }
}

/// Applies one visit by the current player.
pub fn step(
    engine: &dyn VariantEngine,
    state: &GameState,
    darts: &[Dart],
) -> Result<(GameState, Resolution)> {
    let resolution = engine.resolve(state, darts)?;
    let mut next = state.clone();
    for (seat, progress) in &resolution.progress {
        next.progress[*seat] = progress.clone();
    }
    match resolution.winner {
        Some(winner) => next.winner = Some(winner),
        None => next.advance(),
    }
    Ok((next, resolution))
}

/// Rebuilds a game's state from its initial state and a log prefix.
pub fn replay(engine: &dyn VariantEngine, initial: &GameState, turns: &[Turn]) -> Result<GameState> {
    turns
        .iter()
        .enumerate()
        .try_fold(initial.clone(), |state, (idx, turn)| {
            let turn_id = idx + 1;
            if state.is_complete() {
                return Err(EngineError::CorruptHistory(format!(
                    "turn {turn_id} follows the end of the game"
                )));
            }
            let expected = state.current_player();
            if turn.player_id != expected.id || turn.turn_number != state.round {
                return Err(EngineError::CorruptHistory(format!(
                    "turn {turn_id} is round {} for {}, expected round {} for {}",
                    turn.turn_number, turn.player_id, state.round, expected.id
                )));
            }
            step(engine, &state, &turn.darts)
                .map(|(next, _)| next)
                .map_err(|e| EngineError::CorruptHistory(format!("turn {turn_id}: {e}")))
        })
}

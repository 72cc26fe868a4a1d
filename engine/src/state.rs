use std::fmt::Display;

use types::{Player, Progress};
use uuid::Uuid;

/// Everything the rules need to resolve the next visit.
///
/// `players` and `progress` are parallel, ordered by turn order. `round` is
/// the turn number the current player is expected to submit.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub players: Vec<Player>,
    pub progress: Vec<Progress>,
    pub current: usize,
    pub round: u32,
    pub winner: Option<Uuid>,
}

impl GameState {
    pub fn new(players: Vec<Player>, initial: Progress) -> Self {
        let progress = vec![initial; players.len()];
        Self {
            players,
            progress,
            current: 0,
            round: 1,
            winner: None,
        }
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn current_progress(&self) -> &Progress {
        &self.progress[self.current]
    }

    pub fn index_of(&self, player_id: Uuid) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn progress_of(&self, player_id: Uuid) -> Option<&Progress> {
        self.index_of(player_id).map(|idx| &self.progress[idx])
    }

    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    /// Players still in the game, with their progress.
    pub fn active(&self) -> impl Iterator<Item = (&Player, &Progress)> {
        self.players
            .iter()
            .zip(self.progress.iter())
            .filter(|(_, progress)| !progress.is_eliminated())
    }

    /// Scans forward from the current seat for the next player who is not
    /// eliminated. Gives up after one lap.
    pub fn next_player_index(&self) -> Option<usize> {
        let count = self.players.len();
        (1..=count)
            .map(|offset| (self.current + offset) % count)
            .find(|&idx| !self.progress[idx].is_eliminated())
    }

    /// Moves play to the next player, starting a new round on wrap-around.
    pub fn advance(&mut self) {
        match self.next_player_index() {
            Some(next) => {
                if next <= self.current {
                    self.round += 1;
                }
                self.current = next;
            }
            None => log::warn!("No player left to take a turn"),
        }
    }

    pub fn standings(&self) -> Vec<(Player, Progress)> {
        self.players
            .iter()
            .cloned()
            .zip(self.progress.iter().cloned())
            .collect()
    }
}

impl Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Round {}", self.round)?;
        for (idx, (player, progress)) in self.players.iter().zip(&self.progress).enumerate() {
            let marker = if idx == self.current { "*" } else { " " };
            writeln!(f, "{marker} {player}: {progress}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::KillerProgress;

    fn killer_state(eliminated: &[usize]) -> GameState {
        let mut state = GameState::new(
            Player::roster(&["Alice", "Bob", "Carol"]),
            Progress::Killer(KillerProgress::default()),
        );
        for &idx in eliminated {
            state.progress[idx] = Progress::Killer(KillerProgress {
                is_eliminated: true,
                ..KillerProgress::default()
            });
        }
        state
    }

    #[test]
    fn test_advance_wraps_into_next_round() {
        let mut state = killer_state(&[]);
        state.advance();
        state.advance();
        assert_eq!((state.current, state.round), (2, 1));
        state.advance();
        assert_eq!((state.current, state.round), (0, 2));
    }

    #[test]
    fn test_advance_skips_eliminated_players() {
        let mut state = killer_state(&[1]);
        state.advance();
        assert_eq!((state.current, state.round), (2, 1));

        let mut state = killer_state(&[2]);
        state.current = 1;
        state.advance();
        assert_eq!((state.current, state.round), (0, 2));
    }

    #[test]
    fn test_scan_is_bounded() {
        let state = killer_state(&[0, 1, 2]);
        assert_eq!(state.next_player_index(), None);
    }

    #[test]
    fn test_single_player_keeps_throwing() {
        let mut state = GameState::new(
            Player::roster(&["Solo"]),
            Progress::Killer(KillerProgress::default()),
        );
        state.advance();
        assert_eq!((state.current, state.round), (0, 2));
    }
}

use std::collections::HashSet;

use chrono::Utc;
use itertools::Itertools;
use types::{Dart, Game, GameStatus, Player, Progress, Turn, TurnContext, Variant};
use uuid::Uuid;

use crate::{
    history::{replay, step, TurnHistory},
    killer::{current_phase, KillerPhase},
    rules::{engine_for, validate_darts, Preview, Resolution},
    EngineError, GameState, Result, VariantEngine,
};

/// A visit that passed validation but is not part of the game yet.
#[derive(Clone, Debug)]
pub struct PendingTurn {
    pub turn: Turn,
    pub turn_id: usize,
    pub state: GameState,
    pub game: Game,
    pub resolution: Resolution,
}

#[derive(Clone, Debug)]
pub enum Submission {
    Applied(PendingTurn),
    /// The player already has this turn number on record.
    Duplicate(Turn),
}

#[derive(Clone, Debug)]
pub struct PendingRevert {
    pub keep: usize,
    pub state: GameState,
    pub discarded: Vec<Turn>,
}

/// The log and standings left after a revert.
#[derive(Clone, Debug, PartialEq)]
pub struct RevertOutcome {
    pub turns: Vec<Turn>,
    pub progress: Vec<(Player, Progress)>,
}

/// One game in memory: metadata, roster, log, and the state the log
/// produces. Nothing here touches storage.
#[derive(Debug)]
pub struct GameSession {
    game: Game,
    engine: Box<dyn VariantEngine>,
    initial: GameState,
    state: GameState,
    history: TurnHistory,
    discarded: HashSet<(Uuid, u32)>,
}

pub fn validate_roster(players: &[Player]) -> Result<()> {
    if players.is_empty() {
        return Err(EngineError::InvalidRoster(
            "a game needs at least one player".to_string(),
        ));
    }
    let orders = players.iter().map(|p| p.turn_order).sorted().collect_vec();
    let expected = (1..=players.len() as u32).collect_vec();
    if orders != expected {
        return Err(EngineError::InvalidRoster(format!(
            "turn orders must run 1..={} without gaps or repeats, got {orders:?}",
            players.len()
        )));
    }
    let ids: HashSet<Uuid> = players.iter().map(|p| p.id).collect();
    if ids.len() != players.len() {
        return Err(EngineError::InvalidRoster(
            "a player appears twice".to_string(),
        ));
    }
    Ok(())
}

impl GameSession {
    pub fn new(variant: Variant, players: Vec<Player>) -> Result<Self> {
        Self::with_game(Game::new(variant), players)
    }

    fn with_game(game: Game, mut players: Vec<Player>) -> Result<Self> {
        validate_roster(&players)?;
        players.sort_by_key(|p| p.turn_order);
        let engine = engine_for(game.variant)?;
        let initial = GameState::new(players, engine.initial_progress());
        Ok(Self {
            game,
            engine,
            state: initial.clone(),
            initial,
            history: TurnHistory::new(),
            discarded: HashSet::new(),
        })
    }

    /// Rebuilds a stored game by replaying its log.
    pub fn restore(game: Game, players: Vec<Player>, turns: Vec<Turn>) -> Result<Self> {
        let mut session = Self::with_game(game, players)?;
        session.resync(turns)?;
        Ok(session)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    pub fn players(&self) -> &[Player] {
        &self.state.players
    }

    pub fn engine(&self) -> &dyn VariantEngine {
        self.engine.as_ref()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.game.is_active() {
            Ok(())
        } else {
            Err(EngineError::GameNotActive {
                game_id: self.game.id,
                status: self.game.status,
            })
        }
    }

    fn ensure_current(&self, player_id: Uuid) -> Result<()> {
        if self.state.index_of(player_id).is_none() {
            return Err(EngineError::UnknownPlayer(player_id));
        }
        let expected = self.state.current_player().id;
        if player_id != expected {
            return Err(EngineError::OutOfTurn {
                expected,
                got: player_id,
            });
        }
        Ok(())
    }

    /// Validates and resolves a visit without applying it.
    pub fn prepare_submission(
        &self,
        player_id: Uuid,
        turn_number: u32,
        darts: &[Dart],
    ) -> Result<Submission> {
        if let Some((_, existing)) = self.history.find(player_id, turn_number) {
            return Ok(Submission::Duplicate(existing.clone()));
        }
        self.ensure_active()?;
        self.ensure_current(player_id)?;
        if turn_number != self.state.round {
            return Err(EngineError::TurnNumberMismatch {
                expected: self.state.round,
                got: turn_number,
            });
        }
        validate_darts(darts)?;

        let (state, resolution) = step(self.engine(), &self.state, darts)?;
        let turn = Turn {
            game_id: self.game.id,
            player_id,
            turn_number,
            darts: darts.to_vec(),
            scores: resolution.scores.clone(),
            outcome: resolution.outcome.clone(),
            bust: resolution.bust,
            checkout: resolution.winner.is_some(),
            edited: self.discarded.contains(&(player_id, turn_number)),
            created_at: Utc::now(),
        };

        let mut game = self.game.clone();
        if let Some(winner) = resolution.winner {
            game.winner = Some(winner);
            game.set_status(GameStatus::Completed);
        }

        Ok(Submission::Applied(PendingTurn {
            turn,
            turn_id: self.history.len() + 1,
            state,
            game,
            resolution,
        }))
    }

    pub fn commit(&mut self, pending: PendingTurn) -> Turn {
        let PendingTurn {
            turn, state, game, ..
        } = pending;
        log::info!(
            "{} threw: {}",
            self.state.current_player(),
            turn.darts.iter().join(", ")
        );
        self.discarded.remove(&(turn.player_id, turn.turn_number));
        self.history.append(turn.clone());
        self.state = state;
        if let (Some(winner), None) = (game.winner, self.game.winner) {
            log::info!("Game {} won by {winner}", game.id);
        }
        self.game = game;
        turn
    }

    /// Validates, resolves and applies a visit in one go.
    pub fn submit(&mut self, player_id: Uuid, turn_number: u32, darts: &[Dart]) -> Result<Turn> {
        match self.prepare_submission(player_id, turn_number, darts)? {
            Submission::Applied(pending) => Ok(self.commit(pending)),
            Submission::Duplicate(turn) => Ok(turn),
        }
    }

    /// What the board would look like if the visit ended after `darts`.
    pub fn preview(&self, player_id: Uuid, darts: &[Dart]) -> Result<Preview> {
        self.ensure_active()?;
        self.ensure_current(player_id)?;
        validate_darts(darts)?;
        self.engine.preview(&self.state, darts)
    }

    pub fn prepare_revert(&self, turn_id: usize) -> Result<PendingRevert> {
        self.ensure_active()?;
        let len = self.history.len();
        if turn_id == 0 || turn_id > len {
            return Err(EngineError::UnknownTurn { turn_id, len });
        }
        let turns = self.history.turns();
        let state = if turn_id == len {
            self.state.clone()
        } else {
            replay(self.engine(), &self.initial, &turns[..turn_id])?
        };
        Ok(PendingRevert {
            keep: turn_id,
            state,
            discarded: turns[turn_id..].to_vec(),
        })
    }

    pub fn commit_revert(&mut self, pending: PendingRevert) -> RevertOutcome {
        let discarded = self.history.truncate(pending.keep);
        if !discarded.is_empty() {
            log::info!(
                "Game {} reverted to turn {}, {} turns discarded",
                self.game.id,
                pending.keep,
                discarded.len()
            );
        }
        self.discarded
            .extend(discarded.iter().map(|t| (t.player_id, t.turn_number)));
        self.state = pending.state;
        self.revert_outcome()
    }

    pub fn revert_to(&mut self, turn_id: usize) -> Result<RevertOutcome> {
        let pending = self.prepare_revert(turn_id)?;
        Ok(self.commit_revert(pending))
    }

    fn revert_outcome(&self) -> RevertOutcome {
        RevertOutcome {
            turns: self.history.turns().to_vec(),
            progress: self.state.standings(),
        }
    }

    /// Replaces the log with an authoritative copy and replays it.
    pub fn resync(&mut self, turns: Vec<Turn>) -> Result<()> {
        let state = replay(self.engine(), &self.initial, &turns)?;
        if let Some(winner) = state.winner {
            if self.game.status != GameStatus::Completed || self.game.winner != Some(winner) {
                self.game.winner = Some(winner);
                self.game.set_status(GameStatus::Completed);
            }
        }
        self.history = TurnHistory::from_turns(turns);
        self.state = state;
        Ok(())
    }

    /// The game with its status changed, validated but not applied.
    pub fn prepare_status(&self, status: GameStatus) -> Result<Game> {
        let allowed = matches!(
            (self.game.status, status),
            (GameStatus::Active, GameStatus::Paused) | (GameStatus::Paused, GameStatus::Active)
        );
        if !allowed {
            return Err(EngineError::GameNotActive {
                game_id: self.game.id,
                status: self.game.status,
            });
        }
        let mut game = self.game.clone();
        game.set_status(status);
        Ok(game)
    }

    pub fn commit_game(&mut self, game: Game) {
        log::info!("Game {} is now {}", game.id, game.status);
        self.game = game;
    }

    /// `None` for variants without phases.
    pub fn current_phase(&self) -> Option<KillerPhase> {
        match self.game.variant {
            Variant::Killer(_) => Some(current_phase(&self.state.progress)),
            _ => None,
        }
    }

    pub fn check_winner(&self) -> Option<&Player> {
        let winner = self.engine.winner(&self.state)?;
        self.state.players.iter().find(|p| p.id == winner)
    }

    /// What the player due to throw needs to know, or `None` once the game
    /// is no longer in play.
    pub fn turn_context(&self) -> Option<TurnContext> {
        if !self.game.is_active() || self.state.is_complete() {
            return None;
        }
        let current = self.state.current;
        let progress = self.state.current_progress().clone();
        let checkout = progress
            .as_classic()
            .map(|p| checkout::suggest(p.remaining))
            .unwrap_or_default();
        let opponents = self
            .state
            .standings()
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| *idx != current)
            .map(|(_, standing)| standing)
            .collect();
        Some(TurnContext {
            variant: self.game.variant,
            turn_number: self.state.round,
            player: self.state.current_player().clone(),
            progress,
            opponents,
            checkout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ClassicProgress, KillerOptions, PlayerKind};

    fn classic_session() -> (GameSession, Uuid, Uuid) {
        let session = GameSession::new(
            Variant::Classic {
                starting_score: 301,
            },
            Player::roster(&["Alice", "Bob"]),
        )
        .unwrap();
        let alice = session.players()[0].id;
        let bob = session.players()[1].id;
        (session, alice, bob)
    }

    #[test]
    fn test_roster_validation() {
        let variant = Variant::Killer(KillerOptions::default());
        assert!(matches!(
            GameSession::new(variant, vec![]),
            Err(EngineError::InvalidRoster(_))
        ));
        let gap = vec![
            Player::new("Alice", PlayerKind::Primary, 1),
            Player::new("Bob", PlayerKind::Secondary, 3),
        ];
        assert!(matches!(
            GameSession::new(variant, gap),
            Err(EngineError::InvalidRoster(_))
        ));
        let shuffled = vec![
            Player::new("Bob", PlayerKind::Secondary, 2),
            Player::new("Alice", PlayerKind::Primary, 1),
        ];
        let session = GameSession::new(variant, shuffled).unwrap();
        assert_eq!(session.players()[0].name, "Alice");
    }

    #[test]
    fn test_validation_order_and_no_mutation() {
        let (mut session, alice, bob) = classic_session();
        assert!(matches!(
            session.submit(bob, 1, &[Dart::Single(1)]),
            Err(EngineError::OutOfTurn { expected, .. }) if expected == alice
        ));
        assert!(matches!(
            session.submit(alice, 2, &[Dart::Single(1)]),
            Err(EngineError::TurnNumberMismatch { expected: 1, got: 2 })
        ));
        assert!(matches!(
            session.submit(alice, 1, &[Dart::Miss; 4]),
            Err(EngineError::TooManyDarts { .. })
        ));
        assert!(matches!(
            session.submit(alice, 1, &[Dart::Triple(25)]),
            Err(EngineError::InvalidDart(_))
        ));
        assert!(matches!(
            session.submit(Uuid::new_v4(), 1, &[]),
            Err(EngineError::UnknownPlayer(_))
        ));
        assert!(session.history().is_empty());
        assert_eq!(session.state().current, 0);
    }

    #[test]
    fn test_duplicate_submission_is_a_noop() {
        let (mut session, alice, _) = classic_session();
        let first = session.submit(alice, 1, &[Dart::Triple(20)]).unwrap();
        let again = session.submit(alice, 1, &[Dart::Bull]).unwrap();
        assert_eq!(first, again);
        assert_eq!(session.history().len(), 1);
        assert_eq!(
            session.state().progress[0],
            Progress::Classic(ClassicProgress { remaining: 241 })
        );
    }

    #[test]
    fn test_revert_rules() {
        let (mut session, alice, bob) = classic_session();
        session.submit(alice, 1, &[Dart::Triple(20)]).unwrap();
        session.submit(bob, 1, &[Dart::Triple(19)]).unwrap();
        session.submit(alice, 2, &[Dart::Triple(18)]).unwrap();

        assert!(matches!(
            session.revert_to(0),
            Err(EngineError::UnknownTurn { turn_id: 0, len: 3 })
        ));
        assert!(matches!(
            session.revert_to(4),
            Err(EngineError::UnknownTurn { .. })
        ));

        let unchanged = session.revert_to(3).unwrap();
        assert_eq!(unchanged.turns.len(), 3);

        let outcome = session.revert_to(1).unwrap();
        assert_eq!(outcome.turns.len(), 1);
        assert_eq!(
            outcome.progress[1].1,
            Progress::Classic(ClassicProgress { remaining: 301 })
        );
        assert_eq!(session.state().current, 1);
        assert_eq!(session.state().round, 1);
    }

    #[test]
    fn test_resubmitted_turns_are_marked_edited() {
        let (mut session, alice, bob) = classic_session();
        session.submit(alice, 1, &[Dart::Triple(20)]).unwrap();
        session.submit(bob, 1, &[Dart::Triple(19)]).unwrap();
        session.revert_to(1).unwrap();

        let edited = session.submit(bob, 1, &[Dart::Single(19)]).unwrap();
        assert!(edited.edited);
        let fresh = session.submit(alice, 2, &[Dart::Single(1)]).unwrap();
        assert!(!fresh.edited);
    }

    #[test]
    fn test_paused_games_reject_play() {
        let (mut session, alice, bob) = classic_session();
        session.submit(alice, 1, &[Dart::Triple(20)]).unwrap();
        let paused = session.prepare_status(GameStatus::Paused).unwrap();
        session.commit_game(paused);

        assert!(matches!(
            session.submit(bob, 1, &[]),
            Err(EngineError::GameNotActive { .. })
        ));
        assert!(session.revert_to(1).is_err());
        assert!(session.turn_context().is_none());

        let resumed = session.prepare_status(GameStatus::Active).unwrap();
        session.commit_game(resumed);
        assert!(session.turn_context().is_some());
    }

    #[test]
    fn test_checkout_completes_the_game() {
        let (mut session, alice, bob) = classic_session();
        // 301 = 4 x 60 + 61
        for round in 1..=4 {
            session.submit(alice, round, &[Dart::Triple(20)]).unwrap();
            session.submit(bob, round, &[Dart::Miss]).unwrap();
        }
        let round = 5;
        let turn = session
            .submit(alice, round, &[Dart::Single(1), Dart::Single(20), Dart::Double(20)])
            .unwrap();

        assert!(turn.checkout);
        assert_eq!(session.game().status, GameStatus::Completed);
        assert_eq!(session.game().winner, Some(alice));
        assert_eq!(session.check_winner().map(|p| p.id), Some(alice));
        assert!(session.turn_context().is_none());
        assert!(matches!(
            session.submit(bob, round, &[]),
            Err(EngineError::GameNotActive { .. })
        ));
    }

    #[test]
    fn test_turn_context_for_classic() {
        let (session, alice, bob) = classic_session();
        let context = session.turn_context().unwrap();
        assert_eq!(context.player.id, alice);
        assert_eq!(context.turn_number, 1);
        assert_eq!(context.opponents.len(), 1);
        assert_eq!(context.opponents[0].0.id, bob);
        assert!(context.checkout.is_empty());
    }

    #[test]
    fn test_restore_replays_the_log() {
        let (mut session, alice, bob) = classic_session();
        session.submit(alice, 1, &[Dart::Triple(20)]).unwrap();
        session.submit(bob, 1, &[Dart::Bull]).unwrap();

        let restored = GameSession::restore(
            session.game().clone(),
            session.players().to_vec(),
            session.history().turns().to_vec(),
        )
        .unwrap();
        assert_eq!(restored.state(), session.state());
        assert_eq!(restored.history(), session.history());
    }

    #[test]
    fn test_killer_phase_query() {
        let mut session = GameSession::new(
            Variant::Killer(KillerOptions::default()),
            Player::roster(&["Alice", "Bob"]),
        )
        .unwrap();
        assert_eq!(session.current_phase(), Some(KillerPhase::Claiming));
        let (alice, bob) = (session.players()[0].id, session.players()[1].id);
        session.submit(alice, 1, &[Dart::Triple(20)]).unwrap();
        session.submit(bob, 1, &[Dart::Single(19)]).unwrap();
        assert_eq!(session.current_phase(), Some(KillerPhase::Building));
        session.submit(alice, 2, &[Dart::Single(19)]).unwrap();
        assert_eq!(
            session.state().progress[1].as_killer().map(|p| p.lives),
            Some(0)
        );
        assert_eq!(session.game().winner, Some(alice));
    }
}

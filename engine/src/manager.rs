use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use database::{DatabaseError, GameStore};
use itertools::Itertools;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use types::{Dart, Game, GameStatus, Player, Turn, TurnContext, Variant};
use uuid::Uuid;

use crate::{
    killer::KillerPhase,
    records,
    rules::Preview,
    session::{GameSession, PendingTurn, RevertOutcome, Submission},
    EngineError, GameState, Result,
};

type SessionHandle = Arc<AsyncMutex<GameSession>>;

/// Owns the live games and writes every change through to a [`GameStore`].
///
/// Submissions, reverts and status changes hold the game's lock for the
/// whole resolve-persist-commit sequence and never wait for it. They fail
/// with [`EngineError::Busy`] whenever anyone else holds the lock, and that
/// includes reads such as [`GameManager::state`] or a preview in flight.
/// Reads wait for the lock instead.
///
/// A turn only reaches memory after the store has accepted it. A revert
/// reaches memory as soon as the stored log is truncated; if the progress
/// snapshots then fail to save, the error is returned and repeating the
/// revert rewrites them.
pub struct GameManager<S: GameStore> {
    store: S,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl<S: GameStore> GameManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn session(&self, game_id: Uuid) -> Result<SessionHandle> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))?;
        sessions
            .get(&game_id)
            .cloned()
            .ok_or(EngineError::UnknownGame(game_id))
    }

    fn insert(&self, session: GameSession) -> Result<()> {
        let game_id = session.game().id;
        self.sessions
            .lock()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))?
            .insert(game_id, Arc::new(AsyncMutex::new(session)));
        Ok(())
    }

    fn exclusive<'a>(
        &self,
        game_id: Uuid,
        handle: &'a SessionHandle,
    ) -> Result<AsyncMutexGuard<'a, GameSession>> {
        handle.try_lock().map_err(|_| {
            log::warn!("Rejecting concurrent change to game {game_id}");
            EngineError::Busy(game_id)
        })
    }

    pub async fn create_game(&self, variant: Variant, players: Vec<Player>) -> Result<Game> {
        let session = GameSession::new(variant, players)?;
        let game = session.game().clone();
        let roster = session
            .players()
            .iter()
            .map(|p| records::player_record(game.id, p))
            .collect_vec();

        self.store
            .create_game(&records::game_record(&game), &roster)
            .await?;
        self.store
            .save_progress(&records::progress_records(game.id, session.state())?)
            .await?;

        log::info!(
            "Created {} game {} for {}",
            game.variant,
            game.id,
            session.players().iter().join(", ")
        );
        self.insert(session)?;
        Ok(game)
    }

    /// Rebuilds a game from the store, replacing any copy in memory.
    pub async fn load_game(&self, game_id: Uuid) -> Result<Game> {
        let game = records::game_from_record(self.store.load_game(game_id).await?)?;
        let players = self
            .store
            .load_players(game_id)
            .await?
            .into_iter()
            .map(records::player_from_record)
            .collect::<Result<Vec<_>>>()?;
        let turns = self.load_turns(game_id).await?;

        let session = GameSession::restore(game, players, turns)?;
        self.check_snapshots(&session).await?;
        let game = session.game().clone();
        log::info!(
            "Loaded game {} with {} turns",
            game_id,
            session.history().len()
        );
        self.insert(session)?;
        Ok(game)
    }

    async fn load_turns(&self, game_id: Uuid) -> Result<Vec<Turn>> {
        self.store
            .load_turns(game_id)
            .await?
            .into_iter()
            .map(records::turn_from_record)
            .collect()
    }

    /// Snapshots are derived data; the log wins when they disagree.
    async fn check_snapshots(&self, session: &GameSession) -> Result<()> {
        let game_id = session.game().id;
        let stored = self.store.load_progress(game_id).await?;
        let state = session.state();
        let mut stale = Vec::new();
        for record in stored {
            let (player_id, progress) = records::progress_from_record(record)?;
            if state.progress_of(player_id) != Some(&progress) {
                stale.push(player_id);
            }
        }
        if !stale.is_empty() {
            log::warn!(
                "Stored progress for {} players in game {game_id} disagrees with the log, rewriting",
                stale.len()
            );
            self.store
                .save_progress(&records::progress_records(game_id, state)?)
                .await?;
        }
        Ok(())
    }

    pub async fn submit_turn(
        &self,
        game_id: Uuid,
        player_id: Uuid,
        turn_number: u32,
        darts: Vec<Dart>,
    ) -> Result<Turn> {
        let handle = self.session(game_id)?;
        let mut session = self.exclusive(game_id, &handle)?;

        let submission = session
            .prepare_submission(player_id, turn_number, &darts)
            .map_err(|e| {
                log::warn!("Rejected turn {turn_number} from {player_id}: {e}");
                e
            })?;
        let pending = match submission {
            Submission::Applied(pending) => pending,
            Submission::Duplicate(turn) => {
                log::warn!(
                    "Turn {turn_number} for {player_id} is already recorded, returning it"
                );
                return Ok(turn);
            }
        };

        let persisted = self.persist_turn(&pending).await;
        match persisted {
            Ok(()) => Ok(session.commit(pending)),
            Err(EngineError::Persistence(DatabaseError::DuplicateTurn { .. })) => {
                log::warn!(
                    "Store already holds turn {turn_number} for {player_id}, resyncing game {game_id}"
                );
                self.resync(&mut session).await?;
                session
                    .history()
                    .find(player_id, turn_number)
                    .map(|(_, turn)| turn.clone())
                    .ok_or_else(|| {
                        EngineError::CorruptHistory(format!(
                            "turn {turn_number} for {player_id} vanished during resync"
                        ))
                    })
            }
            Err(e) => {
                log::warn!("Failed to persist turn {turn_number} for {player_id}: {e}");
                Err(e)
            }
        }
    }

    async fn persist_turn(&self, pending: &PendingTurn) -> Result<()> {
        let game_id = pending.game.id;
        self.store
            .save_turn(&records::turn_record(&pending.turn, pending.turn_id)?)
            .await?;
        self.store
            .save_progress(&records::progress_records(game_id, &pending.state)?)
            .await?;
        if pending.resolution.winner.is_some() {
            self.store
                .update_game(&records::game_record(&pending.game))
                .await?;
        }
        Ok(())
    }

    /// Replays the stored log and brings snapshots and status back in line.
    async fn resync(&self, session: &mut GameSession) -> Result<()> {
        let game_id = session.game().id;
        let turns = self.load_turns(game_id).await?;
        let was_complete = session.game().status == GameStatus::Completed;
        session.resync(turns)?;
        self.store
            .save_progress(&records::progress_records(game_id, session.state())?)
            .await?;
        if !was_complete && session.game().status == GameStatus::Completed {
            self.store
                .update_game(&records::game_record(session.game()))
                .await?;
        }
        Ok(())
    }

    /// Scores a visit in progress. Waits for any submission to finish and
    /// never writes to the store.
    pub async fn preview_turn(
        &self,
        game_id: Uuid,
        player_id: Uuid,
        darts: Vec<Dart>,
    ) -> Result<Preview> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        session.preview(player_id, &darts)
    }

    pub async fn revert_to_turn(&self, game_id: Uuid, turn_id: usize) -> Result<RevertOutcome> {
        let handle = self.session(game_id)?;
        let mut session = self.exclusive(game_id, &handle)?;

        let pending = session.prepare_revert(turn_id)?;
        if !pending.discarded.is_empty() {
            self.store.truncate_turns(game_id, pending.keep as u32).await?;
        }
        // the stored log is now the truncated one, memory has to follow it
        let outcome = session.commit_revert(pending);

        // snapshots are rewritten even for a no-op so a retry can repair them
        let saved = self
            .store
            .save_progress(&records::progress_records(game_id, session.state())?)
            .await;
        if let Err(e) = saved {
            log::warn!("Game {game_id} reverted to turn {turn_id} but its progress was not saved: {e}");
            return Err(e.into());
        }
        Ok(outcome)
    }

    pub async fn pause_game(&self, game_id: Uuid) -> Result<Game> {
        self.change_status(game_id, GameStatus::Paused).await
    }

    pub async fn resume_game(&self, game_id: Uuid) -> Result<Game> {
        self.change_status(game_id, GameStatus::Active).await
    }

    async fn change_status(&self, game_id: Uuid, status: GameStatus) -> Result<Game> {
        let handle = self.session(game_id)?;
        let mut session = self.exclusive(game_id, &handle)?;
        let game = session.prepare_status(status)?;
        self.store.update_game(&records::game_record(&game)).await?;
        session.commit_game(game.clone());
        Ok(game)
    }

    pub async fn game(&self, game_id: Uuid) -> Result<Game> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        Ok(session.game().clone())
    }

    pub async fn state(&self, game_id: Uuid) -> Result<GameState> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        Ok(session.state().clone())
    }

    pub async fn turns(&self, game_id: Uuid) -> Result<Vec<Turn>> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        Ok(session.history().turns().to_vec())
    }

    pub async fn turn_context(&self, game_id: Uuid) -> Result<Option<TurnContext>> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        Ok(session.turn_context())
    }

    pub async fn current_phase(&self, game_id: Uuid) -> Result<Option<KillerPhase>> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        Ok(session.current_phase())
    }

    pub async fn check_winner(&self, game_id: Uuid) -> Result<Option<Player>> {
        let handle = self.session(game_id)?;
        let session = handle.lock().await;
        Ok(session.check_winner().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::InMemoryStore;
    use types::{ClassicProgress, Progress};

    async fn classic_game() -> (GameManager<InMemoryStore>, Uuid, Vec<Uuid>) {
        let manager = GameManager::new(InMemoryStore::new());
        let game = manager
            .create_game(
                Variant::Classic {
                    starting_score: 501,
                },
                Player::roster(&["Alice", "Bob"]),
            )
            .await
            .unwrap();
        let players = manager
            .state(game.id)
            .await
            .unwrap()
            .players
            .iter()
            .map(|p| p.id)
            .collect();
        (manager, game.id, players)
    }

    #[tokio::test]
    async fn test_submission_is_written_through() {
        let (manager, game_id, players) = classic_game().await;
        manager
            .submit_turn(game_id, players[0], 1, vec![Dart::Triple(20); 3])
            .await
            .unwrap();

        let stored = manager.store().load_turns(game_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].sequence, 1);
        let progress = manager.store().load_progress(game_id).await.unwrap();
        let alice = progress.iter().find(|p| p.player_id == players[0]).unwrap();
        assert_eq!(alice.state["remaining"], 321);
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let manager = GameManager::new(InMemoryStore::new());
        assert!(matches!(
            manager.submit_turn(Uuid::new_v4(), Uuid::new_v4(), 1, vec![]).await,
            Err(EngineError::UnknownGame(_))
        ));
    }

    #[tokio::test]
    async fn test_writes_are_rejected_while_anyone_holds_the_lock() {
        let (manager, game_id, players) = classic_game().await;
        let handle = manager.session(game_id).unwrap();
        // held the way a read or a preview holds it
        let held = handle.lock().await;

        assert!(tokio::time::timeout(
            std::time::Duration::from_millis(10),
            manager.state(game_id)
        )
        .await
        .is_err());
        assert!(matches!(
            manager.pause_game(game_id).await,
            Err(EngineError::Busy(_))
        ));

        assert!(matches!(
            manager
                .submit_turn(game_id, players[0], 1, vec![Dart::Single(1)])
                .await,
            Err(EngineError::Busy(id)) if id == game_id
        ));
        assert!(matches!(
            manager.revert_to_turn(game_id, 1).await,
            Err(EngineError::Busy(_))
        ));

        drop(held);
        manager
            .submit_turn(game_id, players[0], 1, vec![Dart::Single(1)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_preview_leaves_everything_alone() {
        let (manager, game_id, players) = classic_game().await;
        let preview = manager
            .preview_turn(game_id, players[0], vec![Dart::Triple(20)])
            .await
            .unwrap();
        assert_eq!(
            preview.progress,
            Progress::Classic(ClassicProgress { remaining: 441 })
        );
        assert!(manager.turns(game_id).await.unwrap().is_empty());
        assert!(manager.store().load_turns(game_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revert_truncates_the_store() {
        let (manager, game_id, players) = classic_game().await;
        manager
            .submit_turn(game_id, players[0], 1, vec![Dart::Triple(20)])
            .await
            .unwrap();
        manager
            .submit_turn(game_id, players[1], 1, vec![Dart::Triple(19)])
            .await
            .unwrap();

        let outcome = manager.revert_to_turn(game_id, 1).await.unwrap();
        assert_eq!(outcome.turns.len(), 1);
        assert_eq!(manager.store().load_turns(game_id).await.unwrap().len(), 1);

        let resubmitted = manager
            .submit_turn(game_id, players[1], 1, vec![Dart::Single(19)])
            .await
            .unwrap();
        assert!(resubmitted.edited);
    }

    #[tokio::test]
    async fn test_pause_and_resume_are_persisted() {
        let (manager, game_id, players) = classic_game().await;
        manager.pause_game(game_id).await.unwrap();
        assert_eq!(
            manager.store().load_game(game_id).await.unwrap().status,
            "paused"
        );
        assert!(matches!(
            manager.submit_turn(game_id, players[0], 1, vec![]).await,
            Err(EngineError::GameNotActive { .. })
        ));
        assert!(manager.pause_game(game_id).await.is_err());

        manager.resume_game(game_id).await.unwrap();
        manager
            .submit_turn(game_id, players[0], 1, vec![])
            .await
            .unwrap();
    }
}

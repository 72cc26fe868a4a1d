use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use uuid::Uuid;

use super::GameStore;
use crate::{DatabaseError, GameRecord, PlayerRecord, ProgressRecord, TurnRecord};

#[derive(Debug, Default)]
struct Tables {
    games: HashMap<Uuid, GameRecord>,
    players: HashMap<Uuid, Vec<PlayerRecord>>,
    turns: HashMap<Uuid, Vec<TurnRecord>>,
    progress: HashMap<Uuid, Vec<ProgressRecord>>,
}

/// Store kept entirely in memory, for tests and throwaway matches.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DatabaseError> {
        self.tables
            .lock()
            .map_err(|e| DatabaseError::Connection(format!("store lock poisoned: {e}")))
    }

    fn require_game(tables: &Tables, game_id: Uuid) -> Result<(), DatabaseError> {
        if tables.games.contains_key(&game_id) {
            Ok(())
        } else {
            Err(DatabaseError::GameNotFound(game_id))
        }
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn create_game(
        &self,
        game: &GameRecord,
        players: &[PlayerRecord],
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        if tables.games.contains_key(&game.id) {
            return Err(DatabaseError::Query(format!("game {} already exists", game.id)));
        }
        let mut roster = players.to_vec();
        roster.sort_by_key(|p| p.turn_order);
        tables.games.insert(game.id, game.clone());
        tables.players.insert(game.id, roster);
        tables.turns.insert(game.id, Vec::new());
        Ok(())
    }

    async fn load_game(&self, game_id: Uuid) -> Result<GameRecord, DatabaseError> {
        self.tables()?
            .games
            .get(&game_id)
            .cloned()
            .ok_or(DatabaseError::GameNotFound(game_id))
    }

    async fn update_game(&self, game: &GameRecord) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        let stored = tables
            .games
            .get_mut(&game.id)
            .ok_or(DatabaseError::GameNotFound(game.id))?;
        *stored = game.clone();
        Ok(())
    }

    async fn load_players(&self, game_id: Uuid) -> Result<Vec<PlayerRecord>, DatabaseError> {
        let tables = self.tables()?;
        Self::require_game(&tables, game_id)?;
        Ok(tables.players.get(&game_id).cloned().unwrap_or_default())
    }

    async fn load_turns(&self, game_id: Uuid) -> Result<Vec<TurnRecord>, DatabaseError> {
        let tables = self.tables()?;
        Self::require_game(&tables, game_id)?;
        Ok(tables.turns.get(&game_id).cloned().unwrap_or_default())
    }

    async fn save_turn(&self, turn: &TurnRecord) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        Self::require_game(&tables, turn.game_id)?;
        let log = tables.turns.entry(turn.game_id).or_default();
        if log
            .iter()
            .any(|t| t.player_id == turn.player_id && t.turn_number == turn.turn_number)
        {
            return Err(DatabaseError::DuplicateTurn {
                player_id: turn.player_id,
                turn_number: turn.turn_number,
            });
        }
        log.push(turn.clone());
        log.sort_by_key(|t| t.sequence);
        Ok(())
    }

    async fn truncate_turns(&self, game_id: Uuid, keep: u32) -> Result<u64, DatabaseError> {
        let mut tables = self.tables()?;
        Self::require_game(&tables, game_id)?;
        let log = tables.turns.entry(game_id).or_default();
        let before = log.len();
        log.retain(|t| t.sequence <= keep);
        Ok((before - log.len()) as u64)
    }

    async fn save_progress(&self, progress: &[ProgressRecord]) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        for record in progress {
            Self::require_game(&tables, record.game_id)?;
            let rows = tables.progress.entry(record.game_id).or_default();
            match rows.iter_mut().find(|r| r.player_id == record.player_id) {
                Some(existing) => *existing = record.clone(),
                None => rows.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn load_progress(&self, game_id: Uuid) -> Result<Vec<ProgressRecord>, DatabaseError> {
        let tables = self.tables()?;
        Self::require_game(&tables, game_id)?;
        Ok(tables.progress.get(&game_id).cloned().unwrap_or_default())
    }
}

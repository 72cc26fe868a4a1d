use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{DatabaseError, GameRecord, PlayerRecord, ProgressRecord, TurnRecord};

/// Durable home of games, rosters, turn logs and progress snapshots.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_game(
        &self,
        game: &GameRecord,
        players: &[PlayerRecord],
    ) -> Result<(), DatabaseError>;
    async fn load_game(&self, game_id: Uuid) -> Result<GameRecord, DatabaseError>;
    async fn update_game(&self, game: &GameRecord) -> Result<(), DatabaseError>;
    /// Players ordered by turn order.
    async fn load_players(&self, game_id: Uuid) -> Result<Vec<PlayerRecord>, DatabaseError>;
    /// Turns ordered by their position in the log.
    async fn load_turns(&self, game_id: Uuid) -> Result<Vec<TurnRecord>, DatabaseError>;
    /// Fails with [`DatabaseError::DuplicateTurn`] if the player already has
    /// a turn with the same turn number.
    async fn save_turn(&self, turn: &TurnRecord) -> Result<(), DatabaseError>;
    /// Drops every turn after the first `keep`, returning how many went.
    async fn truncate_turns(&self, game_id: Uuid, keep: u32) -> Result<u64, DatabaseError>;
    async fn save_progress(&self, progress: &[ProgressRecord]) -> Result<(), DatabaseError>;
    async fn load_progress(&self, game_id: Uuid) -> Result<Vec<ProgressRecord>, DatabaseError>;
}

#[async_trait]
impl<S: GameStore + ?Sized> GameStore for Arc<S> {
    async fn create_game(
        &self,
        game: &GameRecord,
        players: &[PlayerRecord],
    ) -> Result<(), DatabaseError> {
        (**self).create_game(game, players).await
    }

    async fn load_game(&self, game_id: Uuid) -> Result<GameRecord, DatabaseError> {
        (**self).load_game(game_id).await
    }

    async fn update_game(&self, game: &GameRecord) -> Result<(), DatabaseError> {
        (**self).update_game(game).await
    }

    async fn load_players(&self, game_id: Uuid) -> Result<Vec<PlayerRecord>, DatabaseError> {
        (**self).load_players(game_id).await
    }

    async fn load_turns(&self, game_id: Uuid) -> Result<Vec<TurnRecord>, DatabaseError> {
        (**self).load_turns(game_id).await
    }

    async fn save_turn(&self, turn: &TurnRecord) -> Result<(), DatabaseError> {
        (**self).save_turn(turn).await
    }

    async fn truncate_turns(&self, game_id: Uuid, keep: u32) -> Result<u64, DatabaseError> {
        (**self).truncate_turns(game_id, keep).await
    }

    async fn save_progress(&self, progress: &[ProgressRecord]) -> Result<(), DatabaseError> {
        (**self).save_progress(progress).await
    }

    async fn load_progress(&self, game_id: Uuid) -> Result<Vec<ProgressRecord>, DatabaseError> {
        (**self).load_progress(game_id).await
    }
}

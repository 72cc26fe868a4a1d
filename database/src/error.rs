use thiserror::Error;
use uuid::Uuid;

use crate::retry::Retryable;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Game not found: {0}")]
    GameNotFound(Uuid),

    #[error("Turn {turn_number} for player {player_id} is already recorded")]
    DuplicateTurn { player_id: Uuid, turn_number: u32 },

    #[error("Retry exhausted: {0}")]
    RetryExhausted(String),

    #[error("UUID parsing error: {0}")]
    UuidParsing(#[from] uuid::Error),
}

impl Retryable for DatabaseError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            DatabaseError::Connection(_) | DatabaseError::Query(_) | DatabaseError::Transaction(_)
        )
    }
}

use database::{DatabaseError, Retryable};
use thiserror::Error;
use types::{DartError, GameStatus, VariantError};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid dart: {0}")]
    InvalidDart(#[from] DartError),

    #[error("Invalid variant: {0}")]
    InvalidVariant(#[from] VariantError),

    #[error("A turn has at most {max} darts, got {got}")]
    TooManyDarts { got: usize, max: usize },

    #[error("Player {got} acted out of turn, waiting on {expected}")]
    OutOfTurn { expected: Uuid, got: Uuid },

    #[error("Expected turn number {expected}, got {got}")]
    TurnNumberMismatch { expected: u32, got: u32 },

    #[error("Number {number} is already claimed by player {owner}")]
    NumberAlreadyClaimed { number: u8, owner: Uuid },

    #[error("Unknown player: {0}")]
    UnknownPlayer(Uuid),

    #[error("Unknown game: {0}")]
    UnknownGame(Uuid),

    #[error("Game {game_id} is {status}")]
    GameNotActive { game_id: Uuid, status: GameStatus },

    #[error("No turn {turn_id} in a log of {len} turns")]
    UnknownTurn { turn_id: usize, len: usize },

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("Game {0} is busy with another submission")]
    Busy(Uuid),

    #[error("Turn history is inconsistent: {0}")]
    CorruptHistory(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl Retryable for EngineError {
    fn is_retryable(&self) -> bool {
        match self {
            EngineError::Busy(_) => true,
            EngineError::Persistence(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(e: serde_yaml::Error) -> Self {
        EngineError::Config(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

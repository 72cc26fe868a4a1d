pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod stores;

pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use models::{GameRecord, PlayerRecord, ProgressRecord, TurnRecord};
pub use retry::{retry_with_backoff, BoxFuture, Retryable};
pub use stores::{GameStore, InMemoryStore, SqliteStore};

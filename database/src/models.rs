use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: Uuid,
    pub variant: String,
    pub status: String,
    pub winner_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub game_id: Uuid,
    pub name: String,
    pub kind: String,
    pub turn_order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub game_id: Uuid,
    pub player_id: Uuid,
    /// 1-based position of the turn in the game's log.
    pub sequence: u32,
    pub turn_number: u32,
    pub darts: serde_json::Value,
    pub scores: serde_json::Value,
    pub outcome: serde_json::Value,
    pub bust: bool,
    pub checkout: bool,
    pub edited: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub state: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

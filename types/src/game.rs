use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Variant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Paused,
    Completed,
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Active => write!(f, "active"),
            GameStatus::Paused => write!(f, "paused"),
            GameStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GameStatus::Active),
            "paused" => Ok(GameStatus::Paused),
            "completed" => Ok(GameStatus::Completed),
            _ => Err(format!("Unknown game status: {s}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub variant: Variant,
    pub status: GameStatus,
    pub winner: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(variant: Variant) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            variant,
            status: GameStatus::Active,
            winner: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    pub fn set_status(&mut self, status: GameStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

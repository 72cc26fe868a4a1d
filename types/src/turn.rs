use std::fmt::Display;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Dart;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillerHit {
    pub target_id: Uuid,
    pub number: u8,
    pub lives_lost: u8,
    pub eliminated: bool,
}

/// The numeric state a turn produced for the player who threw it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum TurnOutcome {
    Classic {
        remaining_before: u32,
        remaining_after: u32,
    },
    AroundTheWorld {
        position_before: usize,
        position_after: usize,
        advanced: usize,
        hits: Vec<u8>,
    },
    Killer {
        lives_before: u8,
        lives_after: u8,
        claimed: Option<u8>,
        became_killer: bool,
        hits: Vec<KillerHit>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub game_id: Uuid,
    pub player_id: Uuid,
    /// Round number, starting at 1; every player acts once per round.
    pub turn_number: u32,
    pub darts: Vec<Dart>,
    /// Points per dart, or `[0]` for a bust.
    pub scores: Vec<u32>,
    pub outcome: TurnOutcome,
    pub bust: bool,
    pub checkout: bool,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn notation(&self) -> Vec<String> {
        self.darts.iter().map(|d| d.to_string()).collect()
    }
}

impl Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let darts = if self.darts.is_empty() {
            "-".to_string()
        } else {
            self.darts.iter().join(", ")
        };
        write!(f, "round {}: {darts}", self.turn_number)?;
        if self.bust {
            write!(f, " (bust)")?;
        }
        if self.checkout {
            write!(f, " (winner)")?;
        }
        Ok(())
    }
}

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{context::TurnContext, Dart};

pub trait Thrower: Debug + Send {
    fn throw_turn(&mut self, context: &TurnContext) -> Vec<Dart>;
}

/// Whether a player is the signed-in actor or someone only on the roster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Primary,
    Secondary,
}

impl std::str::FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(PlayerKind::Primary),
            "secondary" => Ok(PlayerKind::Secondary),
            _ => Err(format!("Unknown player kind: {s}")),
        }
    }
}

impl Display for PlayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerKind::Primary => write!(f, "primary"),
            PlayerKind::Secondary => write!(f, "secondary"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub kind: PlayerKind,
    pub name: String,
    pub turn_order: u32,
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Player {
    pub fn new(name: &str, kind: PlayerKind, turn_order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.to_string(),
            turn_order,
        }
    }

    pub fn new_with_id(id: Uuid, name: &str, kind: PlayerKind, turn_order: u32) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            turn_order,
        }
    }

    /// Builds a roster in the given seating order. The first name is the
    /// primary player, everyone else is secondary.
    pub fn roster(names: &[&str]) -> Vec<Player> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = if idx == 0 {
                    PlayerKind::Primary
                } else {
                    PlayerKind::Secondary
                };
                Player::new(name, kind, idx as u32 + 1)
            })
            .collect()
    }
}

use std::{collections::HashMap, path::Path};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use throwers::{AimedThrower, InputThrower, RandomThrower};
use types::{Player, PlayerKind, Thrower, Variant};
use uuid::Uuid;

use crate::{session::validate_roster, Result};

pub const DEFAULT_MAX_ROUNDS: u32 = 100;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ThrowerKind {
    #[default]
    Aimed,
    Random,
    Input,
}

impl ThrowerKind {
    pub fn build(self) -> Box<dyn Thrower> {
        match self {
            ThrowerKind::Aimed => Box::new(AimedThrower {}),
            ThrowerKind::Random => Box::new(RandomThrower::new()),
            ThrowerKind::Input => Box::new(InputThrower {}),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    /// Defaults to primary for the first seat and secondary for the rest.
    #[serde(default)]
    pub kind: Option<PlayerKind>,
    #[serde(default)]
    pub thrower: ThrowerKind,
}

/// A match as described in a yaml file or on the command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub variant: Variant,
    pub players: Vec<PlayerConfig>,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub database_url: Option<String>,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

impl MatchConfig {
    pub fn new(variant: Variant, names: &[String], thrower: ThrowerKind) -> Self {
        Self {
            variant,
            players: names
                .iter()
                .map(|name| PlayerConfig {
                    name: name.clone(),
                    kind: None,
                    thrower,
                })
                .collect(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            delay_ms: None,
            database_url: None,
        }
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: MatchConfig = serde_yaml::from_str(input)?;
        config.variant.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Seats the players in file order and pairs each with its thrower.
    pub fn seat_players(&self) -> Result<(Vec<Player>, HashMap<Uuid, Box<dyn Thrower>>)> {
        let mut roster = Vec::with_capacity(self.players.len());
        let mut throwers = HashMap::new();
        for (idx, config) in self.players.iter().enumerate() {
            let kind = config.kind.unwrap_or(if idx == 0 {
                PlayerKind::Primary
            } else {
                PlayerKind::Secondary
            });
            let player = Player::new(&config.name, kind, idx as u32 + 1);
            throwers.insert(player.id, config.thrower.build());
            roster.push(player);
        }
        validate_roster(&roster)?;
        Ok((roster, throwers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use types::KillerOptions;

    const YAML: &str = "
variant: killer-5
players:
  - name: Alice
    thrower: random
  - name: Bob
    kind: primary
delay_ms: 250
";

    #[test]
    fn test_yaml_with_defaults() {
        let config = MatchConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.variant, Variant::Killer(KillerOptions { max_lives: 5 }));
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.delay_ms, Some(250));
        assert_eq!(config.database_url, None);
        assert_eq!(config.players[0].thrower, ThrowerKind::Random);
        assert_eq!(config.players[1].thrower, ThrowerKind::Aimed);
    }

    #[test]
    fn test_seating_follows_file_order() {
        let config = MatchConfig::from_yaml_str(YAML).unwrap();
        let (roster, throwers) = config.seat_players().unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Alice");
        assert_eq!(roster[0].kind, PlayerKind::Primary);
        assert_eq!(roster[1].turn_order, 2);
        assert_eq!(roster[1].kind, PlayerKind::Primary);
        assert!(roster.iter().all(|p| throwers.contains_key(&p.id)));
    }

    #[test]
    fn test_bad_configs_are_rejected() {
        assert!(matches!(
            MatchConfig::from_yaml_str("variant: darts-9000\nplayers: []\n"),
            Err(EngineError::Config(_))
        ));

        let empty = MatchConfig::new(
            Variant::Classic {
                starting_score: 301,
            },
            &[],
            ThrowerKind::Aimed,
        );
        assert!(matches!(
            empty.seat_players(),
            Err(EngineError::InvalidRoster(_))
        ));
    }
}

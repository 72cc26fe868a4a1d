use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CLASSIC_STARTING_SCORES: [u32; 3] = [301, 501, 701];
pub const KILLER_THRESHOLD: u8 = 3;
pub const DEFAULT_MAX_LIVES: u8 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("Unknown variant tag: {0}")]
    UnknownTag(String),

    #[error("Classic games start at 301, 501 or 701, not {0}")]
    StartingScore(u32),

    #[error("Killer needs at least {KILLER_THRESHOLD} max lives, got {0}")]
    MaxLives(u8),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtwOptions {
    pub include_outer_bull: bool,
    pub include_bull: bool,
    pub multiplier_advances: bool,
}

impl AtwOptions {
    /// Targets in order: 1 through 20, then the optional bulls.
    pub fn sequence(&self) -> Vec<u8> {
        let mut sequence: Vec<u8> = (1..=20).collect();
        if self.include_outer_bull {
            sequence.push(25);
        }
        if self.include_bull {
            sequence.push(50);
        }
        sequence
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KillerOptions {
    pub max_lives: u8,
}

impl Default for KillerOptions {
    fn default() -> Self {
        Self {
            max_lives: DEFAULT_MAX_LIVES,
        }
    }
}

/// Rule variant of a game, carried as a tag such as `classic-501`,
/// `atw-bulls-multiplier` or `killer-5`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Variant {
    Classic { starting_score: u32 },
    AroundTheWorld(AtwOptions),
    Killer(KillerOptions),
}

impl Variant {
    pub fn classic(starting_score: u32) -> Result<Variant, VariantError> {
        if !CLASSIC_STARTING_SCORES.contains(&starting_score) {
            return Err(VariantError::StartingScore(starting_score));
        }
        Ok(Variant::Classic { starting_score })
    }

    pub fn killer(max_lives: u8) -> Result<Variant, VariantError> {
        if max_lives < KILLER_THRESHOLD {
            return Err(VariantError::MaxLives(max_lives));
        }
        Ok(Variant::Killer(KillerOptions { max_lives }))
    }

    /// Re-checks the invariants the constructors enforce, for values
    /// built directly from the enum.
    pub fn validate(&self) -> Result<(), VariantError> {
        match *self {
            Variant::Classic { starting_score } => Variant::classic(starting_score).map(|_| ()),
            Variant::AroundTheWorld(_) => Ok(()),
            Variant::Killer(options) => Variant::killer(options.max_lives).map(|_| ()),
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Classic { starting_score } => write!(f, "classic-{starting_score}"),
            Variant::AroundTheWorld(options) => {
                write!(f, "atw")?;
                if options.include_outer_bull && options.include_bull {
                    write!(f, "-bulls")?;
                } else if options.include_outer_bull {
                    write!(f, "-25")?;
                } else if options.include_bull {
                    write!(f, "-50")?;
                }
                if options.multiplier_advances {
                    write!(f, "-multiplier")?;
                }
                Ok(())
            }
            Variant::Killer(options) if options.max_lives == DEFAULT_MAX_LIVES => {
                write!(f, "killer")
            }
            Variant::Killer(options) => write!(f, "killer-{}", options.max_lives),
        }
    }
}

impl FromStr for Variant {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        let mut parts = tag.split('-');
        let unknown = || VariantError::UnknownTag(s.to_string());

        match parts.next() {
            Some("classic") => {
                let score = parts
                    .next()
                    .and_then(|p| p.parse::<u32>().ok())
                    .ok_or_else(unknown)?;
                if parts.next().is_some() {
                    return Err(unknown());
                }
                Variant::classic(score)
            }
            Some("atw") => {
                let mut options = AtwOptions::default();
                for part in parts {
                    match part {
                        "bulls" => {
                            options.include_outer_bull = true;
                            options.include_bull = true;
                        }
                        "25" => options.include_outer_bull = true,
                        "50" => options.include_bull = true,
                        "multiplier" => options.multiplier_advances = true,
                        _ => return Err(unknown()),
                    }
                }
                Ok(Variant::AroundTheWorld(options))
            }
            Some("killer") => match parts.next() {
                None => Ok(Variant::Killer(KillerOptions::default())),
                Some(lives) => {
                    let max_lives = lives.parse::<u8>().map_err(|_| unknown())?;
                    if parts.next().is_some() {
                        return Err(unknown());
                    }
                    Variant::killer(max_lives)
                }
            },
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for Variant {
    type Error = VariantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Variant> for String {
    fn from(variant: Variant) -> Self {
        variant.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for tag in [
            "classic-301",
            "classic-501",
            "classic-701",
            "atw",
            "atw-bulls",
            "atw-25",
            "atw-50-multiplier",
            "atw-bulls-multiplier",
            "killer",
            "killer-5",
        ] {
            let variant: Variant = tag.parse().unwrap();
            assert_eq!(variant.to_string(), tag);
        }
    }

    #[test]
    fn test_rejects_bad_tags() {
        assert_eq!(
            "classic-401".parse::<Variant>(),
            Err(VariantError::StartingScore(401))
        );
        assert_eq!("killer-2".parse::<Variant>(), Err(VariantError::MaxLives(2)));
        assert!("cricket".parse::<Variant>().is_err());
        assert!("atw-sideways".parse::<Variant>().is_err());
        assert!("classic".parse::<Variant>().is_err());
    }

    #[test]
    fn test_atw_sequence() {
        let plain = AtwOptions::default().sequence();
        assert_eq!(plain.len(), 20);
        assert_eq!(plain.first(), Some(&1));
        assert_eq!(plain.last(), Some(&20));

        let bulls = AtwOptions {
            include_outer_bull: true,
            include_bull: true,
            multiplier_advances: false,
        }
        .sequence();
        assert_eq!(&bulls[19..], &[20, 25, 50]);
    }
}

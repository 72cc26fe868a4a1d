use std::{collections::BTreeSet, fmt::Display};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicProgress {
    pub remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtwProgress {
    /// 1-based index into the target sequence; `len + 1` once finished.
    pub sequence_position: usize,
    pub current_target: Option<u8>,
    pub completed_targets: BTreeSet<u8>,
}

impl AtwProgress {
    pub fn start(sequence: &[u8]) -> Self {
        Self {
            sequence_position: 1,
            current_target: sequence.first().copied(),
            completed_targets: BTreeSet::new(),
        }
    }

    pub fn is_finished(&self, sequence: &[u8]) -> bool {
        self.sequence_position > sequence.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillerProgress {
    pub claimed_number: Option<u8>,
    pub lives: u8,
    pub is_killer: bool,
    pub is_eliminated: bool,
}

/// Per-player state for the variant being played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Progress {
    Classic(ClassicProgress),
    AroundTheWorld(AtwProgress),
    Killer(KillerProgress),
}

impl Progress {
    pub fn is_eliminated(&self) -> bool {
        matches!(
            self,
            Progress::Killer(KillerProgress {
                is_eliminated: true,
                ..
            })
        )
    }

    pub fn as_classic(&self) -> Option<&ClassicProgress> {
        match self {
            Progress::Classic(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn as_atw(&self) -> Option<&AtwProgress> {
        match self {
            Progress::AroundTheWorld(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn as_killer(&self) -> Option<&KillerProgress> {
        match self {
            Progress::Killer(progress) => Some(progress),
            _ => None,
        }
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Classic(p) => write!(f, "{} remaining", p.remaining),
            Progress::AroundTheWorld(p) => match p.current_target {
                Some(target) => write!(f, "position {} (target {target})", p.sequence_position),
                None => write!(f, "finished"),
            },
            Progress::Killer(p) => {
                let number = p
                    .claimed_number
                    .map_or_else(|| "unclaimed".to_string(), |n| format!("#{n}"));
                let status = if p.is_eliminated {
                    ", eliminated"
                } else if p.is_killer {
                    ", killer"
                } else {
                    ""
                };
                write!(f, "{number} {} lives{status}", p.lives)
            }
        }
    }
}

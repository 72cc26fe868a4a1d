use std::{fmt::Display, str::FromStr, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OUTER_BULL_POINTS: u32 = 25;
pub const BULL_POINTS: u32 = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DartError {
    #[error("Illegal dart: value {value} with multiplier {multiplier}")]
    Illegal { value: u8, multiplier: u8 },

    #[error("Unable to parse dart from {0:?}")]
    Unparsable(String),
}

/// A single dart result.
///
/// Only legal darts can be constructed: numbered segments 1-20 hit as a
/// single, double or triple, the outer bull (25), the bull (50), or a miss.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dart {
    Miss,
    Single(u8),
    Double(u8),
    Triple(u8),
    OuterBull,
    Bull,
}

impl Dart {
    /// Builds a dart from its board value and multiplier.
    ///
    /// `(0, 0)` is a miss, `(25, 1)` the outer bull and `(50, 1)` the bull.
    /// Anything else must be a segment 1-20 with a multiplier of 1, 2 or 3.
    pub fn new(value: u8, multiplier: u8) -> Result<Dart, DartError> {
        match (value, multiplier) {
            (0, 0) => Ok(Dart::Miss),
            (25, 1) => Ok(Dart::OuterBull),
            (50, 1) => Ok(Dart::Bull),
            (1..=20, 1) => Ok(Dart::Single(value)),
            (1..=20, 2) => Ok(Dart::Double(value)),
            (1..=20, 3) => Ok(Dart::Triple(value)),
            _ => Err(DartError::Illegal { value, multiplier }),
        }
    }

    pub fn single(number: u8) -> Result<Dart, DartError> {
        Dart::new(number, 1)
    }

    pub fn double(number: u8) -> Result<Dart, DartError> {
        Dart::new(number, 2)
    }

    pub fn triple(number: u8) -> Result<Dart, DartError> {
        Dart::new(number, 3)
    }

    /// Every legal dart, misses included.
    pub fn all() -> Vec<Dart> {
        let mut darts = Vec::with_capacity(63);
        darts.push(Dart::Miss);
        for multiplier in 1..=3u8 {
            for number in 1..=20u8 {
                let dart = match multiplier {
                    1 => Dart::Single(number),
                    2 => Dart::Double(number),
                    _ => Dart::Triple(number),
                };
                darts.push(dart);
            }
        }
        darts.push(Dart::OuterBull);
        darts.push(Dart::Bull);
        darts
    }

    /// The board value that was hit: the segment number, 25, 50, or 0 for a miss.
    pub fn value(&self) -> u8 {
        match *self {
            Dart::Miss => 0,
            Dart::Single(n) | Dart::Double(n) | Dart::Triple(n) => n,
            Dart::OuterBull => 25,
            Dart::Bull => 50,
        }
    }

    pub fn multiplier(&self) -> u8 {
        match self {
            Dart::Miss => 0,
            Dart::Single(_) | Dart::OuterBull | Dart::Bull => 1,
            Dart::Double(_) => 2,
            Dart::Triple(_) => 3,
        }
    }

    pub fn points(&self) -> u32 {
        match *self {
            Dart::Miss => 0,
            Dart::Single(n) => n as u32,
            Dart::Double(n) => 2 * n as u32,
            Dart::Triple(n) => 3 * n as u32,
            Dart::OuterBull => OUTER_BULL_POINTS,
            Dart::Bull => BULL_POINTS,
        }
    }

    /// The numbered segment (1-20) this dart landed in, if any.
    pub fn board_number(&self) -> Option<u8> {
        match *self {
            Dart::Single(n) | Dart::Double(n) | Dart::Triple(n) => Some(n),
            _ => None,
        }
    }

    /// Whether a leg may legally finish on this dart.
    pub fn is_finishing(&self) -> bool {
        matches!(self, Dart::Double(_) | Dart::Bull)
    }

    pub fn is_legal(&self) -> bool {
        Dart::new(self.value(), self.multiplier()).is_ok()
    }
}

pub fn total_points(darts: &[Dart]) -> u32 {
    darts.iter().map(Dart::points).sum()
}

impl Display for Dart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dart::Miss => write!(f, "Miss"),
            Dart::Single(n) => write!(f, "S{n}"),
            Dart::Double(n) => write!(f, "D{n}"),
            Dart::Triple(n) => write!(f, "T{n}"),
            Dart::OuterBull => write!(f, "25"),
            Dart::Bull => write!(f, "Bull"),
        }
    }
}

fn dart_regex() -> &'static Regex {
    static DART_RE: OnceLock<Regex> = OnceLock::new();
    DART_RE.get_or_init(|| {
        Regex::new(
            r"^(?i)(?:(?<kind>[sdt])(?<number>\d{1,2})|(?<outer>25)|(?<bull>bull|50)|(?<miss>miss))$",
        )
        .expect("Valid dart regex")
    })
}

impl FromStr for Dart {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let Some(caps) = dart_regex().captures(trimmed) else {
            return Err(DartError::Unparsable(s.to_string()));
        };

        if caps.name("miss").is_some() {
            return Ok(Dart::Miss);
        }
        if caps.name("outer").is_some() {
            return Ok(Dart::OuterBull);
        }
        if caps.name("bull").is_some() {
            return Ok(Dart::Bull);
        }

        let kind = caps
            .name("kind")
            .map(|m| m.as_str().to_ascii_uppercase())
            .ok_or_else(|| DartError::Unparsable(s.to_string()))?;
        let number: u8 = caps
            .name("number")
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| DartError::Unparsable(s.to_string()))?;
        let multiplier = match kind.as_str() {
            "S" => 1,
            "D" => 2,
            _ => 3,
        };
        // bulls only have their own notation, never S25 or S50
        if number > 20 {
            return Err(DartError::Illegal { value: number, multiplier });
        }
        Dart::new(number, multiplier)
    }
}

impl TryFrom<String> for Dart {
    type Error = DartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dart> for String {
    fn from(dart: Dart) -> Self {
        dart.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_matches_wire_format() {
        let darts = [
            Dart::Single(20),
            Dart::Double(5),
            Dart::Triple(19),
            Dart::OuterBull,
            Dart::Bull,
            Dart::Miss,
        ];
        let notation: Vec<String> = darts.iter().map(|d| d.to_string()).collect();
        assert_eq!(notation, ["S20", "D5", "T19", "25", "Bull", "Miss"]);
    }

    #[test]
    fn test_parse_accepts_any_case_and_fifty() {
        assert_eq!("t20".parse::<Dart>(), Ok(Dart::Triple(20)));
        assert_eq!(" D16 ".parse::<Dart>(), Ok(Dart::Double(16)));
        assert_eq!("BULL".parse::<Dart>(), Ok(Dart::Bull));
        assert_eq!("50".parse::<Dart>(), Ok(Dart::Bull));
        assert_eq!("25".parse::<Dart>(), Ok(Dart::OuterBull));
        assert_eq!("miss".parse::<Dart>(), Ok(Dart::Miss));
    }

    #[test]
    fn test_illegal_darts_are_rejected() {
        assert_eq!(
            "D21".parse::<Dart>(),
            Err(DartError::Illegal {
                value: 21,
                multiplier: 2
            })
        );
        assert!("S0".parse::<Dart>().is_err());
        assert_eq!(
            "S25".parse::<Dart>(),
            Err(DartError::Illegal {
                value: 25,
                multiplier: 1
            })
        );
        assert_eq!(
            "s50".parse::<Dart>(),
            Err(DartError::Illegal {
                value: 50,
                multiplier: 1
            })
        );
        assert!("D25".parse::<Dart>().is_err());
        assert!(serde_json::from_str::<Dart>("\"S25\"").is_err());
        assert!("Q5".parse::<Dart>().is_err());
        assert!("T".parse::<Dart>().is_err());
        assert!(Dart::new(25, 2).is_err());
        assert!(Dart::new(7, 0).is_err());
        assert!(Dart::new(0, 1).is_err());
        assert!(Dart::new(50, 2).is_err());
        assert!(Dart::new(20, 4).is_err());
    }

    #[test]
    fn test_notation_regex_is_shared() {
        assert!(std::ptr::eq(dart_regex(), dart_regex()));
        let parsed: Vec<Dart> = ["T20", "t20", " 25 ", "BULL"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(
            parsed,
            vec![Dart::Triple(20), Dart::Triple(20), Dart::OuterBull, Dart::Bull]
        );
    }

    #[test]
    fn test_points_and_multipliers() {
        assert_eq!(Dart::Triple(20).points(), 60);
        assert_eq!(Dart::Double(20).points(), 40);
        assert_eq!(Dart::OuterBull.points(), 25);
        assert_eq!(Dart::Bull.points(), 50);
        assert_eq!(Dart::Miss.points(), 0);
        assert_eq!(Dart::Bull.multiplier(), 1);
        assert_eq!(Dart::Bull.value(), 50);
        assert_eq!(Dart::Miss.multiplier(), 0);
        assert_eq!(total_points(&[Dart::Triple(20), Dart::Triple(20), Dart::Bull]), 170);
    }

    #[test]
    fn test_all_darts_are_legal_and_unique() {
        let all = Dart::all();
        assert_eq!(all.len(), 63);
        assert!(all.iter().all(Dart::is_legal));
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_serde_uses_notation() {
        let json = serde_json::to_string(&vec![Dart::Triple(20), Dart::Bull]).unwrap();
        assert_eq!(json, r#"["T20","Bull"]"#);
        let back: Vec<Dart> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Dart::Triple(20), Dart::Bull]);
        assert!(serde_json::from_str::<Dart>(r#""D21""#).is_err());
    }
}

//! # Level Table
//!
//! Static bidirectional mapping between numeric severity ranks and canonical
//! level names. Ordering is by rank only.

use crate::core::error::LogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity level, ordered `Debug < Info < Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "LevelSpec", into = "u8")]
pub enum Level {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl Level {
    /// Every level, lowest rank first.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Integer rank used for filtering and comparison.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub fn from_rank(rank: i64) -> Result<Self, LogError> {
        Self::ALL
            .into_iter()
            .find(|l| i64::from(l.rank()) == rank)
            .ok_or_else(|| LogError::UnknownLevel(rank.to_string()))
    }

    /// Name lookup, case-insensitive.
    pub fn from_name(name: &str) -> Result<Self, LogError> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LogError::UnknownLevel(format!("{:?}", name)))
    }

    /// Default accent color used when a logger has no color for this level.
    pub fn default_color(self) -> &'static str {
        match self {
            Level::Debug => "#9E9E9E",
            Level::Info => "#2EB67D",
            Level::Warning => "#ECB22E",
            Level::Error => "#E01E5A",
            Level::Critical => "#8B0000",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = LogError;

    /// Accepts a level name or a decimal rank.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(rank) => Self::from_rank(rank),
            Err(_) => Self::from_name(s),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level.rank()
    }
}

/// Unresolved level reference: a rank, a name, or an already-typed level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Rank(i64),
    Name(String),
    #[serde(skip)]
    Level(Level),
}

impl LevelSpec {
    /// Resolves to a [`Level`], failing with `UnknownLevel` when nothing matches.
    pub fn resolve(&self) -> Result<Level, LogError> {
        match self {
            LevelSpec::Level(l) => Ok(*l),
            LevelSpec::Rank(r) => Level::from_rank(*r),
            LevelSpec::Name(n) => n.parse(),
        }
    }
}

impl TryFrom<LevelSpec> for Level {
    type Error = LogError;

    fn try_from(spec: LevelSpec) -> Result<Self, LogError> {
        spec.resolve()
    }
}

impl From<Level> for LevelSpec {
    fn from(l: Level) -> Self {
        LevelSpec::Level(l)
    }
}

impl From<&str> for LevelSpec {
    fn from(s: &str) -> Self {
        LevelSpec::Name(s.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(s: String) -> Self {
        LevelSpec::Name(s)
    }
}

macro_rules! level_spec_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for LevelSpec {
                fn from(r: $t) -> Self {
                    LevelSpec::Rank(i64::from(r))
                }
            }
        )*
    };
}

level_spec_from_int!(u8, u16, u32, i8, i16, i32, i64);

/// `rankOf`: resolves a rank or a name to its rank.
pub fn rank_of(input: impl Into<LevelSpec>) -> Result<u8, LogError> {
    input.into().resolve().map(Level::rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_name_resolve_to_same_rank() {
        for level in Level::ALL {
            let r = level.rank();
            assert_eq!(rank_of(r).unwrap(), r);
            assert_eq!(rank_of(level.name()).unwrap(), r);
            assert_eq!(rank_of(level.name().to_lowercase()).unwrap(), r);
        }
    }

    #[test]
    fn unknown_inputs_fail() {
        assert!(matches!(rank_of(15), Err(LogError::UnknownLevel(_))));
        assert!(matches!(rank_of("verbose"), Err(LogError::UnknownLevel(_))));
        assert!(matches!(rank_of(""), Err(LogError::UnknownLevel(_))));
    }

    #[test]
    fn ordering_follows_rank() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn numeric_strings_parse_as_rank() {
        assert_eq!("40".parse::<Level>().unwrap(), Level::Error);
    }

    #[test]
    fn deserializes_from_name_or_rank() {
        let a: Level = serde_json::from_str("\"info\"").unwrap();
        let b: Level = serde_json::from_str("20").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Level>("25").is_err());
    }

    #[test]
    fn level_converts_from_spec() {
        assert_eq!(Level::try_from(LevelSpec::Rank(40)).unwrap(), Level::Error);
        assert_eq!(Level::try_from(LevelSpec::from("critical")).unwrap(), Level::Critical);
        assert!(matches!(
            Level::try_from(LevelSpec::Rank(25)),
            Err(LogError::UnknownLevel(_))
        ));
    }
}

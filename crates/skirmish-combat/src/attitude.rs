use std::fmt;

use serde::{Deserialize, Serialize};

/// How one participant regards another.
///
/// Decided by the game mode for an ordered `(observer, subject)` pair and
/// used to pick payouts and scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attitude {
    Friendly,
    Neutral,
    Hostile,
}

impl fmt::Display for Attitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Friendly => write!(f, "friendly"),
            Self::Neutral => write!(f, "neutral"),
            Self::Hostile => write!(f, "hostile"),
        }
    }
}

//! Arenas: named locations a game binds to when a session starts.

use std::collections::BTreeMap;

use serde::Deserialize;

use skirmish_types::{ConfigurationError, Location};

/// Record for one entry of the `arenas` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArenaRecord {
    #[serde(default)]
    pub locations: BTreeMap<String, Location>,
}

/// A map region. At most one session uses an arena at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    name: String,
    locations: BTreeMap<String, Location>,
}

impl Arena {
    pub fn new(name: impl Into<String>, locations: BTreeMap<String, Location>) -> Self {
        Self {
            name: name.into(),
            locations,
        }
    }

    pub fn from_record(name: &str, record: &ArenaRecord) -> Result<Self, ConfigurationError> {
        if record.locations.is_empty() {
            return Err(ConfigurationError::new(
                format!("arenas.{name}"),
                "locations must be specified",
            ));
        }
        Ok(Self::new(name, record.locations.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self, name: &str) -> Option<Location> {
        self.locations.get(name).copied()
    }

    /// Looks up a location referenced from the record at `path`.
    pub fn require(&self, path: &str, name: &str) -> Result<Location, ConfigurationError> {
        self.location(name).ok_or_else(|| {
            ConfigurationError::new(
                path,
                format!("location '{name}' is not defined in arena '{}'", self.name),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_lookup() {
        let record: ArenaRecord = serde_json::from_str(
            r#"{ "locations": { "center": { "x": 0.0, "y": 64.0, "z": 0.0 } } }"#,
        )
        .unwrap();
        let arena = Arena::from_record("canyon", &record).unwrap();
        assert_eq!(arena.location("center"), Some(Location::new(0.0, 64.0, 0.0)));
        let err = arena.require("games.duel", "north").unwrap_err();
        assert!(err.mentions("'north'"));
        assert!(err.mentions("'canyon'"));
    }

    #[test]
    fn test_arena_without_locations_is_rejected() {
        let err = Arena::from_record("void", &ArenaRecord::default()).unwrap_err();
        assert_eq!(err.path, "arenas.void");
    }
}

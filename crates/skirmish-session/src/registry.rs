//! Game mode registry: builds a mode from a game record's `type` tag.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use skirmish_types::ConfigurationError;

use crate::arena::Arena;
use crate::free_for_all::{FreeForAll, FreeForAllRecord};
use crate::mode::GameMode;
use crate::team_deathmatch::{TeamDeathmatch, TeamDeathmatchRecord};

/// Builds a mode from the record at `path`, bound to `arena`.
pub type ModeConstructor =
    fn(&str, &serde_json::Value, &Arena) -> Result<Box<dyn GameMode>, ConfigurationError>;

#[derive(Debug, Clone)]
pub struct ModeRegistry {
    constructors: BTreeMap<String, ModeConstructor>,
}

impl Default for ModeRegistry {
    /// A registry with the built-in modes.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FreeForAll::KIND, build_free_for_all);
        registry.register(TeamDeathmatch::KIND, build_team_deathmatch);
        registry
    }
}

impl ModeRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) the constructor for `kind`.
    pub fn register(&mut self, kind: &str, constructor: ModeConstructor) {
        self.constructors.insert(kind.to_string(), constructor);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(
        &self,
        kind: &str,
        path: &str,
        record: &serde_json::Value,
        arena: &Arena,
    ) -> Result<Box<dyn GameMode>, ConfigurationError> {
        let constructor = self.constructors.get(kind).ok_or_else(|| {
            ConfigurationError::new(path, format!("game type '{kind}' does not exist"))
        })?;
        constructor(path, record, arena)
    }
}

/// Deserializes a mode record, turning serde errors into a violation.
pub fn parse_record<T: DeserializeOwned>(
    path: &str,
    record: &serde_json::Value,
) -> Result<T, ConfigurationError> {
    T::deserialize(record).map_err(|e| ConfigurationError::new(path, e.to_string()))
}

fn build_free_for_all(
    path: &str,
    record: &serde_json::Value,
    arena: &Arena,
) -> Result<Box<dyn GameMode>, ConfigurationError> {
    let record: FreeForAllRecord = parse_record(path, record)?;
    Ok(Box::new(FreeForAll::from_record(path, &record, arena)?))
}

fn build_team_deathmatch(
    path: &str,
    record: &serde_json::Value,
    arena: &Arena,
) -> Result<Box<dyn GameMode>, ConfigurationError> {
    let record: TeamDeathmatchRecord = parse_record(path, record)?;
    Ok(Box::new(TeamDeathmatch::from_record(path, &record, arena)?))
}

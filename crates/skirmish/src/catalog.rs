//! Record catalog: the JSON record files a server is configured from.
//!
//! A record directory holds one file per category, each a JSON object
//! mapping record names to records:
//!
//! | file            | record            |
//! |-----------------|-------------------|
//! | `lobbies.json`  | [`LobbyRecord`]   |
//! | `games.json`    | [`GameRecord`]    |
//! | `bonuses.json`  | [`BonusRecord`]   |
//! | `arenas.json`   | [`ArenaRecord`]   |
//! | `engines.json`, `wings.json`, `items.json`, `sets.json` | [`ArmoryRecords`] |
//!
//! A missing file is an empty category. Everything is validated when the
//! catalog is built, and each lobby's games are validated again against
//! their arenas when the lobby is opened.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use skirmish_loadout::{Armory, ArmoryRecords};
use skirmish_session::{
    Arena, ArenaRecord, BonusRecord, GameRecord, Host, LobbyConfig, LobbyRecord, ModeRegistry,
    SessionManager,
};
use skirmish_tick::TickConfig;
use skirmish_types::Violations;

use crate::SkirmishError;

/// Every record category, as read from disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRecords {
    #[serde(default)]
    pub lobbies: BTreeMap<String, LobbyRecord>,
    #[serde(default)]
    pub games: BTreeMap<String, GameRecord>,
    #[serde(default)]
    pub bonuses: BTreeMap<String, BonusRecord>,
    #[serde(default)]
    pub arenas: BTreeMap<String, ArenaRecord>,
    #[serde(flatten)]
    pub armory: ArmoryRecords,
}

impl CatalogRecords {
    /// Reads every category file from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, SkirmishError> {
        let dir = dir.as_ref();
        Ok(Self {
            lobbies: read_category(dir, "lobbies")?,
            games: read_category(dir, "games")?,
            bonuses: read_category(dir, "bonuses")?,
            arenas: read_category(dir, "arenas")?,
            armory: ArmoryRecords {
                engines: read_category(dir, "engines")?,
                wings: read_category(dir, "wings")?,
                items: read_category(dir, "items")?,
                sets: read_category(dir, "sets")?,
            },
        })
    }
}

fn read_category<T: DeserializeOwned>(
    dir: &Path,
    category: &str,
) -> Result<BTreeMap<String, T>, SkirmishError> {
    let path = dir.join(format!("{category}.json"));
    if !path.exists() {
        tracing::debug!(path = %path.display(), "record file missing, category is empty");
        return Ok(BTreeMap::new());
    }
    let text = std::fs::read_to_string(&path).map_err(|source| SkirmishError::Io {
        path: path.clone(),
        source,
    })?;
    let records: BTreeMap<String, T> =
        serde_json::from_str(&text).map_err(|source| SkirmishError::Parse {
            path: path.clone(),
            source,
        })?;
    tracing::debug!(path = %path.display(), records = records.len(), "record file loaded");
    Ok(records)
}

/// Validated records, ready to open lobbies from.
#[derive(Debug, Clone)]
pub struct Catalog {
    lobbies: BTreeMap<String, LobbyRecord>,
    games: BTreeMap<String, GameRecord>,
    bonuses: BTreeMap<String, BonusRecord>,
    arenas: BTreeMap<String, Arena>,
    armory: Arc<Armory>,
    registry: ModeRegistry,
    tick_config: TickConfig,
}

impl Catalog {
    /// Loads and validates the record directory `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, SkirmishError> {
        let records = CatalogRecords::load(dir)?;
        Self::from_records(records)
    }

    /// Validates the armory and the arenas. All violations are reported
    /// together.
    pub fn from_records(records: CatalogRecords) -> Result<Self, SkirmishError> {
        let mut v = Violations::new("records");
        let armory = v.take(Armory::from_records(&records.armory));
        let arenas: BTreeMap<String, Arena> = records
            .arenas
            .iter()
            .filter_map(|(name, record)| {
                v.take(Arena::from_record(name, record))
                    .map(|arena| (name.clone(), arena))
            })
            .collect();
        v.finish()?;

        tracing::info!(
            lobbies = records.lobbies.len(),
            games = records.games.len(),
            arenas = arenas.len(),
            "catalog loaded"
        );
        Ok(Self {
            lobbies: records.lobbies,
            games: records.games,
            bonuses: records.bonuses,
            arenas,
            armory: Arc::new(armory.unwrap_or_default()),
            registry: ModeRegistry::default(),
            tick_config: TickConfig::default(),
        })
    }

    /// Replaces the mode registry, e.g. to add custom game modes.
    pub fn with_registry(mut self, registry: ModeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tick_config(mut self, tick_config: TickConfig) -> Self {
        self.tick_config = tick_config.validated();
        self
    }

    /// Names of all lobbies, sorted.
    pub fn lobby_names(&self) -> Vec<&str> {
        self.lobbies.keys().map(String::as_str).collect()
    }

    pub fn armory(&self) -> &Armory {
        &self.armory
    }

    pub fn arena(&self, name: &str) -> Option<&Arena> {
        self.arenas.get(name)
    }

    pub fn game(&self, name: &str) -> Option<&GameRecord> {
        self.games.get(name)
    }

    /// Opens the lobby `name`, validating every game it offers.
    pub fn open_lobby(
        &self,
        name: &str,
        host: Arc<dyn Host>,
    ) -> Result<SessionManager, SkirmishError> {
        let record = self
            .lobbies
            .get(name)
            .ok_or_else(|| SkirmishError::UnknownLobby(name.to_string()))?;
        let config = LobbyConfig {
            arenas: self.arenas.clone(),
            games: self.games.clone(),
            armory: Arc::clone(&self.armory),
            bonuses: self.bonuses.clone(),
            registry: self.registry.clone(),
            tick_config: self.tick_config.clone(),
        };
        Ok(SessionManager::new(name, record, config, host)?)
    }

    /// Opens every lobby. Fails on the first lobby that does not validate.
    pub fn open_all(
        &self,
        host: Arc<dyn Host>,
    ) -> Result<BTreeMap<String, SessionManager>, SkirmishError> {
        self.lobbies
            .keys()
            .map(|name| Ok((name.clone(), self.open_lobby(name, Arc::clone(&host))?)))
            .collect()
    }
}

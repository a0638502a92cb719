//! The armory: every engine, wings, item and item set known to the server,
//! resolved from their record files into shared, validated values.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use skirmish_types::{ConfigurationError, Violations};

use crate::equipment::{
    EngineRecord, EngineSpec, ItemRecord, ItemSpec, WingsRecord, WingsSpec,
};
use crate::item_set::{ItemAmount, ItemSet, SetMode};
use crate::loadout::{Loadout, RespawnAction};

/// Record for one entry of the `sets` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemSetRecord {
    #[serde(default)]
    pub mode: SetMode,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub wings: Option<String>,
    /// Item name → amount.
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
}

/// The raw contents of the four equipment record files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmoryRecords {
    #[serde(default)]
    pub engines: BTreeMap<String, EngineRecord>,
    #[serde(default)]
    pub wings: BTreeMap<String, WingsRecord>,
    #[serde(default)]
    pub items: BTreeMap<String, ItemRecord>,
    #[serde(default)]
    pub sets: BTreeMap<String, ItemSetRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Armory {
    engines: BTreeMap<String, EngineSpec>,
    wings: BTreeMap<String, WingsSpec>,
    items: BTreeMap<String, ItemSpec>,
    sets: BTreeMap<String, Arc<ItemSet>>,
}

impl Armory {
    /// Validates all records. Fails with every violation of every record.
    pub fn from_records(records: &ArmoryRecords) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new("armory");
        let mut armory = Armory::default();

        for (id, record) in &records.engines {
            let path = format!("engines.{id}");
            if let Some(spec) = v.take(EngineSpec::from_record(&path, id, record)) {
                armory.engines.insert(id.clone(), spec);
            }
        }
        for (id, record) in &records.wings {
            let path = format!("wings.{id}");
            if let Some(spec) = v.take(WingsSpec::from_record(&path, id, record)) {
                armory.wings.insert(id.clone(), spec);
            }
        }
        for (id, record) in &records.items {
            let path = format!("items.{id}");
            if let Some(spec) = v.take(ItemSpec::from_record(&path, id, record)) {
                armory.items.insert(id.clone(), spec);
            }
        }
        for (id, record) in &records.sets {
            if let Some(set) = v.take(armory.build_set(id, record)) {
                armory.sets.insert(id.clone(), Arc::new(set));
            }
        }

        v.finish()?;
        debug!(
            engines = armory.engines.len(),
            wings = armory.wings.len(),
            items = armory.items.len(),
            sets = armory.sets.len(),
            "armory loaded"
        );
        Ok(armory)
    }

    fn build_set(&self, id: &str, record: &ItemSetRecord) -> Result<ItemSet, ConfigurationError> {
        let mut v = Violations::new(format!("sets.{id}"));

        let engine = record.engine.as_deref().and_then(|name| {
            let found = self.engines.get(name).cloned();
            v.check(found.is_some(), format!("engine '{name}' is not defined"));
            found
        });
        let wings = record.wings.as_deref().and_then(|name| {
            let found = self.wings.get(name).cloned();
            v.check(found.is_some(), format!("wings '{name}' are not defined"));
            found
        });

        let mut items = Vec::with_capacity(record.items.len());
        let mut slots = BTreeSet::new();
        for (name, &amount) in &record.items {
            v.check(amount > 0, format!("amount of '{name}' must be at least 1"));
            let Some(item) = self.items.get(name) else {
                v.push(format!("item '{name}' is not defined"));
                continue;
            };
            if let Some(slot) = item.slot {
                v.check(
                    slots.insert(slot),
                    format!("item '{name}' shares slot {slot} with another item of the set"),
                );
            }
            items.push(ItemAmount {
                item: item.clone(),
                amount,
            });
        }

        let set = ItemSet {
            id: id.to_string(),
            mode: record.mode,
            name: record.name.clone(),
            engine,
            wings,
            items,
        };
        v.check(!set.is_empty() || !v.is_empty(), "item set changes nothing");
        v.finish()?;
        Ok(set)
    }

    pub fn engine(&self, name: &str) -> Option<&EngineSpec> {
        self.engines.get(name)
    }

    pub fn wings(&self, name: &str) -> Option<&WingsSpec> {
        self.wings.get(name)
    }

    pub fn item(&self, name: &str) -> Option<&ItemSpec> {
        self.items.get(name)
    }

    pub fn set(&self, name: &str) -> Option<Arc<ItemSet>> {
        self.sets.get(name).cloned()
    }

    /// Looks up an item set referenced from the record at `path`.
    pub fn resolve_set(&self, path: &str, name: &str) -> Result<Arc<ItemSet>, ConfigurationError> {
        self.set(name)
            .ok_or_else(|| ConfigurationError::new(path, format!("item set '{name}' is not defined")))
    }

    /// Builds a class template from item set names.
    pub fn loadout(
        &self,
        path: &str,
        set_names: &[String],
        respawn_action: RespawnAction,
    ) -> Result<Loadout, ConfigurationError> {
        let mut v = Violations::new(path);
        let sets: Vec<Arc<ItemSet>> = set_names
            .iter()
            .filter_map(|name| {
                let found = self.set(name);
                v.check(found.is_some(), format!("item set '{name}' is not defined"));
                found
            })
            .collect();
        v.finish()?;
        Loadout::from_sets(path, &sets, respawn_action)
    }
}

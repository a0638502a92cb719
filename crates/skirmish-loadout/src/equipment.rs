//! Equipment definitions: engines, wings, and stackable items.
//!
//! Specs are plain owned data. Cloning a spec is a deep copy, which is
//! what lets every loadout buffer own its equipment independently.

use serde::{Deserialize, Serialize};

use skirmish_types::{ConfigurationError, Violations};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Record for one entry of the `engines` file.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineRecord {
    pub max_fuel: f64,
    pub acceleration: f64,
    pub max_speed: f64,
}

/// Propulsion slot of a loadout. At most one per buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSpec {
    pub id: String,
    pub max_fuel: f64,
    pub acceleration: f64,
    pub max_speed: f64,
}

impl EngineSpec {
    pub fn from_record(
        path: &str,
        id: &str,
        record: &EngineRecord,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);
        v.check(record.max_fuel > 0.0, "max_fuel must be positive");
        v.check(record.acceleration > 0.0, "acceleration must be positive");
        v.check(record.max_speed > 0.0, "max_speed must be positive");
        v.finish()?;
        Ok(Self {
            id: id.to_string(),
            max_fuel: record.max_fuel,
            acceleration: record.acceleration,
            max_speed: record.max_speed,
        })
    }
}

// ---------------------------------------------------------------------------
// Wings
// ---------------------------------------------------------------------------

/// Record for one entry of the `wings` file.
#[derive(Debug, Clone, Deserialize)]
pub struct WingsRecord {
    pub health: f64,
    #[serde(default)]
    pub lift: f64,
    #[serde(default)]
    pub drag: f64,
}

/// Wings slot of a loadout. Wings carry the player's hit points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WingsSpec {
    pub id: String,
    pub health: f64,
    pub lift: f64,
    pub drag: f64,
}

impl WingsSpec {
    pub fn from_record(
        path: &str,
        id: &str,
        record: &WingsRecord,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);
        v.check(record.health > 0.0, "health must be positive");
        v.check(record.lift >= 0.0, "lift must not be negative");
        v.check(record.drag >= 0.0, "drag must not be negative");
        v.finish()?;
        Ok(Self {
            id: id.to_string(),
            health: record.health,
            lift: record.lift,
            drag: record.drag,
        })
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Record for one entry of the `items` file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    pub max_amount: u32,
    /// Items sharing a slot are mutually exclusive.
    #[serde(default)]
    pub slot: Option<u32>,
}

/// A kind of stackable item (ammunition, flares, fuel canisters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSpec {
    pub id: String,
    pub max_amount: u32,
    pub slot: Option<u32>,
}

impl ItemSpec {
    pub fn from_record(
        path: &str,
        id: &str,
        record: &ItemRecord,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);
        v.check(record.max_amount > 0, "max_amount must be at least 1");
        v.finish()?;
        Ok(Self {
            id: id.to_string(),
            max_amount: record.max_amount,
            slot: record.slot,
        })
    }

    /// Returns `true` if both items want the same slot but are different items.
    pub fn conflicts_with(&self, other: &ItemSpec) -> bool {
        self.id != other.id && self.slot.is_some() && self.slot == other.slot
    }
}

/// An item together with how many of it a buffer holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStack {
    pub spec: ItemSpec,
    pub amount: u32,
}

impl ItemStack {
    pub fn is_full(&self) -> bool {
        self.amount >= self.spec.max_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_record_reports_all_violations() {
        let record = EngineRecord {
            max_fuel: 0.0,
            acceleration: -1.0,
            max_speed: 3.0,
        };
        let err = EngineSpec::from_record("engines.jet", "jet", &record).unwrap_err();
        assert_eq!(err.path, "engines.jet");
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn test_wings_defaults_from_json() {
        let record: WingsRecord = serde_json::from_str(r#"{"health": 20.0}"#).unwrap();
        let wings = WingsSpec::from_record("wings.light", "light", &record).unwrap();
        assert_eq!(wings.health, 20.0);
        assert_eq!(wings.lift, 0.0);
    }

    #[test]
    fn test_item_requires_positive_max() {
        let record = ItemRecord {
            max_amount: 0,
            slot: None,
        };
        assert!(ItemSpec::from_record("items.flare", "flare", &record).is_err());
    }

    #[test]
    fn test_item_conflicts_only_on_shared_slot() {
        let rockets = ItemSpec {
            id: "rockets".into(),
            max_amount: 4,
            slot: Some(1),
        };
        let bombs = ItemSpec {
            id: "bombs".into(),
            max_amount: 2,
            slot: Some(1),
        };
        let flares = ItemSpec {
            id: "flares".into(),
            max_amount: 8,
            slot: None,
        };
        assert!(rockets.conflicts_with(&bombs));
        assert!(!rockets.conflicts_with(&rockets.clone()));
        assert!(!rockets.conflicts_with(&flares));
    }
}

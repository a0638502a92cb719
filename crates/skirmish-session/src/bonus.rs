//! Bonuses: pickups that apply an item set to whoever flies through them.

use std::sync::Arc;

use serde::Deserialize;

use skirmish_loadout::{Armory, ItemSet};
use skirmish_types::{ConfigurationError, Location, Violations};

use crate::arena::Arena;

/// Record for one entry of the `bonuses` file.
#[derive(Debug, Clone, Deserialize)]
pub struct BonusRecord {
    /// Arena location name.
    pub location: String,
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Ticks until the bonus reappears after being collected.
    #[serde(default)]
    pub respawn: u64,
    /// Item set applied to the collector's current loadout.
    pub set: String,
}

fn default_radius() -> f64 {
    1.5
}

#[derive(Debug, Clone)]
pub struct Bonus {
    id: String,
    location: Location,
    radius: f64,
    respawn_ticks: u64,
    set: Arc<ItemSet>,
    /// Ticks until available again; 0 means available.
    cooldown: u64,
}

impl Bonus {
    pub fn from_record(
        id: &str,
        record: &BonusRecord,
        arena: &Arena,
        armory: &Armory,
    ) -> Result<Self, ConfigurationError> {
        let path = format!("bonuses.{id}");
        let mut v = Violations::new(&path);
        let location = v.take(arena.require(&path, &record.location));
        let set = v.take(armory.resolve_set(&path, &record.set));
        v.check(record.radius > 0.0, "radius must be positive");
        v.finish()?;

        match (location, set) {
            (Some(location), Some(set)) => Ok(Self {
                id: id.to_string(),
                location,
                radius: record.radius,
                respawn_ticks: record.respawn,
                set,
                cooldown: 0,
            }),
            _ => Err(ConfigurationError::new(path, "bonus could not be resolved")),
        }
    }

    pub fn new(id: impl Into<String>, location: Location, set: Arc<ItemSet>) -> Self {
        Self {
            id: id.into(),
            location,
            radius: default_radius(),
            respawn_ticks: 0,
            set,
            cooldown: 0,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_respawn(mut self, ticks: u64) -> Self {
        self.respawn_ticks = ticks;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set(&self) -> &ItemSet {
        &self.set
    }

    pub fn is_available(&self) -> bool {
        self.cooldown == 0
    }

    pub fn in_reach(&self, position: &Location) -> bool {
        self.location.distance_squared(position) <= self.radius * self.radius
    }

    /// Marks the bonus as taken. It comes back after `respawn_ticks`.
    pub fn collect(&mut self) {
        self.cooldown = self.respawn_ticks.max(1);
    }

    pub fn tick(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Makes the bonus available again (game start).
    pub fn reset(&mut self) {
        self.cooldown = 0;
    }
}

#[cfg(test)]
mod tests {
    use skirmish_loadout::SetMode;

    use super::*;

    fn bonus() -> Bonus {
        Bonus::new(
            "health",
            Location::new(10.0, 70.0, 10.0),
            Arc::new(ItemSet::new("repair", SetMode::Fill)),
        )
        .with_radius(2.0)
        .with_respawn(3)
    }

    #[test]
    fn test_reach_is_a_sphere() {
        let bonus = bonus();
        assert!(bonus.in_reach(&Location::new(11.0, 71.0, 10.0)));
        assert!(!bonus.in_reach(&Location::new(12.5, 70.0, 10.0)));
    }

    #[test]
    fn test_collected_bonus_respawns_after_ticks() {
        let mut bonus = bonus();
        bonus.collect();
        assert!(!bonus.is_available());
        bonus.tick();
        bonus.tick();
        assert!(!bonus.is_available());
        bonus.tick();
        assert!(bonus.is_available());
    }

    #[test]
    fn test_reset_makes_available() {
        let mut bonus = bonus();
        bonus.collect();
        bonus.reset();
        assert!(bonus.is_available());
    }

    #[test]
    fn test_record_with_unknown_references() {
        let arena = Arena::new("canyon", Default::default());
        let armory = Armory::default();
        let record: BonusRecord =
            serde_json::from_str(r#"{ "location": "tower", "set": "repair", "radius": 0 }"#)
                .unwrap();
        let err = Bonus::from_record("health", &record, &arena, &armory).unwrap_err();
        assert_eq!(err.path, "bonuses.health");
        assert_eq!(err.violations.len(), 3);
    }
}

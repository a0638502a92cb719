//! Purchase buttons: physical interaction points that sell, buy back, or
//! unlock item sets.
//!
//! A button is immutable configuration. Whether a given player has
//! unlocked it is tracked by the session, never by the button.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;

use skirmish_types::{ButtonId, ConfigurationError, Location, Violations};

use crate::armory::Armory;
use crate::item_set::ItemSet;

/// What the player meant by clicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Buy,
    Sell,
}

/// Record for one entry of a game's `buttons` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonRecord {
    /// Names of arena locations that act as this button.
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Buttons that must be unlocked before this one can be.
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub buy_cost: i64,
    #[serde(default)]
    pub sell_cost: i64,
    #[serde(default)]
    pub unlock_cost: i64,
    /// Item set names.
    #[serde(default)]
    pub on_buy: Option<String>,
    #[serde(default)]
    pub on_sell: Option<String>,
    #[serde(default)]
    pub on_unlock: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Button {
    id: ButtonId,
    locations: Vec<Location>,
    requirements: BTreeSet<ButtonId>,
    permissions: BTreeSet<String>,
    buy_cost: i64,
    sell_cost: i64,
    unlock_cost: u64,
    on_buy: Option<Arc<ItemSet>>,
    on_sell: Option<Arc<ItemSet>>,
    on_unlock: Option<Arc<ItemSet>>,
}

impl Button {
    /// Validates a record, resolving its blocks through `locate` and its
    /// item sets through `armory`. Every problem is reported at once.
    pub fn from_record(
        path: &str,
        id: &str,
        record: &ButtonRecord,
        locate: impl Fn(&str) -> Option<Location>,
        armory: &Armory,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);

        v.check(!record.blocks.is_empty(), "blocks must be specified");
        let mut locations = Vec::with_capacity(record.blocks.len());
        for block in &record.blocks {
            match locate(block) {
                Some(location) => locations.push(location),
                None => v.push(format!("block '{block}' is not a location of the arena")),
            }
        }
        v.check(record.unlock_cost >= 0, "unlock_cost must not be negative");
        v.check(
            !record.required.iter().any(|r| r == id),
            "a button cannot require itself",
        );

        let mut resolve = |name: &Option<String>| {
            name.as_deref()
                .and_then(|name| v.take(armory.resolve_set(path, name)))
        };
        let on_buy = resolve(&record.on_buy);
        let on_sell = resolve(&record.on_sell);
        let on_unlock = resolve(&record.on_unlock);

        v.finish()?;

        Ok(Self {
            id: ButtonId::new(id),
            locations,
            requirements: record.required.iter().map(ButtonId::new).collect(),
            permissions: record.permissions.iter().cloned().collect(),
            buy_cost: record.buy_cost,
            sell_cost: record.sell_cost,
            unlock_cost: record.unlock_cost.unsigned_abs(),
            on_buy,
            on_sell,
            on_unlock,
        })
    }

    /// A button with no effects or costs, placed at `location`.
    pub fn new(id: impl Into<String>, location: Location) -> Self {
        Self {
            id: ButtonId::new(id),
            locations: vec![location],
            requirements: BTreeSet::new(),
            permissions: BTreeSet::new(),
            buy_cost: 0,
            sell_cost: 0,
            unlock_cost: 0,
            on_buy: None,
            on_sell: None,
            on_unlock: None,
        }
    }

    pub fn with_buy(mut self, cost: i64, set: Arc<ItemSet>) -> Self {
        self.buy_cost = cost;
        self.on_buy = Some(set);
        self
    }

    pub fn with_sell(mut self, cost: i64, set: Arc<ItemSet>) -> Self {
        self.sell_cost = cost;
        self.on_sell = Some(set);
        self
    }

    pub fn with_unlock(mut self, cost: u64, set: Option<Arc<ItemSet>>) -> Self {
        self.unlock_cost = cost;
        self.on_unlock = set;
        self
    }

    pub fn with_requirement(mut self, required: impl Into<String>) -> Self {
        self.requirements.insert(ButtonId::new(required));
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn id(&self) -> &ButtonId {
        &self.id
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Returns `true` if `location` is inside one of this button's blocks.
    pub fn occupies(&self, location: &Location) -> bool {
        self.locations.iter().any(|l| l.same_block(location))
    }

    pub fn requirements(&self) -> &BTreeSet<ButtonId> {
        &self.requirements
    }

    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn unlock_cost(&self) -> u64 {
        self.unlock_cost
    }

    /// Buttons that cost nothing to unlock are unlocked for everyone.
    pub fn is_free(&self) -> bool {
        self.unlock_cost == 0
    }

    pub fn on_unlock(&self) -> Option<&Arc<ItemSet>> {
        self.on_unlock.as_ref()
    }

    /// Cost and item set for `intent`. A negative cost is a refund.
    pub fn action(&self, intent: Intent) -> (i64, Option<&Arc<ItemSet>>) {
        match intent {
            Intent::Buy => (self.buy_cost, self.on_buy.as_ref()),
            Intent::Sell => (self.sell_cost, self.on_sell.as_ref()),
        }
    }
}

//! Item sets: named loadout deltas, and the outcome of applying one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::equipment::{EngineSpec, ItemSpec, WingsSpec};

/// How an item set changes the buffer it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMode {
    /// Install equipment and add items, capped at their maximum.
    #[default]
    Add,
    /// Top the listed items up to their maximum.
    Fill,
    /// Remove the listed equipment and items.
    Take,
    /// Overwrite equipment and whatever occupies the items' slots.
    Replace,
}

/// One entry of an item set: an item and how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAmount {
    pub item: ItemSpec,
    pub amount: u32,
}

/// A resolved, validated loadout delta.
///
/// Item sets are shared read-only (`Arc<ItemSet>`) between the buttons,
/// bonuses and class templates that reference them.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSet {
    pub id: String,
    pub mode: SetMode,
    /// Renames the buffer's class when present.
    pub name: Option<String>,
    pub engine: Option<EngineSpec>,
    pub wings: Option<WingsSpec>,
    pub items: Vec<ItemAmount>,
}

impl ItemSet {
    /// An empty set in the given mode. Mostly useful in tests.
    pub fn new(id: impl Into<String>, mode: SetMode) -> Self {
        Self {
            id: id.into(),
            mode,
            name: None,
            engine: None,
            wings: None,
            items: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_engine(mut self, engine: EngineSpec) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_wings(mut self, wings: WingsSpec) -> Self {
        self.wings = Some(wings);
        self
    }

    pub fn with_item(mut self, item: ItemSpec, amount: u32) -> Self {
        self.items.push(ItemAmount { item, amount });
        self
    }

    /// Returns `true` if applying this set could never change a buffer.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.engine.is_none() && self.wings.is_none() && self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AddResult
// ---------------------------------------------------------------------------

/// Outcome of applying an item set to a loadout buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddResult {
    Added,
    Filled,
    Replaced,
    Removed,
    AlreadyEmptied,
    AlreadyMaxed,
    /// A slot was occupied by a different item.
    Skipped,
}

impl AddResult {
    /// Only applied outcomes changed the buffer (and may be charged for).
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            Self::Added | Self::Filled | Self::Replaced | Self::Removed
        )
    }
}

impl fmt::Display for AddResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Filled => "filled",
            Self::Replaced => "replaced",
            Self::Removed => "removed",
            Self::AlreadyEmptied => "already emptied",
            Self::AlreadyMaxed => "already maxed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

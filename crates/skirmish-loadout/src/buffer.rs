//! A single loadout buffer and the item-set application rules.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::equipment::{EngineSpec, ItemSpec, ItemStack, WingsSpec};
use crate::item_set::{AddResult, ItemSet, SetMode};

/// One copy of a player's equipment: class name, engine, wings, items.
///
/// Buffers own everything they hold; `clone()` is a deep copy, so two
/// buffers never share an item map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadoutBuffer {
    name: Option<String>,
    engine: Option<EngineSpec>,
    wings: Option<WingsSpec>,
    items: BTreeMap<String, ItemStack>,
}

impl LoadoutBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn engine(&self) -> Option<&EngineSpec> {
        self.engine.as_ref()
    }

    pub fn wings(&self) -> Option<&WingsSpec> {
        self.wings.as_ref()
    }

    /// Health granted by the installed wings, if any.
    pub fn max_health(&self) -> Option<f64> {
        self.wings.as_ref().map(|w| w.health)
    }

    /// Held amount of the item with id `item`, 0 if absent.
    pub fn amount_of(&self, item: &str) -> u32 {
        self.items.get(item).map_or(0, |s| s.amount)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemStack> {
        self.items.values()
    }

    /// Applies `set` to this buffer.
    ///
    /// The buffer is only modified when the outcome is applied; any other
    /// outcome leaves it exactly as it was.
    pub fn apply(&mut self, set: &ItemSet) -> AddResult {
        let mut next = self.clone();
        let result = match set.mode {
            SetMode::Add => next.add(set),
            SetMode::Fill => next.fill(set),
            SetMode::Take => next.take(set),
            SetMode::Replace => next.replace(set),
        };
        if result.is_applied() {
            *self = next;
        }
        result
    }

    // -----------------------------------------------------------------------
    // Modes
    // -----------------------------------------------------------------------

    fn add(&mut self, set: &ItemSet) -> AddResult {
        if self.has_conflict(set) {
            return AddResult::Skipped;
        }
        let mut added = self.rename(set);
        let mut replaced = false;

        match self.install_engine(set.engine.as_ref()) {
            Some(AddResult::Added) => added = true,
            Some(AddResult::Replaced) => replaced = true,
            _ => {}
        }
        match self.install_wings(set.wings.as_ref()) {
            Some(AddResult::Added) => added = true,
            Some(AddResult::Replaced) => replaced = true,
            _ => {}
        }

        for entry in &set.items {
            let stack = self.stack_mut(&entry.item);
            if stack.is_full() {
                return AddResult::AlreadyMaxed;
            }
            stack.amount = stack
                .amount
                .saturating_add(entry.amount)
                .min(stack.spec.max_amount);
            added = true;
        }

        if replaced {
            AddResult::Replaced
        } else if added {
            AddResult::Added
        } else {
            AddResult::AlreadyMaxed
        }
    }

    fn fill(&mut self, set: &ItemSet) -> AddResult {
        if self.has_conflict(set) {
            return AddResult::Skipped;
        }
        let mut changed = self.rename(set);
        changed |= self.install_engine(set.engine.as_ref()).is_some();
        changed |= self.install_wings(set.wings.as_ref()).is_some();

        for entry in &set.items {
            let stack = self.stack_mut(&entry.item);
            if !stack.is_full() {
                stack.amount = stack.spec.max_amount;
                changed = true;
            }
        }

        if changed {
            AddResult::Filled
        } else {
            AddResult::AlreadyMaxed
        }
    }

    fn take(&mut self, set: &ItemSet) -> AddResult {
        if set.engine.is_none() && set.wings.is_none() && set.items.is_empty() {
            return AddResult::AlreadyEmptied;
        }

        if let Some(engine) = &set.engine {
            match &self.engine {
                Some(current) if current.id == engine.id => self.engine = None,
                _ => return AddResult::AlreadyEmptied,
            }
        }
        if let Some(wings) = &set.wings {
            match &self.wings {
                Some(current) if current.id == wings.id => self.wings = None,
                _ => return AddResult::AlreadyEmptied,
            }
        }

        for entry in &set.items {
            let Some(stack) = self.items.get_mut(&entry.item.id) else {
                return AddResult::AlreadyEmptied;
            };
            if stack.amount == 0 {
                return AddResult::AlreadyEmptied;
            }
            stack.amount = stack.amount.saturating_sub(entry.amount);
            if stack.amount == 0 {
                self.items.remove(&entry.item.id);
            }
        }

        self.rename(set);
        AddResult::Removed
    }

    fn replace(&mut self, set: &ItemSet) -> AddResult {
        let before = self.clone();
        self.rename(set);
        self.install_engine(set.engine.as_ref());
        self.install_wings(set.wings.as_ref());

        for entry in &set.items {
            self.items
                .retain(|_, stack| !stack.spec.conflicts_with(&entry.item));
            self.items.insert(
                entry.item.id.clone(),
                ItemStack {
                    spec: entry.item.clone(),
                    amount: entry.amount.min(entry.item.max_amount),
                },
            );
        }

        if *self == before {
            AddResult::AlreadyMaxed
        } else {
            AddResult::Replaced
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn has_conflict(&self, set: &ItemSet) -> bool {
        set.items.iter().any(|entry| {
            self.items
                .values()
                .any(|stack| stack.spec.conflicts_with(&entry.item))
        })
    }

    fn rename(&mut self, set: &ItemSet) -> bool {
        match &set.name {
            Some(name) if self.name.as_ref() != Some(name) => {
                self.name = Some(name.clone());
                true
            }
            _ => false,
        }
    }

    /// `None` when nothing changed.
    fn install_engine(&mut self, engine: Option<&EngineSpec>) -> Option<AddResult> {
        let engine = engine?;
        match &self.engine {
            Some(current) if current == engine => None,
            Some(_) => {
                self.engine = Some(engine.clone());
                Some(AddResult::Replaced)
            }
            None => {
                self.engine = Some(engine.clone());
                Some(AddResult::Added)
            }
        }
    }

    fn install_wings(&mut self, wings: Option<&WingsSpec>) -> Option<AddResult> {
        let wings = wings?;
        match &self.wings {
            Some(current) if current == wings => None,
            Some(_) => {
                self.wings = Some(wings.clone());
                Some(AddResult::Replaced)
            }
            None => {
                self.wings = Some(wings.clone());
                Some(AddResult::Added)
            }
        }
    }

    fn stack_mut(&mut self, item: &ItemSpec) -> &mut ItemStack {
        self.items
            .entry(item.id.clone())
            .or_insert_with(|| ItemStack {
                spec: item.clone(),
                amount: 0,
            })
    }
}

//! The three-buffer player loadout.
//!
//! A loadout keeps its class template (`default`) plus two working copies:
//!
//! - `stored` is what the player respawns with; unlocks write here.
//! - `current` is what the player is flying with right now; purchases
//!   write here.
//!
//! The template is immutable and shared between every replica made from
//! the same class. The working copies are owned and never aliased.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use skirmish_types::{ConfigurationError, Violations};

use crate::buffer::LoadoutBuffer;
use crate::item_set::{AddResult, ItemSet};

/// What happens to a player's loadout when they re-enter the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnAction {
    /// Start over from the class template.
    Reset,
    /// Restore the stored buffer, dropping unsaved purchases.
    #[default]
    Load,
    /// Keep what is being flown and make it the new stored buffer.
    Keep,
}

#[derive(Debug)]
pub struct Loadout {
    default: Arc<LoadoutBuffer>,
    stored: LoadoutBuffer,
    current: LoadoutBuffer,
    respawn_action: RespawnAction,
}

impl Loadout {
    /// Builds a class template by applying `sets` in order to an empty buffer.
    ///
    /// Fails when a set contradicts an earlier one or when no set gives the
    /// class a name.
    pub fn from_sets(
        path: &str,
        sets: &[Arc<ItemSet>],
        respawn_action: RespawnAction,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);
        let mut buffer = LoadoutBuffer::new();

        for set in sets {
            let result = buffer.apply(set);
            if matches!(result, AddResult::Skipped | AddResult::AlreadyEmptied) {
                v.push(format!(
                    "item set '{}' contradicts the sets before it ({result})",
                    set.id
                ));
            }
        }
        v.check(buffer.name().is_some(), "name is not specified");
        v.finish()?;

        Ok(Self::from_buffer(buffer, respawn_action))
    }

    /// Wraps an already-built buffer as a class template.
    pub fn from_buffer(default: LoadoutBuffer, respawn_action: RespawnAction) -> Self {
        Self {
            stored: default.clone(),
            current: default.clone(),
            default: Arc::new(default),
            respawn_action,
        }
    }

    /// A new loadout sharing this one's template, with fresh working copies.
    pub fn replicate(&self) -> Self {
        Self {
            default: Arc::clone(&self.default),
            stored: (*self.default).clone(),
            current: (*self.default).clone(),
            respawn_action: self.respawn_action,
        }
    }

    /// Returns `true` if both loadouts were replicated from the same template.
    pub fn shares_default_with(&self, other: &Loadout) -> bool {
        Arc::ptr_eq(&self.default, &other.default)
    }

    pub fn name(&self) -> Option<&str> {
        self.current.name().or_else(|| self.default.name())
    }

    pub fn respawn_action(&self) -> RespawnAction {
        self.respawn_action
    }

    /// The buffer the player is using right now.
    pub fn current(&self) -> &LoadoutBuffer {
        &self.current
    }

    /// An owned copy of the stored buffer.
    pub fn stored(&self) -> LoadoutBuffer {
        self.stored.clone()
    }

    /// An owned copy of the class template.
    pub fn default_buffer(&self) -> LoadoutBuffer {
        (*self.default).clone()
    }

    // -----------------------------------------------------------------------
    // Buffer transfers
    // -----------------------------------------------------------------------

    /// current → stored.
    pub fn save(&mut self) {
        self.stored = self.current.clone();
    }

    /// stored → current.
    pub fn load(&mut self) {
        self.current = self.stored.clone();
    }

    /// template → stored and current.
    pub fn reset(&mut self) {
        self.stored = (*self.default).clone();
        self.current = (*self.default).clone();
    }

    /// Applies the configured [`RespawnAction`].
    pub fn on_respawn(&mut self) {
        debug!(action = ?self.respawn_action, "loadout respawn");
        match self.respawn_action {
            RespawnAction::Reset => self.reset(),
            RespawnAction::Load => self.load(),
            RespawnAction::Keep => {
                self.save();
                self.load();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    pub fn apply_current(&mut self, set: &ItemSet) -> AddResult {
        self.current.apply(set)
    }

    pub fn apply_stored(&mut self, set: &ItemSet) -> AddResult {
        self.stored.apply(set)
    }
}

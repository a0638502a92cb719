//! Player equipment for Skirmish.
//!
//! - [`Loadout`]: a class template plus the player's stored and current
//!   buffers, with save/load/reset/replicate.
//! - [`ItemSet`]: a named loadout delta; applying one yields an
//!   [`AddResult`].
//! - [`Button`]: a purchase point that applies item sets for money.
//! - [`Armory`]: resolves the equipment record files into shared values.
//!
//! Nothing in this crate knows about money, sessions, or players. The
//! session layer decides who may apply what, and when.

mod armory;
mod buffer;
mod button;
mod equipment;
mod item_set;
mod loadout;

pub use armory::{Armory, ArmoryRecords, ItemSetRecord};
pub use buffer::LoadoutBuffer;
pub use button::{Button, ButtonRecord, Intent};
pub use equipment::{
    EngineRecord, EngineSpec, ItemRecord, ItemSpec, ItemStack, WingsRecord, WingsSpec,
};
pub use item_set::{AddResult, ItemAmount, ItemSet, SetMode};
pub use loadout::{Loadout, RespawnAction};

//! Combat rules for Skirmish.
//!
//! - [`attribution`]: every hit carries an immutable [`Attacker`]; a death
//!   is classified from the victim's last attacker into a [`KillEvent`].
//! - [`Attitude`]: how one participant regards another (decided by the
//!   game mode, consumed here).
//! - [`economy`]: the [`PayoutTable`] turning attributed events into money
//!   deltas, and the non-negative [`Wallet`].

pub mod attribution;
pub mod economy;

mod attitude;

pub use attitude::Attitude;
pub use attribution::{Attacker, DamageCause, Hull, KillEvent, KillKind, Target};
pub use economy::{MoneyConfig, Payout, PayoutEvent, PayoutTable, Wallet};

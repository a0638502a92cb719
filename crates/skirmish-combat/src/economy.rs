//! Money: the payout table and per-player wallets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Attitude;

/// The `money` section of a game record. Every field defaults to 0 and
/// payouts are disabled unless `enabled` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyConfig {
    pub enabled: bool,
    pub enemy_kill: i64,
    pub enemy_hit: i64,
    pub friendly_kill: i64,
    pub friendly_hit: i64,
    pub by_enemy_death: i64,
    pub by_enemy_hit: i64,
    pub by_friendly_death: i64,
    pub by_friendly_hit: i64,
    pub suicide: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayoutEvent {
    Kill,
    Hit,
    Death,
    BeingHit,
    Suicide,
}

/// Money deltas for the two sides of an attributed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Payout {
    pub attacker: i64,
    pub victim: i64,
}

/// Money deltas keyed by `(event, attitude)`. Missing cells are 0.
#[derive(Debug, Clone, Default)]
pub struct PayoutTable {
    enabled: bool,
    cells: HashMap<(PayoutEvent, Attitude), i64>,
    suicide: i64,
}

impl PayoutTable {
    /// An enabled table with every cell at 0.
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn from_config(config: &MoneyConfig) -> Self {
        use Attitude::{Friendly, Hostile};
        use PayoutEvent::{BeingHit, Death, Hit, Kill};

        let mut table = Self::new()
            .with(Kill, Hostile, config.enemy_kill)
            .with(Kill, Friendly, config.friendly_kill)
            .with(Hit, Hostile, config.enemy_hit)
            .with(Hit, Friendly, config.friendly_hit)
            .with(Death, Hostile, config.by_enemy_death)
            .with(Death, Friendly, config.by_friendly_death)
            .with(BeingHit, Hostile, config.by_enemy_hit)
            .with(BeingHit, Friendly, config.by_friendly_hit)
            .with_suicide(config.suicide);
        table.enabled = config.enabled;
        table
    }

    pub fn with(mut self, event: PayoutEvent, attitude: Attitude, delta: i64) -> Self {
        if event == PayoutEvent::Suicide {
            self.suicide = delta;
        } else {
            self.cells.insert((event, attitude), delta);
        }
        self
    }

    pub fn with_suicide(mut self, delta: i64) -> Self {
        self.suicide = delta;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The delta for one cell. Suicide is flat and ignores `attitude`.
    pub fn get(&self, event: PayoutEvent, attitude: Attitude) -> i64 {
        if !self.enabled {
            return 0;
        }
        match event {
            PayoutEvent::Suicide => self.suicide,
            _ => self.cells.get(&(event, attitude)).copied().unwrap_or(0),
        }
    }

    /// Kill to the attacker, death to the victim.
    pub fn kill(&self, attitude: Attitude) -> Payout {
        Payout {
            attacker: self.get(PayoutEvent::Kill, attitude),
            victim: self.get(PayoutEvent::Death, attitude),
        }
    }

    /// Hit to the shooter, being-hit to the target.
    pub fn hit(&self, attitude: Attitude) -> Payout {
        Payout {
            attacker: self.get(PayoutEvent::Hit, attitude),
            victim: self.get(PayoutEvent::BeingHit, attitude),
        }
    }

    pub fn suicide(&self) -> i64 {
        self.get(PayoutEvent::Suicide, Attitude::Neutral)
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A player's money. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wallet(u64);

impl Wallet {
    pub fn new(balance: u64) -> Self {
        Self(balance)
    }

    pub fn balance(&self) -> u64 {
        self.0
    }

    /// Adds a signed delta; debits beyond the balance stop at 0.
    pub fn pay(&mut self, delta: i64) {
        self.0 = self.0.saturating_add_signed(delta);
    }

    /// Refunds (negative costs) are always affordable.
    pub fn can_afford(&self, cost: i64) -> bool {
        cost <= 0 || cost.unsigned_abs() <= self.0
    }

    /// Deducts `cost` if affordable. Returns whether it was.
    pub fn charge(&mut self, cost: i64) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.pay(cost.saturating_neg());
        true
    }
}

//! Attribution: who damaged what, and how a death is classified.

use std::fmt;

use serde::{Deserialize, Serialize};

use skirmish_types::{MessageKey, PlayerId};

// ---------------------------------------------------------------------------
// Attacker
// ---------------------------------------------------------------------------

/// The `(shooter, weapon)` pair behind a damaging effect.
///
/// Created when the projectile or effect is spawned and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attacker {
    shooter: Option<PlayerId>,
    weapon: String,
    damage: f64,
}

impl Attacker {
    pub fn new(shooter: PlayerId, weapon: impl Into<String>, damage: f64) -> Self {
        Self {
            shooter: Some(shooter),
            weapon: weapon.into(),
            damage,
        }
    }

    /// Damage with no responsible player (turrets, hazards).
    pub fn environment(weapon: impl Into<String>, damage: f64) -> Self {
        Self {
            shooter: None,
            weapon: weapon.into(),
            damage,
        }
    }

    pub fn shooter(&self) -> Option<PlayerId> {
        self.shooter
    }

    pub fn weapon(&self) -> &str {
        &self.weapon
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }
}

// ---------------------------------------------------------------------------
// Damage causes
// ---------------------------------------------------------------------------

/// Cause of host-delivered damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    Contact,
    Custom,
    Fall,
    FlyIntoWall,
    HotFloor,
    Drowning,
    FallingBlock,
    Fire,
    FireTick,
    Lava,
    Lightning,
    Suffocation,
    EntityAttack,
    Projectile,
    Explosion,
    Magic,
    Poison,
    Starvation,
    Void,
}

impl DamageCause {
    /// Causes that may hurt players inside a session. Everything else is
    /// suppressed before it reaches attribution.
    pub const ALLOWED: [DamageCause; 12] = [
        Self::Contact,
        Self::Custom,
        Self::Fall,
        Self::FlyIntoWall,
        Self::HotFloor,
        Self::Drowning,
        Self::FallingBlock,
        Self::Fire,
        Self::FireTick,
        Self::Lava,
        Self::Lightning,
        Self::Suffocation,
    ];

    pub fn is_allowed(&self) -> bool {
        Self::ALLOWED.contains(self)
    }
}

// ---------------------------------------------------------------------------
// Kill classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillKind {
    /// No other player is to blame.
    Suicide,
    Killed,
    /// Fell to death after being shot.
    ShotDown,
}

impl KillKind {
    pub fn message_key(&self) -> MessageKey {
        match self {
            Self::Suicide => MessageKey::Suicide,
            Self::Killed => MessageKey::Killed,
            Self::ShotDown => MessageKey::ShotDown,
        }
    }
}

impl fmt::Display for KillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_key().as_str())
    }
}

/// The externally observable result of a death.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    pub victim: PlayerId,
    /// `None` for suicides.
    pub killer: Option<PlayerId>,
    pub weapon: Option<String>,
    pub kind: KillKind,
}

impl KillEvent {
    /// Classifies the death of `victim` from its last attacker.
    ///
    /// A missing attacker, or one that is the victim itself, is always a
    /// suicide regardless of the cause.
    pub fn resolve(victim: PlayerId, last_attacker: Option<&Attacker>, cause: DamageCause) -> Self {
        match last_attacker.and_then(|a| a.shooter().map(|s| (s, a))) {
            Some((killer, attacker)) if killer != victim => Self {
                victim,
                killer: Some(killer),
                weapon: Some(attacker.weapon().to_string()),
                kind: if cause == DamageCause::Fall {
                    KillKind::ShotDown
                } else {
                    KillKind::Killed
                },
            },
            _ => Self {
                victim,
                killer: None,
                weapon: None,
                kind: KillKind::Suicide,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Anything a projectile can hit.
///
/// The target owns its hit policy; attribution only asks whether the hit
/// counted and who hit it last.
pub trait Target: Send + fmt::Debug {
    /// Applies a hit. Returns `true` if it counted as a genuine hit.
    fn handle_hit(&mut self, attacker: &Attacker) -> bool;

    fn last_attacker(&self) -> Option<&Attacker>;

    fn is_destroyed(&self) -> bool;
}

/// Default hit policy: health points taken from the wings.
///
/// Hits are ignored while the hull is inactive (its owner is waiting) or
/// already destroyed.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull {
    health: f64,
    max_health: f64,
    last_attacker: Option<Attacker>,
    active: bool,
}

impl Hull {
    pub fn new(max_health: f64) -> Self {
        Self {
            health: max_health,
            max_health,
            last_attacker: None,
            active: false,
        }
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Back to full health with a clean attacker record.
    pub fn restore(&mut self, max_health: f64) {
        self.max_health = max_health;
        self.health = max_health;
        self.last_attacker = None;
    }

    /// Takes over the health the host reports after applying damage.
    ///
    /// The attacker record is kept, so a later lethal blow is still
    /// credited to whoever hit last.
    pub fn sync_health(&mut self, health: f64) {
        self.health = health.max(0.0);
    }
}

impl Target for Hull {
    fn handle_hit(&mut self, attacker: &Attacker) -> bool {
        if !self.active || self.is_destroyed() {
            return false;
        }
        self.health = (self.health - attacker.damage()).max(0.0);
        self.last_attacker = Some(attacker.clone());
        true
    }

    fn last_attacker(&self) -> Option<&Attacker> {
        self.last_attacker.as_ref()
    }

    fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    #[test]
    fn test_fall_without_attacker_is_suicide() {
        let event = KillEvent::resolve(ALICE, None, DamageCause::Fall);
        assert_eq!(event.kind, KillKind::Suicide);
        assert_eq!(event.killer, None);
    }

    #[test]
    fn test_self_inflicted_is_suicide() {
        let own = Attacker::new(ALICE, "rocket", 5.0);
        let event = KillEvent::resolve(ALICE, Some(&own), DamageCause::Fall);
        assert_eq!(event.kind, KillKind::Suicide);
    }

    #[test]
    fn test_environment_attacker_is_suicide() {
        let turret = Attacker::environment("turret", 5.0);
        let event = KillEvent::resolve(ALICE, Some(&turret), DamageCause::Custom);
        assert_eq!(event.kind, KillKind::Suicide);
    }

    #[test]
    fn test_fall_after_hit_is_shot_down() {
        let rocket = Attacker::new(BOB, "rocket", 5.0);
        let event = KillEvent::resolve(ALICE, Some(&rocket), DamageCause::Fall);
        assert_eq!(event.kind, KillKind::ShotDown);
        assert_eq!(event.killer, Some(BOB));
        assert_eq!(event.weapon.as_deref(), Some("rocket"));
        assert_eq!(event.kind.message_key(), MessageKey::ShotDown);
    }

    #[test]
    fn test_other_cause_is_killed() {
        let rocket = Attacker::new(BOB, "rocket", 5.0);
        let event = KillEvent::resolve(ALICE, Some(&rocket), DamageCause::Contact);
        assert_eq!(event.kind, KillKind::Killed);
    }

    #[test]
    fn test_allow_list() {
        assert!(DamageCause::FlyIntoWall.is_allowed());
        assert!(DamageCause::Suffocation.is_allowed());
        assert!(!DamageCause::EntityAttack.is_allowed());
        assert!(!DamageCause::Void.is_allowed());
    }

    #[test]
    fn test_inactive_hull_ignores_hits() {
        let mut hull = Hull::new(10.0);
        let rocket = Attacker::new(BOB, "rocket", 4.0);
        assert!(!hull.handle_hit(&rocket));
        assert!(hull.last_attacker().is_none());

        hull.set_active(true);
        assert!(hull.handle_hit(&rocket));
        assert_eq!(hull.health(), 6.0);
        assert_eq!(hull.last_attacker().and_then(Attacker::shooter), Some(BOB));
    }

    #[test]
    fn test_destroyed_hull_rejects_further_hits() {
        let mut hull = Hull::new(4.0);
        hull.set_active(true);
        let rocket = Attacker::new(BOB, "rocket", 10.0);
        assert!(hull.handle_hit(&rocket));
        assert!(hull.is_destroyed());
        assert_eq!(hull.health(), 0.0);
        assert!(!hull.handle_hit(&rocket));

        hull.restore(8.0);
        assert_eq!(hull.health(), 8.0);
        assert!(hull.last_attacker().is_none());
    }

    #[test]
    fn test_sync_health_keeps_attacker() {
        let mut hull = Hull::new(10.0);
        hull.set_active(true);
        hull.handle_hit(&Attacker::new(BOB, "gun", 1.0));
        hull.sync_health(-4.0);
        assert!(hull.is_destroyed());
        assert_eq!(hull.last_attacker().and_then(Attacker::shooter), Some(BOB));
    }

    #[test]
    fn test_sync_health_revives_destroyed_hull() {
        let mut hull = Hull::new(4.0);
        hull.set_active(true);
        let rocket = Attacker::new(BOB, "rocket", 10.0);
        assert!(hull.handle_hit(&rocket));
        assert!(!hull.handle_hit(&rocket));

        hull.sync_health(3.0);
        assert!(!hull.is_destroyed());
        assert!(hull.handle_hit(&rocket));
    }
}

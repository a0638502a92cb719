//! The host platform boundary.
//!
//! The engine never renders, moves, or persists anything itself. It asks
//! the [`Host`] injected at construction. All calls are fire-and-forget:
//! a failed delivery must never affect game logic.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use skirmish_combat::KillEvent;
use skirmish_loadout::LoadoutBuffer;
use skirmish_types::{Location, MessageKey, Notice, PlayerId, SessionId};

/// Services the engine needs from the game server it runs inside.
pub trait Host: Send + Sync {
    /// Best-effort delivery of a localized message.
    fn notify(&self, player: PlayerId, notice: Notice);

    /// Current position, `None` if the player is not online.
    fn position_of(&self, player: PlayerId) -> Option<Location>;

    fn teleport(&self, player: PlayerId, location: Location);

    /// Damages the player's body (not the hull).
    fn damage(&self, player: PlayerId, amount: f64);

    /// Kills the player's body outright.
    fn kill(&self, player: PlayerId);

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool;

    /// Publishes a resolved death to the rest of the server.
    fn kill_event(&self, session: SessionId, event: &KillEvent);

    /// The player's current loadout changed and should be re-equipped.
    fn loadout_changed(&self, player: PlayerId, loadout: &LoadoutBuffer);
}

// ---------------------------------------------------------------------------
// RecordingHost
// ---------------------------------------------------------------------------

/// A call made to a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Notify(PlayerId, Notice),
    Teleport(PlayerId, Location),
    Damage(PlayerId, f64),
    Kill(PlayerId),
    KillEvent(SessionId, KillEvent),
    LoadoutChanged(PlayerId),
}

/// An in-memory host that records every call.
///
/// Teleports move the recorded position, so a session driven against it
/// behaves like a world where nobody moves unless told to. Used by tests
/// and headless runs.
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    positions: Mutex<HashMap<PlayerId, Location>>,
    denied: Mutex<HashSet<(PlayerId, String)>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a player, as if they flew there.
    pub fn set_position(&self, player: PlayerId, location: Location) {
        lock(&self.positions).insert(player, location);
    }

    /// Makes `has_permission(player, permission)` return `false`.
    pub fn deny_permission(&self, player: PlayerId, permission: &str) {
        lock(&self.denied).insert((player, permission.to_string()));
    }

    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.calls).clone()
    }

    /// Returns and forgets every recorded call.
    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut *lock(&self.calls))
    }

    /// Every notice delivered to `player`, oldest first.
    pub fn notices_for(&self, player: PlayerId) -> Vec<Notice> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                HostCall::Notify(p, notice) if *p == player => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    /// Message keys delivered to `player`, oldest first.
    pub fn keys_for(&self, player: PlayerId) -> Vec<MessageKey> {
        self.notices_for(player).into_iter().map(|n| n.key).collect()
    }

    pub fn kill_events(&self) -> Vec<KillEvent> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                HostCall::KillEvent(_, event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Host for RecordingHost {
    fn notify(&self, player: PlayerId, notice: Notice) {
        lock(&self.calls).push(HostCall::Notify(player, notice));
    }

    fn position_of(&self, player: PlayerId) -> Option<Location> {
        lock(&self.positions).get(&player).copied()
    }

    fn teleport(&self, player: PlayerId, location: Location) {
        self.set_position(player, location);
        lock(&self.calls).push(HostCall::Teleport(player, location));
    }

    fn damage(&self, player: PlayerId, amount: f64) {
        lock(&self.calls).push(HostCall::Damage(player, amount));
    }

    fn kill(&self, player: PlayerId) {
        lock(&self.calls).push(HostCall::Kill(player));
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        !lock(&self.denied).contains(&(player, permission.to_string()))
    }

    fn kill_event(&self, session: SessionId, event: &KillEvent) {
        lock(&self.calls).push(HostCall::KillEvent(session, event.clone()));
    }

    fn loadout_changed(&self, player: PlayerId, _loadout: &LoadoutBuffer) {
        lock(&self.calls).push(HostCall::LoadoutChanged(player));
    }
}

/// A poisoned lock only means a test panicked mid-call; the data is fine.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

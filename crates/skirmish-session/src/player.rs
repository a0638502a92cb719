//! Per-player session state.

use skirmish_combat::{Hull, Wallet};
use skirmish_loadout::Loadout;
use skirmish_types::PlayerId;

/// Everything a session owns about one member.
#[derive(Debug)]
pub struct PlayerState {
    id: PlayerId,
    pub loadout: Loadout,
    pub wallet: Wallet,
    pub hull: Hull,
    playing: bool,
}

impl PlayerState {
    /// A fresh member flying `loadout` (a replica of the class template).
    pub fn new(id: PlayerId, loadout: Loadout) -> Self {
        let hull = Hull::new(loadout.current().max_health().unwrap_or(0.0));
        Self {
            id,
            loadout,
            wallet: Wallet::default(),
            hull,
            playing: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// `false` while the player waits (or is about to enter the arena).
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Hits only count against a playing hull.
    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.hull.set_active(playing);
    }

    /// Back to full health as defined by the current wings.
    pub fn restore_hull(&mut self) {
        let max_health = self.loadout.current().max_health().unwrap_or(0.0);
        self.hull.restore(max_health);
    }
}

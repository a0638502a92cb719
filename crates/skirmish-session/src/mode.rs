//! The `GameMode` trait: the rules that differ between game types.
//!
//! A session holds exactly one mode and consults it for attitudes,
//! scoring, spawn points, and the end-of-game results. Everything else
//! (waiting room, purchases, attribution, payouts) is shared.

use std::fmt;

use skirmish_combat::Attitude;
use skirmish_types::{Location, Notice, PlayerId};

/// What a mode needs to know about the observing player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub player: PlayerId,
    /// `false` while the player waits in the waiting room.
    pub playing: bool,
}

/// What the session should do after a kill was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOutcome {
    Continue,
    /// Someone reached the winning score.
    GameOver,
}

pub trait GameMode: Send + fmt::Debug {
    /// The registry tag this mode was built from.
    fn kind(&self) -> &'static str;

    /// How `observer` regards `subject`.
    fn attitude(&self, observer: Standing, subject: PlayerId) -> Attitude;

    /// Scores a death. `killer` is `None` for suicides; `attitude` is the
    /// killer's attitude towards the victim (`Neutral` for suicides).
    fn on_kill(
        &mut self,
        victim: PlayerId,
        killer: Option<PlayerId>,
        attitude: Attitude,
    ) -> ModeOutcome;

    /// Picks the spawn point for a player entering the arena.
    /// `None` means the arena center.
    fn on_respawn(&mut self, player: PlayerId) -> Option<Location>;

    /// Forgets a player who left the session.
    fn on_leave(&mut self, player: PlayerId);

    /// Resets scores when the session stops.
    fn on_stop(&mut self);

    /// Per-player notices announcing the winners.
    fn results(&self, players: &[PlayerId]) -> Vec<(PlayerId, Notice)>;

    /// In round-based games: is the round over, given who is still flying?
    fn round_over(&self, alive: &[PlayerId]) -> bool {
        alive.len() <= 1
    }
}

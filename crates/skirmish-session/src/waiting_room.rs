//! The waiting room: a holding queue for players who are not flying.
//!
//! Players land here when they join, when they die, and when the game
//! ends. The room decides why they wait ([`WaitReason`]) and counts down
//! until they may (re)enter the arena. It performs no effects itself:
//! the session reads [`WaitEvent`]s from [`WaitingRoom::tick`] and acts.

use std::fmt;

use skirmish_tick::TICKS_PER_SECOND;
use skirmish_types::{Location, PlayerId};

/// Countdown values (in seconds) announced to waiting players.
pub const CHECKPOINT_SECONDS: [u64; 15] = [
    1, 2, 3, 4, 5, 10, 15, 30, 60, 90, 120, 180, 240, 300, 600,
];

/// Countdown value meaning "idle".
const IDLE: i64 = -1;

/// Why a player is held in the waiting room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// Not waiting: the player enters the arena right away.
    NoWait,
    /// The session has not reached `min_players` yet.
    MorePlayers,
    /// Enough players; the first start is delayed.
    StartDelay,
    /// Waiting to respawn after a death.
    RespawnDelay,
    /// A round is in progress; everyone re-enters when it ends.
    Round,
    /// The game is over and the session is about to tear down.
    GameEnds,
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoWait => "NoWait",
            Self::MorePlayers => "MorePlayers",
            Self::StartDelay => "StartDelay",
            Self::RespawnDelay => "RespawnDelay",
            Self::Round => "Round",
            Self::GameEnds => "GameEnds",
        };
        f.write_str(s)
    }
}

/// What the owning session looks like when the room makes a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoomContext {
    pub running: bool,
    pub rounds: bool,
    pub round_finished: bool,
}

impl RoomContext {
    /// A round is being fought; nobody may respawn until it ends.
    fn round_in_progress(&self) -> bool {
        self.running && self.rounds && !self.round_finished
    }
}

/// Result of one waiting-room tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEvent {
    Nothing,
    /// The countdown passed an announced value.
    Checkpoint { ticks_left: u64 },
    /// The countdown reached zero: start the waiting players.
    Start,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitingRoomConfig {
    /// At least 1.
    pub min_players: usize,
    /// Ticks between reaching `min_players` and the first start.
    pub start_delay: u64,
    /// Ticks a dead player waits before respawning.
    pub respawn_delay: u64,
    /// Freeze admissions once the game started.
    pub locking: bool,
    pub location: Location,
}

#[derive(Debug)]
pub struct WaitingRoom {
    config: WaitingRoomConfig,
    waiting: Vec<PlayerId>,
    reason: WaitReason,
    countdown: i64,
    locked: bool,
}

impl WaitingRoom {
    pub fn new(config: WaitingRoomConfig) -> Self {
        Self {
            config,
            waiting: Vec::new(),
            reason: WaitReason::NoWait,
            countdown: IDLE,
            locked: false,
        }
    }

    pub fn config(&self) -> &WaitingRoomConfig {
        &self.config
    }

    pub fn location(&self) -> Location {
        self.config.location
    }

    pub fn reason(&self) -> WaitReason {
        self.reason
    }

    /// Ticks left until the waiting players start, if counting down.
    pub fn countdown(&self) -> Option<u64> {
        u64::try_from(self.countdown).ok()
    }

    pub fn waiting(&self) -> &[PlayerId] {
        &self.waiting
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.waiting.contains(&player)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Called when the game starts.
    pub fn lock_if_locking(&mut self) {
        if self.config.locking {
            self.locked = true;
        }
    }

    /// Queues a player and decides why they wait.
    ///
    /// `NoWait` means the caller must call [`start_players`](Self::start_players)
    /// right away; every other reason means the player is held here.
    pub fn add_player(&mut self, player: PlayerId, ctx: RoomContext) -> WaitReason {
        if !self.waiting.contains(&player) {
            self.waiting.push(player);
        }
        if self.reason == WaitReason::GameEnds {
            return WaitReason::GameEnds;
        }

        self.reason = if !ctx.running {
            if self.waiting.len() < self.config.min_players {
                WaitReason::MorePlayers
            } else if self.config.start_delay == 0 {
                WaitReason::NoWait
            } else {
                self.seed(self.config.start_delay);
                WaitReason::StartDelay
            }
        } else if ctx.round_in_progress() {
            self.countdown = ticks(self.config.respawn_delay);
            WaitReason::Round
        } else if self.config.respawn_delay == 0 {
            WaitReason::NoWait
        } else {
            self.seed(self.config.respawn_delay);
            WaitReason::RespawnDelay
        };
        self.reason
    }

    /// Starts a countdown unless one is already running.
    fn seed(&mut self, delay: u64) {
        if self.countdown <= 0 {
            self.countdown = ticks(delay);
        }
    }

    /// Forgets a player without moving them anywhere.
    pub fn remove_player(&mut self, player: PlayerId) {
        self.waiting.retain(|p| *p != player);
        if self.waiting.is_empty() && self.reason != WaitReason::GameEnds {
            self.countdown = IDLE;
        }
    }

    /// Drains the queue. The caller starts the game or respawns them.
    pub fn start_players(&mut self) -> Vec<PlayerId> {
        self.countdown = IDLE;
        std::mem::take(&mut self.waiting)
    }

    /// Parks the room for the end of the game: no more countdowns.
    pub fn set_game_ends(&mut self) {
        self.reason = WaitReason::GameEnds;
        self.countdown = IDLE;
    }

    /// Advances the countdown by one tick.
    ///
    /// A countdown seeded with N fires on the N-th eligible tick. Nothing
    /// counts while the game is over or a round is being fought.
    pub fn tick(&mut self, ctx: RoomContext) -> WaitEvent {
        if self.reason == WaitReason::GameEnds || ctx.round_in_progress() || self.countdown < 0 {
            return WaitEvent::Nothing;
        }
        // Announced before it moves, so the starting value is heard too.
        let ticks_left = self.countdown.unsigned_abs();
        if self.countdown > 0 {
            self.countdown -= 1;
        }
        if self.countdown == 0 {
            self.countdown = IDLE;
            return WaitEvent::Start;
        }

        let announced = matches!(
            self.reason,
            WaitReason::RespawnDelay | WaitReason::StartDelay | WaitReason::Round
        );
        if announced && is_checkpoint(ticks_left) {
            WaitEvent::Checkpoint { ticks_left }
        } else {
            WaitEvent::Nothing
        }
    }
}

fn ticks(delay: u64) -> i64 {
    i64::try_from(delay).unwrap_or(i64::MAX)
}

fn is_checkpoint(ticks_left: u64) -> bool {
    let per_second = u64::from(TICKS_PER_SECOND);
    ticks_left % per_second == 0 && CHECKPOINT_SECONDS.contains(&(ticks_left / per_second))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);

    const IDLE_GAME: RoomContext = RoomContext {
        running: false,
        rounds: false,
        round_finished: false,
    };
    const RUNNING: RoomContext = RoomContext {
        running: true,
        rounds: false,
        round_finished: false,
    };

    fn room(min_players: usize, start_delay: u64, respawn_delay: u64) -> WaitingRoom {
        WaitingRoom::new(WaitingRoomConfig {
            min_players,
            start_delay,
            respawn_delay,
            locking: false,
            location: Location::default(),
        })
    }

    #[test]
    fn test_second_player_starts_without_delay() {
        let mut room = room(2, 0, 0);
        assert_eq!(room.add_player(A, IDLE_GAME), WaitReason::MorePlayers);
        assert_eq!(room.add_player(B, IDLE_GAME), WaitReason::NoWait);
        assert_eq!(room.start_players(), vec![A, B]);
        assert!(room.waiting().is_empty());
    }

    #[test]
    fn test_start_delay_fires_once_after_exact_ticks() {
        let mut room = room(1, 100, 0);
        assert_eq!(room.add_player(A, IDLE_GAME), WaitReason::StartDelay);
        assert_eq!(room.countdown(), Some(100));

        let mut starts = 0;
        for tick in 1..=100 {
            if room.tick(IDLE_GAME) == WaitEvent::Start {
                starts += 1;
                assert_eq!(tick, 100);
            }
        }
        assert_eq!(starts, 1);
        assert_eq!(room.countdown(), None);
        for _ in 0..50 {
            assert_eq!(room.tick(IDLE_GAME), WaitEvent::Nothing);
        }
    }

    #[test]
    fn test_late_joiner_keeps_running_countdown() {
        let mut room = room(1, 100, 0);
        room.add_player(A, IDLE_GAME);
        for _ in 0..40 {
            room.tick(IDLE_GAME);
        }
        assert_eq!(room.add_player(B, IDLE_GAME), WaitReason::StartDelay);
        assert_eq!(room.countdown(), Some(60));
    }

    #[test]
    fn test_checkpoints_announced_on_whole_seconds() {
        let mut room = room(1, 45, 0);
        room.add_player(A, IDLE_GAME);
        let checkpoints: Vec<u64> = (0..45)
            .filter_map(|_| match room.tick(IDLE_GAME) {
                WaitEvent::Checkpoint { ticks_left } => Some(ticks_left),
                _ => None,
            })
            .collect();
        assert_eq!(checkpoints, vec![40, 20]);
    }

    #[test]
    fn test_starting_value_is_a_checkpoint() {
        let mut room = room(1, 100, 0);
        room.add_player(A, IDLE_GAME);
        let checkpoints: Vec<u64> = (0..100)
            .filter_map(|_| match room.tick(IDLE_GAME) {
                WaitEvent::Checkpoint { ticks_left } => Some(ticks_left),
                _ => None,
            })
            .collect();
        assert_eq!(checkpoints, vec![100, 80, 60, 40, 20]);
    }

    #[test]
    fn test_more_players_has_no_countdown() {
        let mut room = room(3, 0, 0);
        room.add_player(A, IDLE_GAME);
        assert_eq!(room.countdown(), None);
        assert_eq!(room.tick(IDLE_GAME), WaitEvent::Nothing);
    }

    #[test]
    fn test_respawn_delay_while_running() {
        let mut room = room(1, 0, 60);
        assert_eq!(room.add_player(A, RUNNING), WaitReason::RespawnDelay);
        assert_eq!(room.countdown(), Some(60));
        assert_eq!(room.add_player(B, RUNNING), WaitReason::RespawnDelay);
        assert_eq!(room.countdown(), Some(60));
    }

    #[test]
    fn test_no_respawn_delay_while_running() {
        let mut room = room(1, 0, 0);
        assert_eq!(room.add_player(A, RUNNING), WaitReason::NoWait);
    }

    #[test]
    fn test_round_holds_until_finished() {
        let mut room = room(1, 0, 0);
        let fighting = RoomContext {
            running: true,
            rounds: true,
            round_finished: false,
        };
        assert_eq!(room.add_player(A, fighting), WaitReason::Round);
        assert_eq!(room.countdown(), Some(0));
        for _ in 0..10 {
            assert_eq!(room.tick(fighting), WaitEvent::Nothing);
        }

        let finished = RoomContext {
            round_finished: true,
            ..fighting
        };
        assert_eq!(room.tick(finished), WaitEvent::Start);
    }

    #[test]
    fn test_game_ends_freezes_room() {
        let mut room = room(1, 40, 0);
        room.add_player(A, IDLE_GAME);
        room.set_game_ends();
        assert_eq!(room.add_player(B, RUNNING), WaitReason::GameEnds);
        assert_eq!(room.reason(), WaitReason::GameEnds);
        for _ in 0..100 {
            assert_eq!(room.tick(IDLE_GAME), WaitEvent::Nothing);
        }
        assert_eq!(room.waiting(), &[A, B]);
    }

    #[test]
    fn test_removing_last_player_idles_countdown() {
        let mut room = room(1, 40, 0);
        room.add_player(A, IDLE_GAME);
        room.remove_player(A);
        assert_eq!(room.countdown(), None);
        assert!(!room.contains(A));
    }

    #[test]
    fn test_lock_only_when_locking() {
        let mut open = room(1, 0, 0);
        open.lock_if_locking();
        assert!(!open.is_locked());

        let mut locking = WaitingRoom::new(WaitingRoomConfig {
            locking: true,
            ..open.config().clone()
        });
        locking.lock_if_locking();
        assert!(locking.is_locked());
    }
}

//! Game records, validated session settings, and the session state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use skirmish_combat::{MoneyConfig, PayoutTable};
use skirmish_loadout::{Armory, Button, ButtonRecord, Loadout, RespawnAction};
use skirmish_tick::seconds_to_ticks;
use skirmish_types::{ButtonId, ConfigurationError, Location, Violations};

use crate::arena::Arena;
use crate::bonus::{Bonus, BonusRecord};
use crate::mode::GameMode;
use crate::registry::ModeRegistry;
use crate::waiting_room::WaitingRoomConfig;

/// Ticks the session lingers after the game ends when `respawn_delay` is 0.
pub const DEFAULT_TEARDOWN_TICKS: u64 = 200;

/// Largest accepted arena radius, in blocks.
pub const MAX_RADIUS: i64 = 30_000_000;

// ---------------------------------------------------------------------------
// GameRecord
// ---------------------------------------------------------------------------

/// Record for one entry of the `games` file.
///
/// Fields not listed here belong to the game mode named by `type` and are
/// handed to its constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "type")]
    pub mode: String,
    #[serde(default)]
    pub viable_arenas: Vec<String>,
    /// Arena location the boundary square is centered on.
    #[serde(default)]
    pub center: Option<String>,
    /// Half the side of the boundary square, in blocks.
    #[serde(default)]
    pub radius: Option<i64>,
    /// Arena locations that take a clicking player back to the lobby.
    #[serde(default)]
    pub leave_blocks: Vec<String>,
    #[serde(default)]
    pub rounds: bool,
    /// 0 means unlimited.
    #[serde(default)]
    pub max_players: usize,
    /// Seconds; 0 means no time limit.
    #[serde(default)]
    pub max_time: u32,
    #[serde(default)]
    pub respawn_action: RespawnAction,
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    /// Ticks.
    #[serde(default)]
    pub respawn_delay: u64,
    /// Ticks.
    #[serde(default)]
    pub start_delay: u64,
    #[serde(default)]
    pub locking: bool,
    /// Arena location of the waiting room.
    #[serde(default)]
    pub waiting_room: Option<String>,
    #[serde(default)]
    pub bonuses: Vec<String>,
    #[serde(default)]
    pub buttons: BTreeMap<String, ButtonRecord>,
    /// Item set names building the class every player starts with.
    #[serde(default)]
    pub default_kit: Vec<String>,
    /// Blocks above the ground; 0 disables the check.
    #[serde(default = "default_height_limit")]
    pub height_limit: i64,
    #[serde(default = "default_height_damage")]
    pub height_damage: f64,
    #[serde(default)]
    pub money: MoneyConfig,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_min_players() -> usize {
    1
}

fn default_height_limit() -> i64 {
    512
}

fn default_height_damage() -> f64 {
    0.5
}

// ---------------------------------------------------------------------------
// SessionSettings
// ---------------------------------------------------------------------------

/// The playable square, in block coordinates (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i64,
    pub max_x: i64,
    pub min_z: i64,
    pub max_z: i64,
}

impl Bounds {
    pub fn around(center: &Location, radius: i64) -> Self {
        let (x, _, z) = center.block();
        Self {
            min_x: x.saturating_sub(radius),
            max_x: x.saturating_add(radius),
            min_z: z.saturating_sub(radius),
            max_z: z.saturating_add(radius),
        }
    }

    pub fn contains(&self, location: &Location) -> bool {
        let (x, _, z) = location.block();
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }
}

/// Shared, already validated inputs a game record refers to.
#[derive(Debug, Clone, Copy)]
pub struct GameContext<'a> {
    pub armory: &'a Armory,
    pub bonuses: &'a BTreeMap<String, BonusRecord>,
    pub registry: &'a ModeRegistry,
    /// Where players go when they leave the session.
    pub lobby_spawn: Location,
}

/// A game record resolved against one arena.
#[derive(Debug)]
pub struct SessionSettings {
    pub game: String,
    pub arena: Arena,
    pub center: Location,
    pub bounds: Bounds,
    pub leave_blocks: Vec<Location>,
    pub rounds: bool,
    /// 0 means unlimited.
    pub max_players: usize,
    /// Ticks; 0 means no time limit.
    pub max_time: u64,
    pub waiting_room: WaitingRoomConfig,
    pub bonuses: Vec<Bonus>,
    pub buttons: BTreeMap<ButtonId, Button>,
    pub default_loadout: Loadout,
    pub height_limit: i64,
    pub height_damage: f64,
    pub payouts: PayoutTable,
    pub lobby_spawn: Location,
}

impl SessionSettings {
    /// Validates `record` against `arena` and builds its game mode.
    ///
    /// Every violation in the record (including its buttons, bonuses,
    /// default kit and mode section) is reported in one error.
    pub fn build(
        game: &str,
        record: &GameRecord,
        arena: Arena,
        ctx: &GameContext<'_>,
    ) -> Result<(Self, Box<dyn GameMode>), ConfigurationError> {
        let mut v = Violations::new(format!("games.{game}"));
        let path = v.path().to_string();

        v.check(!record.viable_arenas.is_empty(), "no viable arenas are specified");

        let center = match &record.center {
            Some(name) => v.take(arena.require(&path, name)),
            None => {
                v.push("center must be specified");
                None
            }
        };
        let radius = match record.radius {
            Some(radius) if radius > MAX_RADIUS => {
                v.push(format!("radius must be at most {MAX_RADIUS}"));
                None
            }
            Some(radius) if radius > 0 => Some(radius),
            Some(_) => {
                v.push("radius must be positive");
                None
            }
            None => {
                v.push("radius must be specified");
                None
            }
        };
        let waiting_location = match &record.waiting_room {
            Some(name) => v.take(arena.require(&path, name)),
            None => {
                v.push("waiting_room must be specified");
                None
            }
        };
        let leave_path = v.child("leave_blocks");
        let leave_blocks = record
            .leave_blocks
            .iter()
            .filter_map(|name| v.take(arena.require(&leave_path, name)))
            .collect();

        v.check(record.min_players >= 1, "min_players must be at least 1");
        v.check(record.height_damage >= 0.0, "height_damage must not be negative");

        let mut buttons = BTreeMap::new();
        for (name, button) in &record.buttons {
            let button_path = v.child(&format!("buttons.{name}"));
            for required in &button.required {
                if !record.buttons.contains_key(required) {
                    v.absorb(ConfigurationError::new(
                        &button_path,
                        format!("required button '{required}' does not exist"),
                    ));
                }
            }
            let built = Button::from_record(
                &button_path,
                name,
                button,
                |block| arena.location(block),
                ctx.armory,
            );
            if let Some(button) = v.take(built) {
                buttons.insert(ButtonId::new(name.as_str()), button);
            }
        }

        let mut bonuses = Vec::with_capacity(record.bonuses.len());
        for name in &record.bonuses {
            match ctx.bonuses.get(name) {
                Some(bonus) => {
                    if let Some(bonus) = v.take(Bonus::from_record(name, bonus, &arena, ctx.armory)) {
                        bonuses.push(bonus);
                    }
                }
                None => v.push(format!("bonus '{name}' is not defined")),
            }
        }

        let default_loadout = v.take(ctx.armory.loadout(
            &v.child("default_kit"),
            &record.default_kit,
            record.respawn_action,
        ));

        let mode_record = serde_json::Value::Object(record.extra.clone());
        let mode = v.take(ctx.registry.build(&record.mode, &path, &mode_record, &arena));

        v.finish()?;

        match (center, radius, waiting_location, default_loadout, mode) {
            (Some(center), Some(radius), Some(location), Some(default_loadout), Some(mode)) => {
                let settings = Self {
                    game: game.to_string(),
                    center,
                    bounds: Bounds::around(&center, radius),
                    leave_blocks,
                    rounds: record.rounds,
                    max_players: record.max_players,
                    max_time: seconds_to_ticks(record.max_time),
                    waiting_room: WaitingRoomConfig {
                        min_players: record.min_players,
                        start_delay: record.start_delay,
                        respawn_delay: record.respawn_delay,
                        locking: record.locking,
                        location,
                    },
                    bonuses,
                    buttons,
                    default_loadout,
                    height_limit: record.height_limit,
                    height_damage: record.height_damage,
                    payouts: PayoutTable::from_config(&record.money),
                    lobby_spawn: ctx.lobby_spawn,
                    arena,
                };
                Ok((settings, mode))
            }
            _ => Err(ConfigurationError::new(path, "game could not be resolved")),
        }
    }

    /// Ticks between the end of the game and teardown.
    pub fn teardown_delay(&self) -> u64 {
        match self.waiting_room.respawn_delay {
            0 => DEFAULT_TEARDOWN_TICKS,
            delay => delay,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Waiting → Running → Ending → Stopped
/// ```
///
/// - **Waiting**: players gather in the waiting room until `min_players`
///   and the start delay are met.
/// - **Running**: the game is on. Players fight, die, and respawn.
/// - **Ending**: someone won or the time ran out. Everyone is parked in
///   the waiting room until teardown.
/// - **Stopped**: all players were sent back to the lobby. The session is
///   gone and its arena is free again.
///
/// A session can also be stopped from any phase (lobby shutdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Waiting,
    Running,
    Ending,
    Stopped,
}

impl SessionPhase {
    /// Returns `true` if new players may be admitted (locking aside).
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting | Self::Running)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Running),
            Self::Running => Some(Self::Ending),
            Self::Ending => Some(Self::Stopped),
            Self::Stopped => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Running => write!(f, "Running"),
            Self::Ending => write!(f, "Ending"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

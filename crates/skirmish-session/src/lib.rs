//! Game sessions for Skirmish.
//!
//! A [`GameSession`] binds one game record to one arena and runs the match:
//! waiting room, respawns, purchases, kill attribution and scoring. Each
//! session is owned by an actor task ([`spawn_session`]) that serializes
//! host events with the simulation tick. The [`SessionManager`] is the
//! lobby in front of them.
//!
//! # Key types
//!
//! - [`GameMode`]: the strategy trait behind free-for-all and team deathmatch
//! - [`ModeRegistry`]: builds a mode from a record's `type` tag
//! - [`WaitingRoom`]: the countdown state machine players wait in
//! - [`PurchaseLedger`]: button unlocks, buys and sells
//! - [`Host`]: everything the engine asks of the game server
//! - [`SessionHandle`]: send commands to a running session actor

mod actor;
mod arena;
mod bonus;
mod config;
mod error;
mod free_for_all;
mod host;
mod ledger;
mod manager;
mod mode;
mod player;
mod registry;
mod session;
mod team_deathmatch;
mod waiting_room;

pub use actor::{SessionHandle, spawn_session};
pub use arena::{Arena, ArenaRecord};
pub use bonus::{Bonus, BonusRecord};
pub use config::{
    Bounds, DEFAULT_TEARDOWN_TICKS, GameContext, GameRecord, MAX_RADIUS, SessionPhase,
    SessionSettings,
};
pub use error::SessionError;
pub use free_for_all::{FreeForAll, FreeForAllRecord};
pub use host::{Host, HostCall, RecordingHost};
pub use ledger::{Purchase, PurchaseLedger};
pub use manager::{LobbyConfig, LobbyRecord, SessionManager};
pub use mode::{GameMode, ModeOutcome, Standing};
pub use player::PlayerState;
pub use registry::{ModeConstructor, ModeRegistry, parse_record};
pub use session::{
    ClickAction, ClickOutcome, DamageVerdict, GameSession, SessionInfo, TargetId,
};
pub use team_deathmatch::{Team, TeamDeathmatch, TeamDeathmatchRecord, TeamRecord};
pub use waiting_room::{
    CHECKPOINT_SECONDS, RoomContext, WaitEvent, WaitReason, WaitingRoom, WaitingRoomConfig,
};

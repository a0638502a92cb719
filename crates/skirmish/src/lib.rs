//! # Skirmish
//!
//! Authoritative session engine for arena combat games.
//!
//! A game server implements the [`Host`](skirmish_session::Host) trait,
//! loads its record files into a [`Catalog`], and opens a lobby per
//! record. Each lobby is a [`SessionManager`](skirmish_session::SessionManager)
//! that starts sessions on free arenas as players join.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use skirmish::prelude::*;
//!
//! # async fn run() -> Result<(), SkirmishError> {
//! skirmish::init_tracing();
//! let catalog = Catalog::load("records")?;
//! let host = Arc::new(RecordingHost::new());
//! let mut lobby = catalog.open_lobby("main", host)?;
//! let session = lobby.join(PlayerId(1), "duel").await?;
//! # let _ = session;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod error;

pub use catalog::{Catalog, CatalogRecords};
pub use error::SkirmishError;

pub use skirmish_combat as combat;
pub use skirmish_loadout as loadout;
pub use skirmish_session as session;
pub use skirmish_tick as tick;
pub use skirmish_types as types;

/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Meant for binaries. Does nothing if a subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Everything a game server usually needs.
pub mod prelude {
    pub use crate::{Catalog, CatalogRecords, SkirmishError};
    pub use skirmish_combat::{Attacker, Attitude, DamageCause, Hull, KillEvent, KillKind, Target};
    pub use skirmish_loadout::{Intent, Loadout, LoadoutBuffer};
    pub use skirmish_session::{
        ClickAction, ClickOutcome, DamageVerdict, GameMode, Host, ModeRegistry, RecordingHost,
        SessionError, SessionHandle, SessionInfo, SessionManager, SessionPhase, TargetId,
    };
    pub use skirmish_tick::{TICKS_PER_SECOND, TickConfig, TickPolicy};
    pub use skirmish_types::{
        ButtonId, ConfigurationError, EntityId, Location, MessageKey, Notice, NoticeArg,
        PlayerId, SessionId, TeamId,
    };
}

//! Session manager: the lobby. Creates sessions on free arenas, routes
//! players to them, and frees arenas when sessions stop.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;

use skirmish_combat::{Attacker, DamageCause};
use skirmish_loadout::Armory;
use skirmish_tick::TickConfig;
use skirmish_types::{ConfigurationError, Location, PlayerId, SessionId, Violations};

use crate::actor::{SessionHandle, spawn_session};
use crate::arena::Arena;
use crate::bonus::BonusRecord;
use crate::config::{GameContext, GameRecord, SessionSettings};
use crate::host::Host;
use crate::registry::ModeRegistry;
use crate::session::{
    ClickAction, ClickOutcome, DamageVerdict, GameSession, SessionInfo, TargetId,
};
use crate::SessionError;

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Record for one entry of the `lobbies` file.
#[derive(Debug, Clone, Deserialize)]
pub struct LobbyRecord {
    /// Where players are sent when they leave a session.
    pub spawn: Location,
    /// Names of the games this lobby offers.
    #[serde(default)]
    pub games: Vec<String>,
}

/// Everything a lobby needs besides its own record.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    pub arenas: BTreeMap<String, Arena>,
    pub games: BTreeMap<String, GameRecord>,
    pub armory: Arc<Armory>,
    pub bonuses: BTreeMap<String, BonusRecord>,
    pub registry: ModeRegistry,
    pub tick_config: TickConfig,
}

struct LiveSession {
    game: String,
    arena: String,
    handle: SessionHandle,
}

/// Manages the sessions of one lobby and tracks which player is in which
/// session.
///
/// A player is in at most one session, and an arena hosts at most one
/// session at a time.
pub struct SessionManager {
    lobby: String,
    spawn: Location,
    offered: Vec<String>,
    config: LobbyConfig,
    host: Arc<dyn Host>,
    sessions: BTreeMap<SessionId, LiveSession>,
    /// Arena name → the session using it.
    arenas_in_use: HashMap<String, SessionId>,
    player_sessions: HashMap<PlayerId, SessionId>,
}

impl SessionManager {
    /// Validates every offered game against every arena it may run on.
    ///
    /// Fails with all violations found, so a broken record is reported
    /// at startup rather than when the first player joins.
    pub fn new(
        lobby: &str,
        record: &LobbyRecord,
        config: LobbyConfig,
        host: Arc<dyn Host>,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(format!("lobbies.{lobby}"));
        let ctx = GameContext {
            armory: &config.armory,
            bonuses: &config.bonuses,
            registry: &config.registry,
            lobby_spawn: record.spawn,
        };

        for game in &record.games {
            let Some(game_record) = config.games.get(game) else {
                v.push(format!("game '{game}' is not defined"));
                continue;
            };
            let path = format!("games.{game}");
            for arena_name in &game_record.viable_arenas {
                match config.arenas.get(arena_name) {
                    Some(arena) => {
                        let built = SessionSettings::build(game, game_record, arena.clone(), &ctx);
                        if let Err(e) = built {
                            v.absorb(e);
                        }
                    }
                    None => v.absorb(ConfigurationError::new(
                        &path,
                        format!("arena '{arena_name}' is not defined"),
                    )),
                }
            }
        }
        v.finish()?;

        tracing::info!(
            lobby,
            games = record.games.len(),
            arenas = config.arenas.len(),
            "lobby ready"
        );
        Ok(Self {
            lobby: lobby.to_string(),
            spawn: record.spawn,
            offered: record.games.clone(),
            config,
            host,
            sessions: BTreeMap::new(),
            arenas_in_use: HashMap::new(),
            player_sessions: HashMap::new(),
        })
    }

    pub fn lobby(&self) -> &str {
        &self.lobby
    }

    pub fn games(&self) -> &[String] {
        &self.offered
    }

    /// Returns the session a player is currently in, if any.
    ///
    /// A session that stopped on its own no longer counts, even before it
    /// is reaped.
    pub fn player_session(&self, player: PlayerId) -> Option<SessionId> {
        self.player_sessions
            .get(&player)
            .copied()
            .filter(|id| self.sessions.get(id).is_some_and(|s| !s.handle.is_closed()))
    }

    /// Returns a handle to a running session.
    pub fn handle(&self, session: SessionId) -> Option<SessionHandle> {
        self.sessions.get(&session).map(|s| s.handle.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Arenas currently hosting a session.
    pub fn arenas_in_use(&self) -> Vec<String> {
        let mut arenas: Vec<String> = self.arenas_in_use.keys().cloned().collect();
        arenas.sort();
        arenas
    }

    /// Puts a player into a session of `game`: an open one if there is
    /// one, otherwise a new one on the first free viable arena.
    pub async fn join(&mut self, player: PlayerId, game: &str) -> Result<SessionId, SessionError> {
        self.reap();
        if let Some(current) = self.player_sessions.get(&player) {
            return Err(SessionError::AlreadyInSession(player, *current));
        }
        if !self.offered.iter().any(|g| g == game) {
            return Err(SessionError::UnknownGame(game.to_string()));
        }

        // A session may fill up or lock between get_info and join; keep
        // looking when that happens.
        for (session_id, live) in &self.sessions {
            if live.game != game {
                continue;
            }
            let Ok(info) = live.handle.get_info().await else {
                continue;
            };
            if !info.has_room() {
                continue;
            }
            match live.handle.join(player).await {
                Ok(()) => {
                    self.player_sessions.insert(player, *session_id);
                    return Ok(*session_id);
                }
                Err(e) => {
                    tracing::debug!(%session_id, %player, error = %e, "join rejected");
                }
            }
        }

        let session_id = self.create_session(game)?;
        let result = match self.sessions.get(&session_id) {
            Some(live) => live.handle.join(player).await,
            None => Err(SessionError::NotFound(session_id)),
        };
        if let Err(e) = result {
            tracing::warn!(%session_id, %player, error = %e, "join into new session failed");
            self.destroy_session(session_id).await;
            return Err(e);
        }
        self.player_sessions.insert(player, session_id);
        Ok(session_id)
    }

    fn create_session(&mut self, game: &str) -> Result<SessionId, SessionError> {
        let record = self
            .config
            .games
            .get(game)
            .ok_or_else(|| SessionError::UnknownGame(game.to_string()))?;
        let arena = record
            .viable_arenas
            .iter()
            .find(|name| !self.arenas_in_use.contains_key(*name))
            .and_then(|name| self.config.arenas.get(name))
            .ok_or_else(|| {
                ConfigurationError::new(format!("games.{game}"), "no viable arena is free")
            })?;

        let ctx = GameContext {
            armory: &self.config.armory,
            bonuses: &self.config.bonuses,
            registry: &self.config.registry,
            lobby_spawn: self.spawn,
        };
        let (settings, mode) = SessionSettings::build(game, record, arena.clone(), &ctx)?;

        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let arena_name = arena.name().to_string();
        let session = GameSession::new(session_id, settings, mode, Arc::clone(&self.host));
        let handle = spawn_session(
            session,
            self.config.tick_config.clone(),
            DEFAULT_CHANNEL_SIZE,
        );

        self.arenas_in_use.insert(arena_name.clone(), session_id);
        self.sessions.insert(
            session_id,
            LiveSession {
                game: game.to_string(),
                arena: arena_name,
                handle,
            },
        );
        tracing::info!(%session_id, game, lobby = %self.lobby, "session created");
        Ok(session_id)
    }

    /// Removes a player from their current session and sends them to the
    /// lobby spawn.
    pub async fn leave(&mut self, player: PlayerId) -> Result<(), SessionError> {
        self.reap();
        let session_id = self.session_of(player)?;
        let result = match self.sessions.get(&session_id) {
            Some(live) => live.handle.leave(player).await,
            None => Ok(()),
        };
        self.player_sessions.remove(&player);
        match result {
            // The session stopped on its own; the player is already out.
            Ok(()) | Err(SessionError::Unavailable(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Routes a block click. A click on a leave block removes the player.
    pub async fn click(
        &mut self,
        player: PlayerId,
        block: Option<Location>,
        action: ClickAction,
    ) -> Result<ClickOutcome, SessionError> {
        self.reap();
        let outcome = self.member_handle(player)?.click(player, block, action).await?;
        if outcome == ClickOutcome::Leave {
            self.leave(player).await?;
        }
        Ok(outcome)
    }

    /// Routes a hit on a player to the victim's session.
    pub async fn hit_player(
        &mut self,
        victim: PlayerId,
        attacker: Attacker,
    ) -> Result<bool, SessionError> {
        self.reap();
        self.member_handle(victim)?
            .hit(TargetId::Player(victim), attacker)
            .await
    }

    /// Routes host damage on a player to the victim's session.
    pub async fn damage_player(
        &mut self,
        victim: PlayerId,
        cause: DamageCause,
        remaining_health: f64,
    ) -> Result<DamageVerdict, SessionError> {
        self.reap();
        self.member_handle(victim)?
            .damage(TargetId::Player(victim), cause, remaining_health)
            .await
    }

    /// Queries every session for its info. Sessions that fail to respond
    /// are skipped.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut infos = Vec::with_capacity(self.sessions.len());
        for live in self.sessions.values() {
            if let Ok(info) = live.handle.get_info().await {
                infos.push(info);
            }
        }
        infos
    }

    /// Forgets sessions whose actor has stopped, freeing their arenas and
    /// their players. Returns how many were reaped.
    pub fn reap(&mut self) -> usize {
        let stopped: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, live)| live.handle.is_closed())
            .map(|(id, _)| *id)
            .collect();
        for session_id in &stopped {
            self.forget(*session_id);
            tracing::debug!(%session_id, "session reaped");
        }
        stopped.len()
    }

    /// Shuts every session down.
    pub async fn shutdown_all(&mut self) {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        for session_id in ids {
            self.destroy_session(session_id).await;
        }
        tracing::info!(lobby = %self.lobby, "all sessions shut down");
    }

    async fn destroy_session(&mut self, session_id: SessionId) {
        if let Some(live) = self.sessions.get(&session_id) {
            let _ = live.handle.shutdown().await;
        }
        self.forget(session_id);
        tracing::info!(%session_id, "session destroyed");
    }

    fn forget(&mut self, session_id: SessionId) {
        if let Some(live) = self.sessions.remove(&session_id) {
            self.arenas_in_use.remove(&live.arena);
        }
        self.player_sessions.retain(|_, sid| *sid != session_id);
    }

    fn session_of(&self, player: PlayerId) -> Result<SessionId, SessionError> {
        self.player_sessions
            .get(&player)
            .copied()
            .ok_or(SessionError::NoSession(player))
    }

    fn member_handle(&self, player: PlayerId) -> Result<&SessionHandle, SessionError> {
        let session_id = self.session_of(player)?;
        self.sessions
            .get(&session_id)
            .map(|live| &live.handle)
            .ok_or(SessionError::NotFound(session_id))
    }
}

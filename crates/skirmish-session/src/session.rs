//! `GameSession`: one running game bound to one arena.
//!
//! The session is plain synchronous state. It never blocks and never
//! spawns; the actor in [`crate::actor`] owns it and feeds it commands and
//! ticks on a single task. Every side effect goes through the injected
//! [`Host`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use skirmish_combat::{Attacker, Attitude, DamageCause, KillEvent, Target};
use skirmish_loadout::Intent;
use skirmish_tick::{TICKS_PER_SECOND, TimerQueue, ticks_to_seconds};
use skirmish_types::{
    ButtonId, EntityId, Location, MessageKey, Notice, NoticeArg, PlayerId, SessionId,
};

use crate::config::{SessionPhase, SessionSettings};
use crate::host::Host;
use crate::ledger::PurchaseLedger;
use crate::mode::{GameMode, ModeOutcome, Standing};
use crate::player::PlayerState;
use crate::waiting_room::{RoomContext, WaitEvent, WaitReason, WaitingRoom};
use crate::SessionError;

// ---------------------------------------------------------------------------
// Public event types
// ---------------------------------------------------------------------------

/// Anything in the session that can be hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    Player(PlayerId),
    Entity(EntityId),
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => id.fmt(f),
            Self::Entity(id) => id.fmt(f),
        }
    }
}

/// Which mouse button a player clicked a block with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Buys from a button.
    Left,
    /// Sells to a button.
    Right,
}

impl ClickAction {
    fn intent(self) -> Intent {
        match self {
            Self::Left => Intent::Buy,
            Self::Right => Intent::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Second click in the same tick.
    Ignored,
    /// A button was clicked. `applied` tells whether anything changed.
    Button { applied: bool },
    /// A leave block was clicked; the caller should remove the player.
    Leave,
    /// Not a block the session cares about.
    Nothing,
}

/// How host-delivered damage should be treated.
#[derive(Debug, Clone, PartialEq)]
pub enum DamageVerdict {
    /// Not a session target.
    Ignored,
    /// Cancel the damage.
    Suppressed,
    /// Let the damage through.
    Allowed,
    /// The damage was lethal and has been turned into a kill. Cancel the
    /// damage; the victim is already in the waiting room.
    Killed(KillEvent),
}

/// A snapshot of session metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub game: String,
    pub arena: String,
    pub phase: SessionPhase,
    pub player_count: usize,
    /// 0 means unlimited.
    pub max_players: usize,
    pub waiting: usize,
    pub locked: bool,
    /// Ticks until the time limit, if there is one.
    pub time_left: Option<u64>,
    pub unique_number: u32,
}

impl SessionInfo {
    /// Returns `true` if a new player could be admitted right now.
    pub fn has_room(&self) -> bool {
        self.phase.is_joinable()
            && !self.locked
            && (self.max_players == 0 || self.player_count < self.max_players)
    }
}

/// Delayed work, drained once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    /// The respawn grace is over: hits start counting.
    Join(PlayerId),
    /// The game ended a while ago: send everybody home.
    Teardown,
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

pub struct GameSession {
    id: SessionId,
    settings: SessionSettings,
    mode: Box<dyn GameMode>,
    host: Arc<dyn Host>,
    players: BTreeMap<PlayerId, PlayerState>,
    entities: HashMap<EntityId, Box<dyn Target>>,
    ledger: PurchaseLedger,
    waiting_room: WaitingRoom,
    timers: TimerQueue<SessionTimer>,
    phase: SessionPhase,
    time_left: u64,
    round_finished: bool,
    running_ticks: u64,
    clicked: HashSet<PlayerId>,
    unique_number: u32,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("game", &self.settings.game)
            .field("phase", &self.phase)
            .field("players", &self.players.len())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    pub fn new(
        id: SessionId,
        settings: SessionSettings,
        mode: Box<dyn GameMode>,
        host: Arc<dyn Host>,
    ) -> Self {
        let waiting_room = WaitingRoom::new(settings.waiting_room.clone());
        let time_left = settings.max_time;
        tracing::info!(
            session_id = %id,
            game = %settings.game,
            arena = settings.arena.name(),
            mode = mode.kind(),
            "session created"
        );
        Self {
            id,
            settings,
            mode,
            host,
            players: BTreeMap::new(),
            entities: HashMap::new(),
            ledger: PurchaseLedger::new(),
            waiting_room,
            timers: TimerQueue::new(),
            phase: SessionPhase::Waiting,
            time_left,
            round_finished: false,
            running_ticks: 0,
            clicked: HashSet::new(),
            unique_number: rand::random(),
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn mode(&self) -> &dyn GameMode {
        self.mode.as_ref()
    }

    pub fn player(&self, player: PlayerId) -> Option<&PlayerState> {
        self.players.get(&player)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    pub fn balance(&self, player: PlayerId) -> Option<u64> {
        self.players.get(&player).map(|p| p.wallet.balance())
    }

    pub fn waiting_room(&self) -> &WaitingRoom {
        &self.waiting_room
    }

    pub fn ledger(&self) -> &PurchaseLedger {
        &self.ledger
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn is_round_finished(&self) -> bool {
        self.round_finished
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            game: self.settings.game.clone(),
            arena: self.settings.arena.name().to_string(),
            phase: self.phase,
            player_count: self.players.len(),
            max_players: self.settings.max_players,
            waiting: self.waiting_room.waiting().len(),
            locked: self.waiting_room.is_locked(),
            time_left: (self.settings.max_time > 0).then_some(self.time_left),
            unique_number: self.unique_number,
        }
    }

    /// How `observer` regards `subject` under the current mode.
    pub fn attitude(&self, observer: PlayerId, subject: PlayerId) -> Attitude {
        let playing = self.players.get(&observer).is_some_and(|p| p.is_playing());
        self.mode.attitude(
            Standing {
                player: observer,
                playing,
            },
            subject,
        )
    }

    fn room_context(&self) -> RoomContext {
        RoomContext {
            running: self.phase.is_running(),
            rounds: self.settings.rounds,
            round_finished: self.round_finished,
        }
    }

    // -- membership --------------------------------------------------------

    /// Admits a player and sends them to the waiting room.
    pub fn add_player(&mut self, player: PlayerId) -> Result<(), SessionError> {
        if !self.phase.is_joinable() {
            return Err(SessionError::InvalidState(format!(
                "cannot join session in phase {}",
                self.phase
            )));
        }
        if self.waiting_room.is_locked() {
            return Err(SessionError::Locked(self.id));
        }
        if self.players.contains_key(&player) {
            return Err(SessionError::AlreadyInSession(player, self.id));
        }
        let max = self.settings.max_players;
        if max > 0 && self.players.len() >= max {
            return Err(SessionError::Full(self.id));
        }

        let state = PlayerState::new(player, self.settings.default_loadout.replicate());
        self.players.insert(player, state);
        tracing::info!(
            session_id = %self.id,
            %player,
            players = self.players.len(),
            "player joined"
        );

        self.move_to_waiting_room(player);
        Ok(())
    }

    /// Removes a player and sends them to the lobby spawn.
    ///
    /// The last player leaving stops the session.
    pub fn remove_player(&mut self, player: PlayerId) -> Result<(), SessionError> {
        if !self.detach(player) {
            return Err(SessionError::NotInSession(player, self.id));
        }
        if self.players.is_empty() && self.phase != SessionPhase::Stopped {
            tracing::info!(session_id = %self.id, "last player left");
            self.stop();
        }
        Ok(())
    }

    fn detach(&mut self, player: PlayerId) -> bool {
        if self.players.remove(&player).is_none() {
            return false;
        }
        self.ledger.forget(player);
        self.waiting_room.remove_player(player);
        self.timers
            .cancel_where(|t| matches!(t, SessionTimer::Join(p) if *p == player));
        self.clicked.remove(&player);
        self.mode.on_leave(player);
        self.host.teleport(player, self.settings.lobby_spawn);
        tracing::info!(
            session_id = %self.id,
            %player,
            players = self.players.len(),
            "player left"
        );
        true
    }

    // -- lifecycle ---------------------------------------------------------

    /// Starts the game now, regardless of the waiting room.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.phase.can_transition_to(SessionPhase::Running) {
            return Err(SessionError::InvalidState(format!(
                "cannot start session in phase {}",
                self.phase
            )));
        }
        self.waiting_room.start_players();
        self.begin();
        Ok(())
    }

    fn begin(&mut self) {
        self.phase = SessionPhase::Running;
        self.time_left = self.settings.max_time;
        self.running_ticks = 0;
        for bonus in &mut self.settings.bonuses {
            bonus.reset();
        }
        tracing::info!(
            session_id = %self.id,
            players = self.players.len(),
            "game started"
        );
        for player in self.player_ids() {
            self.respawn(player);
        }
        self.waiting_room.lock_if_locking();
    }

    /// Ends the game: everyone is parked, results are announced, and the
    /// session tears itself down after the teardown delay.
    pub fn end_game(&mut self) -> Result<(), SessionError> {
        if !self.phase.can_transition_to(SessionPhase::Ending) {
            return Err(SessionError::InvalidState(format!(
                "cannot end game in phase {}",
                self.phase
            )));
        }
        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        self.phase = SessionPhase::Ending;
        tracing::info!(session_id = %self.id, "game ended");

        self.waiting_room.set_game_ends();
        let active: Vec<PlayerId> = self
            .players
            .keys()
            .copied()
            .filter(|p| !self.waiting_room.contains(*p))
            .collect();
        self.park(&active);

        let ids = self.player_ids();
        for player in &ids {
            self.host.notify(*player, Notice::new(MessageKey::GameEnds));
        }
        for (player, notice) in self.mode.results(&ids) {
            self.host.notify(player, notice);
        }

        self.timers.cancel_where(|t| matches!(t, SessionTimer::Join(_)));
        self.timers
            .schedule_in(self.settings.teardown_delay(), SessionTimer::Teardown);
    }

    /// Sends every player back to the lobby. Idempotent.
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Stopped {
            return;
        }
        self.phase = SessionPhase::Stopped;
        for player in self.player_ids() {
            self.detach(player);
        }
        self.timers.clear();
        self.entities.clear();
        self.ledger.clear();
        self.mode.on_stop();
        tracing::info!(session_id = %self.id, "session stopped");
    }

    // -- waiting room ------------------------------------------------------

    fn move_to_waiting_room(&mut self, player: PlayerId) {
        self.park(&[player]);
    }

    /// Puts players into the waiting room together, so that a start
    /// triggered by one of them picks up all of them.
    fn park(&mut self, players: &[PlayerId]) {
        let mut reasons = Vec::with_capacity(players.len());
        let mut start_now = false;
        for &player in players {
            let Some(state) = self.players.get_mut(&player) else {
                continue;
            };
            state.set_playing(false);
            state.loadout.on_respawn();
            self.host.loadout_changed(player, state.loadout.current());
            self.timers
                .cancel_where(|t| matches!(t, SessionTimer::Join(p) if *p == player));

            let ctx = self.room_context();
            let reason = self.waiting_room.add_player(player, ctx);
            if reason == WaitReason::NoWait {
                start_now = true;
            } else {
                self.host.teleport(player, self.waiting_room.location());
            }
            tracing::debug!(session_id = %self.id, %player, %reason, "player waiting");
            reasons.push((player, reason));
        }

        if start_now {
            self.start_players();
        }
        for (player, reason) in reasons {
            self.wait_message(player, reason);
        }
    }

    fn start_players(&mut self) {
        let waiting = self.waiting_room.start_players();
        match self.phase {
            SessionPhase::Waiting => self.begin(),
            SessionPhase::Running => {
                for player in waiting {
                    self.respawn(player);
                }
            }
            SessionPhase::Ending | SessionPhase::Stopped => {}
        }
        self.round_finished = false;
    }

    fn wait_message(&self, player: PlayerId, reason: WaitReason) {
        let countdown = self.waiting_room.countdown().unwrap_or(0);
        let seconds = || NoticeArg::Seconds(ticks_to_seconds(countdown));
        match reason {
            WaitReason::MorePlayers => {
                let missing = self
                    .waiting_room
                    .config()
                    .min_players
                    .saturating_sub(self.players.len());
                let notice = Notice::new(MessageKey::MorePlayers)
                    .arg(NoticeArg::Count(i64::try_from(missing).unwrap_or(i64::MAX)));
                for waiting in self.waiting_room.waiting() {
                    self.host.notify(*waiting, notice.clone());
                }
            }
            WaitReason::StartDelay => {
                self.host
                    .notify(player, Notice::new(MessageKey::StartDelay).arg(seconds()));
            }
            WaitReason::RespawnDelay => {
                self.host
                    .notify(player, Notice::new(MessageKey::RespawnDelay).arg(seconds()));
            }
            WaitReason::Round => {
                self.host.notify(player, Notice::new(MessageKey::RoundDelay));
            }
            WaitReason::NoWait | WaitReason::GameEnds => {}
        }
    }

    /// Puts a player into the arena. They start taking hits a second later.
    fn respawn(&mut self, player: PlayerId) {
        if !self.players.contains_key(&player) {
            return;
        }
        let spawn = self.mode.on_respawn(player).unwrap_or(self.settings.center);
        if let Some(state) = self.players.get_mut(&player) {
            state.restore_hull();
        }
        self.host.teleport(player, spawn);
        self.timers
            .schedule_in(u64::from(TICKS_PER_SECOND), SessionTimer::Join(player));
        self.host.notify(player, Notice::new(MessageKey::NoWaiting));
        tracing::debug!(session_id = %self.id, %player, %spawn, "player respawned");
    }

    // -- combat ------------------------------------------------------------

    pub fn register_target(&mut self, id: EntityId, target: Box<dyn Target>) {
        self.entities.insert(id, target);
    }

    pub fn unregister_target(&mut self, id: EntityId) -> Option<Box<dyn Target>> {
        self.entities.remove(&id)
    }

    /// Delivers a hit to a target. Returns whether the target accepted it.
    ///
    /// An accepted hit on a player by another session member pays both
    /// sides according to their attitude.
    pub fn handle_hit(&mut self, target: TargetId, attacker: Attacker) -> bool {
        let victim = match target {
            TargetId::Entity(id) => {
                return self
                    .entities
                    .get_mut(&id)
                    .is_some_and(|t| t.handle_hit(&attacker));
            }
            TargetId::Player(victim) => victim,
        };

        let Some(state) = self.players.get_mut(&victim) else {
            return false;
        };
        if !state.hull.handle_hit(&attacker) {
            return false;
        }
        if state.hull.is_destroyed() {
            tracing::debug!(
                session_id = %self.id,
                %victim,
                weapon = attacker.weapon(),
                "hull destroyed"
            );
        }

        if let Some(shooter) = attacker.shooter().filter(|s| self.players.contains_key(s)) {
            let attitude = self.attitude(shooter, victim);
            let payout = self.settings.payouts.hit(attitude);
            self.credit(shooter, payout.attacker);
            self.credit(victim, payout.victim);
        }
        true
    }

    /// Resolves the death of `victim`: announces it, pays out, scores it,
    /// and sends the victim to the waiting room.
    pub fn handle_kill(&mut self, victim: PlayerId, cause: DamageCause) -> Option<KillEvent> {
        if !self.phase.is_running() {
            return None;
        }
        let state = self.players.get(&victim)?;
        let event = KillEvent::resolve(victim, state.hull.last_attacker(), cause);

        let notice = match event.killer {
            Some(killer) => Notice::new(event.kind.message_key())
                .arg(NoticeArg::Player(victim))
                .arg(NoticeArg::Player(killer)),
            None => Notice::new(MessageKey::Suicide).arg(NoticeArg::Player(victim)),
        };
        for player in self.players.keys() {
            self.host.notify(*player, notice.clone());
        }
        self.host.kill_event(self.id, &event);

        let attitude = match event.killer {
            Some(killer) => {
                let attitude = self.attitude(killer, victim);
                let payout = self.settings.payouts.kill(attitude);
                self.credit(killer, payout.attacker);
                self.credit(victim, payout.victim);
                attitude
            }
            None => {
                self.credit(victim, self.settings.payouts.suicide());
                Attitude::Neutral
            }
        };
        let outcome = self.mode.on_kill(victim, event.killer, attitude);
        tracing::info!(
            session_id = %self.id,
            %victim,
            killer = ?event.killer,
            kind = %event.kind,
            %attitude,
            "player died"
        );

        if outcome == ModeOutcome::GameOver {
            // Parks the victim along with everyone else.
            self.finish();
            return Some(event);
        }

        self.move_to_waiting_room(victim);
        if self.settings.rounds && self.phase.is_running() && !self.round_finished {
            let alive: Vec<PlayerId> = self
                .players
                .keys()
                .copied()
                .filter(|p| !self.waiting_room.contains(*p))
                .collect();
            if self.mode.round_over(&alive) {
                tracing::info!(session_id = %self.id, survivors = alive.len(), "round finished");
                self.round_finished = true;
                self.park(&alive);
            }
        }
        Some(event)
    }

    /// Gates damage the host is about to apply to a target.
    ///
    /// `remaining_health` is the target's health after the damage.
    pub fn on_damage(
        &mut self,
        target: TargetId,
        cause: DamageCause,
        remaining_health: f64,
    ) -> DamageVerdict {
        let player = match target {
            TargetId::Entity(id) if self.entities.contains_key(&id) => {
                return if cause.is_allowed() {
                    DamageVerdict::Allowed
                } else {
                    DamageVerdict::Suppressed
                };
            }
            TargetId::Entity(_) => return DamageVerdict::Ignored,
            TargetId::Player(player) => player,
        };
        let Some(state) = self.players.get_mut(&player) else {
            return DamageVerdict::Ignored;
        };
        if !cause.is_allowed() || !state.is_playing() {
            return DamageVerdict::Suppressed;
        }
        state.hull.sync_health(remaining_health);
        if remaining_health > 0.0 {
            return DamageVerdict::Allowed;
        }
        match self.handle_kill(player, cause) {
            Some(event) => DamageVerdict::Killed(event),
            None => DamageVerdict::Suppressed,
        }
    }

    // -- purchases ---------------------------------------------------------

    /// Handles a block click by a member.
    pub fn click(
        &mut self,
        player: PlayerId,
        block: Option<Location>,
        action: ClickAction,
    ) -> Result<ClickOutcome, SessionError> {
        if !self.players.contains_key(&player) {
            return Err(SessionError::NotInSession(player, self.id));
        }
        let Some(block) = block else {
            return Ok(ClickOutcome::Nothing);
        };
        if !self.clicked.insert(player) {
            return Ok(ClickOutcome::Ignored);
        }

        let button = self
            .settings
            .buttons
            .values()
            .find(|b| b.occupies(&block))
            .map(|b| b.id().clone());
        if let Some(button) = button {
            let applied = self.apply_button(player, &button, action.intent(), true)?;
            return Ok(ClickOutcome::Button { applied });
        }
        if self.settings.leave_blocks.iter().any(|l| l.same_block(&block)) {
            return Ok(ClickOutcome::Leave);
        }
        Ok(ClickOutcome::Nothing)
    }

    /// Applies a button for a member. Returns whether anything changed.
    ///
    /// With `notify` off only permission failures are reported.
    pub fn apply_button(
        &mut self,
        player: PlayerId,
        button: &ButtonId,
        intent: Intent,
        notify: bool,
    ) -> Result<bool, SessionError> {
        let definition = self
            .settings
            .buttons
            .get(button)
            .ok_or_else(|| SessionError::UnknownButton(button.clone()))?;
        let state = self
            .players
            .get_mut(&player)
            .ok_or(SessionError::NotInSession(player, self.id))?;

        let host = &self.host;
        let purchase = self.ledger.apply(
            player,
            &mut state.loadout,
            &mut state.wallet,
            definition,
            intent,
            |permission| host.has_permission(player, permission),
        );
        if purchase.applied {
            host.loadout_changed(player, state.loadout.current());
        }
        if notify || purchase.always_notified() {
            host.notify(player, Notice::new(purchase.message));
        }
        tracing::debug!(
            session_id = %self.id,
            %player,
            %button,
            ?intent,
            applied = purchase.applied,
            message = %purchase.message,
            "button applied"
        );
        Ok(purchase.applied)
    }

    /// Adds `delta` to a member's money. Returns the new balance.
    pub fn pay(&mut self, player: PlayerId, delta: i64) -> Result<u64, SessionError> {
        let state = self
            .players
            .get_mut(&player)
            .ok_or(SessionError::NotInSession(player, self.id))?;
        state.wallet.pay(delta);
        Ok(state.wallet.balance())
    }

    fn credit(&mut self, player: PlayerId, delta: i64) {
        if delta == 0 {
            return;
        }
        if let Some(state) = self.players.get_mut(&player) {
            state.wallet.pay(delta);
        }
    }

    // -- tick --------------------------------------------------------------

    /// Advances the session by one tick.
    pub fn tick(&mut self) {
        if self.phase == SessionPhase::Stopped {
            return;
        }
        self.clicked.clear();

        if self.phase.is_running() && self.settings.max_time > 0 {
            self.time_left = self.time_left.saturating_sub(1);
            if self.time_left == 0 {
                tracing::info!(session_id = %self.id, "time limit reached");
                self.finish();
            }
        }

        let ctx = self.room_context();
        match self.waiting_room.tick(ctx) {
            WaitEvent::Start => self.start_players(),
            WaitEvent::Checkpoint { ticks_left } => {
                let notice = Notice::new(MessageKey::Countdown)
                    .arg(NoticeArg::Seconds(ticks_to_seconds(ticks_left)));
                for player in self.waiting_room.waiting() {
                    self.host.notify(*player, notice.clone());
                }
            }
            WaitEvent::Nothing => {}
        }

        for timer in self.timers.advance() {
            match timer {
                SessionTimer::Join(player) => {
                    if self.phase.is_running() && !self.waiting_room.contains(player) {
                        if let Some(state) = self.players.get_mut(&player) {
                            state.set_playing(true);
                        }
                    }
                }
                SessionTimer::Teardown => {
                    self.stop();
                    return;
                }
            }
        }

        if self.phase.is_running() {
            self.enforce_bounds();
            self.enforce_height();
            self.collect_bonuses();
            self.running_ticks += 1;
        }
    }

    /// Players in the arena (not waiting), in id order.
    fn in_arena(&self) -> Vec<PlayerId> {
        self.players
            .keys()
            .copied()
            .filter(|p| !self.waiting_room.contains(*p))
            .collect()
    }

    fn enforce_bounds(&mut self) {
        for player in self.in_arena() {
            if !self.phase.is_running() {
                break;
            }
            let Some(position) = self.host.position_of(player) else {
                continue;
            };
            if !self.settings.bounds.contains(&position) {
                tracing::debug!(
                    session_id = %self.id,
                    %player,
                    %position,
                    "player left the arena"
                );
                self.host.kill(player);
                self.handle_kill(player, DamageCause::Custom);
            }
        }
    }

    fn enforce_height(&mut self) {
        let limit = self.settings.height_limit;
        if limit <= 0 || self.running_ticks % u64::from(TICKS_PER_SECOND) != 0 {
            return;
        }
        for player in self.in_arena() {
            let too_high = self
                .host
                .position_of(player)
                .is_some_and(|p| p.y > limit as f64);
            if too_high {
                self.host.damage(player, self.settings.height_damage);
            }
        }
    }

    fn collect_bonuses(&mut self) {
        let flying: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.is_playing())
            .map(|p| p.id())
            .collect();
        let Self {
            settings,
            players,
            host,
            id,
            ..
        } = self;

        for bonus in &mut settings.bonuses {
            bonus.tick();
            if !bonus.is_available() {
                continue;
            }
            for player in &flying {
                let in_reach = host
                    .position_of(*player)
                    .is_some_and(|p| bonus.in_reach(&p));
                let Some(state) = players.get_mut(player).filter(|_| in_reach) else {
                    continue;
                };
                if !state.loadout.apply_current(bonus.set()).is_applied() {
                    continue;
                }
                bonus.collect();
                host.loadout_changed(*player, state.loadout.current());
                let notice = Notice::new(MessageKey::BonusCollected)
                    .arg(NoticeArg::Text(bonus.id().to_string()));
                host.notify(*player, notice);
                tracing::debug!(session_id = %id, %player, bonus = bonus.id(), "bonus collected");
                break;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use skirmish_combat::KillKind;
    use skirmish_loadout::{Armory, ArmoryRecords};

    use super::*;
    use crate::arena::{Arena, ArenaRecord};
    use crate::bonus::BonusRecord;
    use crate::config::{GameContext, GameRecord};
    use crate::host::{HostCall, RecordingHost};
    use crate::registry::ModeRegistry;

    pub(crate) const LOBBY_SPAWN: Location = Location::new(1000.0, 64.0, 1000.0);
    pub(crate) const CENTER: Location = Location::new(0.5, 64.0, 0.5);
    pub(crate) const WAITING: Location = Location::new(0.0, 100.0, 0.0);
    const SHOP: Location = Location::new(3.0, 64.0, 3.0);
    const EXIT: Location = Location::new(5.0, 64.0, 5.0);

    fn arena() -> Arena {
        let record: ArenaRecord = serde_json::from_value(serde_json::json!({
            "locations": {
                "center": CENTER,
                "lobby": WAITING,
                "shop": SHOP,
                "exit": EXIT,
                "pad": { "x": 0.0, "y": 64.0, "z": 20.0 }
            }
        }))
        .unwrap();
        Arena::from_record("canyon", &record).unwrap()
    }

    fn armory() -> Armory {
        let records: ArmoryRecords = serde_json::from_value(serde_json::json!({
            "wings": { "light": { "health": 20.0 } },
            "items": { "rockets": { "max_amount": 8 } },
            "sets": {
                "fighter": { "name": "Fighter", "wings": "light", "items": { "rockets": 2 } },
                "rockets": { "items": { "rockets": 2 } },
                "refill": { "mode": "fill", "items": { "rockets": 1 } }
            }
        }))
        .unwrap();
        Armory::from_records(&records).unwrap()
    }

    /// A small free-for-all game with `overrides` merged over it.
    pub(crate) fn session_with(
        overrides: serde_json::Value,
        host: Arc<RecordingHost>,
    ) -> GameSession {
        let mut game = serde_json::json!({
            "type": "free_for_all",
            "viable_arenas": ["canyon"],
            "center": "center",
            "radius": 30,
            "waiting_room": "lobby",
            "leave_blocks": ["exit"],
            "default_kit": ["fighter"],
            "buttons": {
                "shop": { "blocks": ["shop"], "buy_cost": 5, "on_buy": "rockets" }
            }
        });
        if let (Some(base), serde_json::Value::Object(extra)) = (game.as_object_mut(), overrides) {
            base.extend(extra);
        }
        let record: GameRecord = serde_json::from_value(game).unwrap();
        let armory = armory();
        let mut bonuses: BTreeMap<String, BonusRecord> = BTreeMap::new();
        bonuses.insert(
            "ammo".to_string(),
            serde_json::from_value(serde_json::json!({
                "location": "pad",
                "set": "rockets",
                "respawn": 10
            }))
            .unwrap(),
        );
        let registry = ModeRegistry::default();
        let ctx = GameContext {
            armory: &armory,
            bonuses: &bonuses,
            registry: &registry,
            lobby_spawn: LOBBY_SPAWN,
        };
        let (settings, mode) = SessionSettings::build("duel", &record, arena(), &ctx).unwrap();
        GameSession::new(SessionId(1), settings, mode, host)
    }

    fn running(overrides: serde_json::Value) -> (GameSession, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::new());
        let mut session = session_with(overrides, host.clone());
        session.add_player(PlayerId(1)).unwrap();
        session.add_player(PlayerId(2)).unwrap();
        for _ in 0..TICKS_PER_SECOND {
            session.tick();
        }
        (session, host)
    }

    fn shot(shooter: u64) -> Attacker {
        Attacker::new(PlayerId(shooter), "rocket", 5.0)
    }

    #[test]
    fn test_join_waits_for_more_players() {
        let host = Arc::new(RecordingHost::new());
        let mut session = session_with(serde_json::json!({ "min_players": 2 }), host.clone());

        session.add_player(PlayerId(1)).unwrap();

        assert_eq!(session.phase(), SessionPhase::Waiting);
        assert_eq!(session.waiting_room().reason(), WaitReason::MorePlayers);
        assert_eq!(host.position_of(PlayerId(1)), Some(WAITING));
        let notices = host.notices_for(PlayerId(1));
        assert_eq!(
            notices.last(),
            Some(&Notice::new(MessageKey::MorePlayers).arg(NoticeArg::Count(1)))
        );
    }

    #[test]
    fn test_second_player_starts_game_without_delay() {
        let host = Arc::new(RecordingHost::new());
        let mut session = session_with(serde_json::json!({ "min_players": 2 }), host.clone());
        session.add_player(PlayerId(1)).unwrap();
        session.add_player(PlayerId(2)).unwrap();

        assert_eq!(session.phase(), SessionPhase::Running);
        assert!(session.waiting_room().waiting().is_empty());
        for player in [PlayerId(1), PlayerId(2)] {
            assert_eq!(host.position_of(player), Some(CENTER));
            assert!(host.keys_for(player).contains(&MessageKey::NoWaiting));
            assert!(!session.player(player).unwrap().is_playing());
        }

        for _ in 0..TICKS_PER_SECOND {
            session.tick();
        }
        assert!(session.player(PlayerId(1)).unwrap().is_playing());
    }

    #[test]
    fn test_join_conflicts() {
        let host = Arc::new(RecordingHost::new());
        let mut session = session_with(
            serde_json::json!({ "max_players": 2, "locking": true, "min_players": 3 }),
            host,
        );
        session.add_player(PlayerId(1)).unwrap();
        assert!(matches!(
            session.add_player(PlayerId(1)),
            Err(SessionError::AlreadyInSession(..))
        ));
        session.add_player(PlayerId(2)).unwrap();
        assert!(matches!(session.add_player(PlayerId(3)), Err(SessionError::Full(_))));

        session.start().unwrap();
        session.remove_player(PlayerId(2)).unwrap();
        assert!(matches!(session.add_player(PlayerId(3)), Err(SessionError::Locked(_))));
    }

    #[test]
    fn test_hits_ignored_during_respawn_grace() {
        let host = Arc::new(RecordingHost::new());
        let mut session = session_with(serde_json::json!({}), host);
        session.add_player(PlayerId(1)).unwrap();
        session.add_player(PlayerId(2)).unwrap();
        assert_eq!(session.phase(), SessionPhase::Running);

        assert!(!session.handle_hit(TargetId::Player(PlayerId(2)), shot(1)));
        for _ in 0..TICKS_PER_SECOND {
            session.tick();
        }
        assert!(session.handle_hit(TargetId::Player(PlayerId(2)), shot(1)));
        assert_eq!(session.player(PlayerId(2)).unwrap().hull.health(), 15.0);
    }

    #[test]
    fn test_lethal_damage_after_hit_is_a_kill() {
        let (mut session, host) = running(serde_json::json!({ "respawn_delay": 40 }));
        session.handle_hit(TargetId::Player(PlayerId(2)), shot(1));

        let verdict = session.on_damage(TargetId::Player(PlayerId(2)), DamageCause::Custom, 0.0);

        let DamageVerdict::Killed(event) = verdict else {
            panic!("expected a kill, got {verdict:?}");
        };
        assert_eq!(event.kind, KillKind::Killed);
        assert_eq!(event.killer, Some(PlayerId(1)));
        assert_eq!(host.kill_events(), vec![event]);
        for player in [PlayerId(1), PlayerId(2)] {
            assert!(host.keys_for(player).contains(&MessageKey::Killed));
        }
        assert!(session.waiting_room().contains(PlayerId(2)));
    }

    #[test]
    fn test_fall_after_hit_is_shot_down() {
        let (mut session, _host) = running(serde_json::json!({}));
        session.handle_hit(TargetId::Player(PlayerId(2)), shot(1));

        let verdict = session.on_damage(TargetId::Player(PlayerId(2)), DamageCause::Fall, -3.0);

        assert!(matches!(verdict, DamageVerdict::Killed(e) if e.kind == KillKind::ShotDown));
    }

    #[test]
    fn test_host_health_revives_destroyed_hull() {
        let (mut session, _host) = running(serde_json::json!({}));
        let target = TargetId::Player(PlayerId(2));
        assert!(session.handle_hit(target, Attacker::new(PlayerId(1), "rocket", 25.0)));
        assert!(!session.handle_hit(target, shot(1)));

        assert_eq!(
            session.on_damage(target, DamageCause::Custom, 12.0),
            DamageVerdict::Allowed
        );
        assert!(session.handle_hit(target, shot(1)));
        assert_eq!(session.player(PlayerId(2)).unwrap().hull.health(), 7.0);
    }

    #[test]
    fn test_winning_kill_parks_victim_without_respawn() {
        let (mut session, host) =
            running(serde_json::json!({ "points_to_win": 1, "respawn_delay": 0 }));
        session.handle_hit(TargetId::Player(PlayerId(2)), shot(1));
        host.take_calls();

        let verdict = session.on_damage(TargetId::Player(PlayerId(2)), DamageCause::Custom, 0.0);

        assert!(matches!(verdict, DamageVerdict::Killed(_)));
        assert_eq!(session.phase(), SessionPhase::Ending);
        assert!(!host.keys_for(PlayerId(2)).contains(&MessageKey::NoWaiting));
        let teleports: Vec<_> = host
            .calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::Teleport(PlayerId(2), _)))
            .collect();
        assert_eq!(teleports, vec![HostCall::Teleport(PlayerId(2), WAITING)]);
        assert!(session.waiting_room().contains(PlayerId(2)));
    }

    #[test]
    fn test_damage_gating() {
        let (mut session, _host) = running(serde_json::json!({}));
        let target = TargetId::Player(PlayerId(1));

        assert_eq!(session.on_damage(target, DamageCause::Void, 0.0), DamageVerdict::Suppressed);
        assert_eq!(session.on_damage(target, DamageCause::Fall, 4.0), DamageVerdict::Allowed);
        assert_eq!(
            session.on_damage(TargetId::Player(PlayerId(9)), DamageCause::Fall, 0.0),
            DamageVerdict::Ignored
        );
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn test_click_buys_and_ignores_double_click() {
        let (mut session, host) = running(serde_json::json!({}));
        session.pay(PlayerId(1), 20).unwrap();

        let outcome = session.click(PlayerId(1), Some(SHOP), ClickAction::Left).unwrap();
        assert_eq!(outcome, ClickOutcome::Button { applied: true });
        assert_eq!(
            session.click(PlayerId(1), Some(SHOP), ClickAction::Left).unwrap(),
            ClickOutcome::Ignored
        );
        assert_eq!(session.balance(PlayerId(1)), Some(15));
        assert_eq!(
            session.player(PlayerId(1)).unwrap().loadout.current().amount_of("rockets"),
            4
        );
        assert!(host.keys_for(PlayerId(1)).contains(&MessageKey::ItemsAdded));

        session.tick();
        let outcome = session.click(PlayerId(1), Some(SHOP), ClickAction::Right).unwrap();
        assert_eq!(outcome, ClickOutcome::Button { applied: false });
        assert!(host.keys_for(PlayerId(1)).contains(&MessageKey::CantDo));
    }

    #[test]
    fn test_click_leave_block_and_air() {
        let (mut session, _host) = running(serde_json::json!({}));
        assert_eq!(
            session.click(PlayerId(1), None, ClickAction::Left).unwrap(),
            ClickOutcome::Nothing
        );
        assert_eq!(
            session
                .click(PlayerId(1), Some(Location::new(5.7, 64.2, 5.1)), ClickAction::Left)
                .unwrap(),
            ClickOutcome::Leave
        );
        assert!(matches!(
            session.click(PlayerId(7), Some(EXIT), ClickAction::Left),
            Err(SessionError::NotInSession(..))
        ));
    }

    #[test]
    fn test_time_limit_ends_game_then_tears_down() {
        let (mut session, host) = running(serde_json::json!({ "max_time": 2 }));
        assert_eq!(session.time_left(), u64::from(TICKS_PER_SECOND));

        for _ in 0..TICKS_PER_SECOND {
            session.tick();
        }
        assert_eq!(session.phase(), SessionPhase::Ending);
        assert_eq!(session.waiting_room().reason(), WaitReason::GameEnds);
        assert!(host.keys_for(PlayerId(1)).contains(&MessageKey::GameEnds));
        assert!(matches!(session.add_player(PlayerId(3)), Err(SessionError::InvalidState(_))));

        for _ in 0..crate::config::DEFAULT_TEARDOWN_TICKS {
            session.tick();
        }
        assert_eq!(session.phase(), SessionPhase::Stopped);
        assert!(session.player_ids().is_empty());
        assert_eq!(host.position_of(PlayerId(1)), Some(LOBBY_SPAWN));
    }

    #[test]
    fn test_leaving_the_square_is_lethal() {
        let (mut session, host) = running(serde_json::json!({ "respawn_delay": 40 }));
        host.set_position(PlayerId(2), Location::new(45.0, 64.0, 0.0));

        session.tick();

        assert!(host.calls().contains(&HostCall::Kill(PlayerId(2))));
        assert!(session.waiting_room().contains(PlayerId(2)));
        assert_eq!(host.kill_events()[0].kind, KillKind::Suicide);
    }

    #[test]
    fn test_height_limit_damages_every_second() {
        let (mut session, host) =
            running(serde_json::json!({ "height_limit": 80, "height_damage": 2.0 }));
        host.set_position(PlayerId(1), Location::new(0.0, 90.0, 0.0));
        host.take_calls();

        for _ in 0..TICKS_PER_SECOND {
            session.tick();
        }
        let damage: Vec<_> = host
            .calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::Damage(..)))
            .collect();
        assert_eq!(damage, vec![HostCall::Damage(PlayerId(1), 2.0)]);
    }

    #[test]
    fn test_bonus_is_collected_once_per_respawn() {
        let (mut session, host) = running(serde_json::json!({ "bonuses": ["ammo"] }));
        let pad = Location::new(0.0, 64.5, 20.0);
        host.set_position(PlayerId(1), pad);
        host.set_position(PlayerId(2), pad);

        session.tick();

        let collected: Vec<PlayerId> = [PlayerId(1), PlayerId(2)]
            .into_iter()
            .filter(|p| host.keys_for(*p).contains(&MessageKey::BonusCollected))
            .collect();
        assert_eq!(collected, vec![PlayerId(1)]);
        assert_eq!(
            session.player(PlayerId(1)).unwrap().loadout.current().amount_of("rockets"),
            4
        );
    }

    #[test]
    fn test_hit_payouts_follow_attitude() {
        let (mut session, _host) = running(serde_json::json!({
            "money": { "enabled": true, "enemy_hit": 3, "by_enemy_hit": -1 }
        }));
        session.pay(PlayerId(2), 5).unwrap();

        session.handle_hit(TargetId::Player(PlayerId(2)), shot(1));

        assert_eq!(session.balance(PlayerId(1)), Some(3));
        assert_eq!(session.balance(PlayerId(2)), Some(4));
    }

    #[test]
    fn test_last_player_leaving_stops_session() {
        let host = Arc::new(RecordingHost::new());
        let mut session = session_with(serde_json::json!({ "min_players": 2 }), host.clone());
        session.add_player(PlayerId(1)).unwrap();

        session.remove_player(PlayerId(1)).unwrap();

        assert_eq!(session.phase(), SessionPhase::Stopped);
        assert_eq!(host.position_of(PlayerId(1)), Some(LOBBY_SPAWN));
        assert!(matches!(
            session.remove_player(PlayerId(1)),
            Err(SessionError::NotInSession(..))
        ));
    }
}

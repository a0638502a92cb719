//! Session actor: an isolated Tokio task that owns one [`GameSession`].
//!
//! Commands from the lobby and the host arrive through an mpsc channel
//! and are interleaved with simulation ticks on the same task, so the
//! session never needs a lock.

use skirmish_combat::{Attacker, DamageCause, Target};
use skirmish_loadout::Intent;
use skirmish_tick::{TickConfig, TickScheduler};
use skirmish_types::{ButtonId, EntityId, Location, PlayerId, SessionId};
use tokio::sync::{mpsc, oneshot};

use crate::config::SessionPhase;
use crate::session::{
    ClickAction, ClickOutcome, DamageVerdict, GameSession, SessionInfo, TargetId,
};
use crate::SessionError;

/// Commands sent to a session actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect a reply.
pub(crate) enum SessionCommand {
    Join {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Click {
        player: PlayerId,
        block: Option<Location>,
        action: ClickAction,
        reply: oneshot::Sender<Result<ClickOutcome, SessionError>>,
    },
    ApplyButton {
        player: PlayerId,
        button: ButtonId,
        intent: Intent,
        notify: bool,
        reply: oneshot::Sender<Result<bool, SessionError>>,
    },
    Hit {
        target: TargetId,
        attacker: Attacker,
        reply: oneshot::Sender<bool>,
    },
    Damage {
        target: TargetId,
        cause: DamageCause,
        remaining_health: f64,
        reply: oneshot::Sender<DamageVerdict>,
    },
    RegisterTarget {
        id: EntityId,
        target: Box<dyn Target>,
    },
    UnregisterTarget {
        id: EntityId,
    },
    Pay {
        player: PlayerId,
        delta: i64,
        reply: oneshot::Sender<Result<u64, SessionError>>,
    },
    Start {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    EndGame {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    GetInfo {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown,
}

/// Handle to a running session actor.
///
/// Cheap to clone. Every method fails with [`SessionError::Unavailable`]
/// once the actor has stopped.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    async fn request<T>(
        &self,
        cmd: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(cmd(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    pub async fn join(&self, player: PlayerId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Join { player, reply })
            .await?
    }

    pub async fn leave(&self, player: PlayerId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Leave { player, reply })
            .await?
    }

    pub async fn click(
        &self,
        player: PlayerId,
        block: Option<Location>,
        action: ClickAction,
    ) -> Result<ClickOutcome, SessionError> {
        self.request(|reply| SessionCommand::Click {
            player,
            block,
            action,
            reply,
        })
        .await?
    }

    pub async fn apply_button(
        &self,
        player: PlayerId,
        button: ButtonId,
        intent: Intent,
        notify: bool,
    ) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::ApplyButton {
            player,
            button,
            intent,
            notify,
            reply,
        })
        .await?
    }

    pub async fn hit(&self, target: TargetId, attacker: Attacker) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::Hit {
            target,
            attacker,
            reply,
        })
        .await
    }

    pub async fn damage(
        &self,
        target: TargetId,
        cause: DamageCause,
        remaining_health: f64,
    ) -> Result<DamageVerdict, SessionError> {
        self.request(|reply| SessionCommand::Damage {
            target,
            cause,
            remaining_health,
            reply,
        })
        .await
    }

    /// Registers a non-player target (fire-and-forget).
    pub async fn register_target(
        &self,
        id: EntityId,
        target: Box<dyn Target>,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::RegisterTarget { id, target }).await
    }

    pub async fn unregister_target(&self, id: EntityId) -> Result<(), SessionError> {
        self.send(SessionCommand::UnregisterTarget { id }).await
    }

    pub async fn pay(&self, player: PlayerId, delta: i64) -> Result<u64, SessionError> {
        self.request(|reply| SessionCommand::Pay {
            player,
            delta,
            reply,
        })
        .await?
    }

    pub async fn start(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Start { reply }).await?
    }

    pub async fn end_game(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::EndGame { reply })
            .await?
    }

    pub async fn get_info(&self) -> Result<SessionInfo, SessionError> {
        self.request(|reply| SessionCommand::GetInfo { reply })
            .await
    }

    /// Stops the session and its actor.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct SessionActor {
    session: GameSession,
    scheduler: TickScheduler,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        let session_id = self.session.id();
        tracing::info!(%session_id, "session actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!(%session_id, "all handles dropped");
                        self.session.stop();
                        break;
                    };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                _ = self.scheduler.wait_for_tick() => {
                    self.session.tick();
                    self.scheduler.record_tick_end();
                }
            }
            if self.session.phase() == SessionPhase::Stopped {
                break;
            }
        }

        tracing::info!(%session_id, ticks = self.scheduler.tick_count(), "session actor stopped");
    }

    /// Returns `false` when the actor should exit.
    fn handle(&mut self, cmd: SessionCommand) -> bool {
        let session = &mut self.session;
        match cmd {
            SessionCommand::Join { player, reply } => {
                let _ = reply.send(session.add_player(player));
            }
            SessionCommand::Leave { player, reply } => {
                let _ = reply.send(session.remove_player(player));
            }
            SessionCommand::Click {
                player,
                block,
                action,
                reply,
            } => {
                let _ = reply.send(session.click(player, block, action));
            }
            SessionCommand::ApplyButton {
                player,
                button,
                intent,
                notify,
                reply,
            } => {
                let _ = reply.send(session.apply_button(player, &button, intent, notify));
            }
            SessionCommand::Hit {
                target,
                attacker,
                reply,
            } => {
                let _ = reply.send(session.handle_hit(target, attacker));
            }
            SessionCommand::Damage {
                target,
                cause,
                remaining_health,
                reply,
            } => {
                let _ = reply.send(session.on_damage(target, cause, remaining_health));
            }
            SessionCommand::RegisterTarget { id, target } => {
                session.register_target(id, target);
            }
            SessionCommand::UnregisterTarget { id } => {
                session.unregister_target(id);
            }
            SessionCommand::Pay {
                player,
                delta,
                reply,
            } => {
                let _ = reply.send(session.pay(player, delta));
            }
            SessionCommand::Start { reply } => {
                let _ = reply.send(session.start());
            }
            SessionCommand::EndGame { reply } => {
                let _ = reply.send(session.end_game());
            }
            SessionCommand::GetInfo { reply } => {
                let _ = reply.send(session.info());
            }
            SessionCommand::Shutdown => {
                tracing::info!(session_id = %session.id(), "session shutting down");
                session.stop();
                return false;
            }
        }
        true
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_session(
    session: GameSession,
    tick_config: TickConfig,
    channel_size: usize,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let session_id = session.id();

    let actor = SessionActor {
        session,
        scheduler: TickScheduler::new(tick_config),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}

//! Error types for the session layer.

use skirmish_types::{ButtonId, ConfigurationError, PlayerId, SessionId};

/// Runtime conflicts. Returning one of these never changes session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session does not exist (or has already been torn down).
    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("player {0} already in session {1}")]
    AlreadyInSession(PlayerId, SessionId),

    #[error("player {0} not in session {1}")]
    NotInSession(PlayerId, SessionId),

    /// The lobby has no live session for this player.
    #[error("player {0} is not in any session")]
    NoSession(PlayerId),

    /// The session started with `locking` enabled and takes no new players.
    #[error("session {0} is locked")]
    Locked(SessionId),

    #[error("session {0} is full")]
    Full(SessionId),

    /// The session is in a phase that does not allow this operation.
    #[error("invalid session state for this operation: {0}")]
    InvalidState(String),

    /// The session's command channel is full or closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),

    #[error("button '{0}' does not exist")]
    UnknownButton(ButtonId),

    /// The lobby offers no game with this name.
    #[error("game '{0}' is not offered by this lobby")]
    UnknownGame(String),

    /// A session could not be built (for example, no free arena).
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

//! Unified error type for Skirmish.

use std::path::PathBuf;

use skirmish_session::SessionError;
use skirmish_types::ConfigurationError;

/// Top-level error that wraps the errors of every layer.
///
/// Sub-crate errors convert through `?`; record-file failures carry the
/// path of the file that could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A record failed validation.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A runtime conflict inside a session or the lobby.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No lobby with this name in the catalog.
    #[error("lobby '{0}' is not defined")]
    UnknownLobby(String),
}

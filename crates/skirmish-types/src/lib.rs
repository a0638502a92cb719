//! Shared vocabulary for Skirmish.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - **Identity** ([`PlayerId`], [`SessionId`], [`EntityId`], [`ButtonId`],
//!   [`TeamId`]) — who and what the engine is talking about.
//! - **Space** ([`Location`]) — positions handed to and from the host.
//! - **Messages** ([`Notice`], [`MessageKey`], [`Recipient`]) — localized,
//!   best-effort notifications the engine asks the host to deliver.
//! - **Errors** ([`ConfigurationError`], [`Violations`]) — load-time
//!   failures naming the record that failed.
//!
//! # Architecture
//!
//! ```text
//! Session (orchestration) → Loadout / Combat (rules) → Types (this crate)
//! ```

mod error;
mod notice;
mod types;

pub use error::{ConfigurationError, Violations};
pub use notice::{MessageKey, Notice, NoticeArg};
pub use types::{
    ButtonId, EntityId, Location, PlayerId, Recipient, SessionId, TeamId,
};

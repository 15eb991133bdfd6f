//! Core domain for triggering CI verification of a Git ref.
//!
//! This crate decides *what* is sent to the CI server and *what* is recorded
//! on the commit afterwards. Infrastructure crates implement the port traits
//! defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! The HTTP call lives in `jenkins`, the note storage in `notes`.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryName`, `CommitSha`, etc.) |
//! | [`types`] | Value types (`BuildStatus`, `TicketMetadata`, `CredentialConfig`, etc.) |
//! | [`config`] | Validated per-repository CI configuration |
//! | [`query`] | Canonical notify-commit query encoding |
//! | [`note`] | Build note value, builder and parser |
//! | [`refs`] | Ticket ref-name parsing |
//! | [`ports`] | `CiInvoker`, `NoteStore`, `TicketDirectory` |
//! | [`trigger`] | The trigger lifecycle (`Verification`) |
//! | [`errors`] | Domain error type |

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod note;
pub mod ports;
pub mod query;
pub mod refs;
pub mod trigger;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{RepositoryCiConfig, NOTIFY_COMMIT_PATH};
pub use errors::VerificationError;
pub use identifiers::{CommitSha, JobName, RefName, RepositoryName, TicketId, TriggerId, UserName};
pub use note::{BuildNote, BuildNoteBuilder};
pub use ports::{
    CiInvoker, InvocationOutcome, NoteStore, NoteStoreError, TicketDirectory, HTTP_OK,
};
pub use query::QueryParameters;
pub use trigger::{resolve_ticket, TriggerOutcome, TriggerRequest, Verification};
pub use types::{
    BuildStatus, CredentialConfig, TicketMetadata, TicketPriority, TicketType, Timestamp,
    TriggerContext,
};

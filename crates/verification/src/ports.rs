//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`CiInvoker`] | `jenkins::JenkinsClient` |
//! | [`NoteStore`] | `notes::GitNotesStore`, `notes::InMemoryNoteStore` |
//! | [`TicketDirectory`] | the composition root |

use async_trait::async_trait;
use thiserror::Error;

use crate::{CommitSha, CredentialConfig, RepositoryName, TicketId, TicketMetadata};

// ---------------------------------------------------------------------------
// CI invocation
// ---------------------------------------------------------------------------

/// HTTP status that counts as an accepted trigger.
pub const HTTP_OK: u16 = 200;

/// Result of one notify-commit call.
///
/// The invoker never returns an error: either the server answered with a
/// status, or the exchange could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The server answered with an HTTP status.
    Responded {
        /// HTTP status code.
        status: u16,
    },
    /// No HTTP status was obtained (connection refused, timeout, malformed
    /// response, invalid URL).
    TransportFailure {
        /// Human-readable cause, for logs only.
        reason: String,
    },
}

impl InvocationOutcome {
    /// Status code reported for a transport failure.
    pub const SENTINEL_STATUS: u16 = 0;

    /// Returns the HTTP status, or [`Self::SENTINEL_STATUS`] for a transport failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Responded { status } => *status,
            Self::TransportFailure { .. } => Self::SENTINEL_STATUS,
        }
    }

    /// Returns `true` only for HTTP 200.
    pub fn is_accepted(&self) -> bool {
        self.status_code() == HTTP_OK
    }
}

/// Issues the single GET that triggers a CI job.
#[async_trait]
pub trait CiInvoker: Send + Sync {
    /// Sends one GET to `endpoint`.
    ///
    /// When `credentials` is `Some` and configured, basic authentication is
    /// sent on the first request, scoped to the endpoint's host and port.
    /// Implementations must not retry.
    async fn invoke(
        &self,
        endpoint: &str,
        credentials: Option<&CredentialConfig>,
    ) -> InvocationOutcome;
}

// ---------------------------------------------------------------------------
// Commit notes
// ---------------------------------------------------------------------------

/// Failures of a [`NoteStore`].
#[derive(Debug, Error)]
pub enum NoteStoreError {
    /// The commit does not exist in the repository.
    #[error("Commit not found: {0}")]
    CommitNotFound(CommitSha),

    /// The store refused or failed the write.
    #[error("Note store write failed: {0}")]
    WriteFailed(String),

    /// The store could not be read.
    #[error("Note store read failed: {0}")]
    ReadFailed(String),
}

/// Append-only note storage keyed by commit.
///
/// Implementations serialise concurrent appends to the same commit; notes are
/// never rewritten once stored.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Appends `text` to the note of `commit`, creating the note if needed.
    async fn append_note(&self, commit: &CommitSha, text: &str) -> Result<(), NoteStoreError>;

    /// Returns the full note text of `commit`, or `None` if it has no note.
    async fn read_note(&self, commit: &CommitSha) -> Result<Option<String>, NoteStoreError>;
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Resolves ticket ids to the metadata forwarded to the CI job.
#[async_trait]
pub trait TicketDirectory: Send + Sync {
    /// Returns the ticket, or `None` if the repository has no such ticket.
    async fn find_ticket(
        &self,
        repository: &RepositoryName,
        id: TicketId,
    ) -> Option<TicketMetadata>;
}

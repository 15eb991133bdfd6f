//! Trigger lifecycle: encode, invoke, record.
//!
//! A trigger is a two-state machine, `Idle → Triggered`, with no retry:
//!
//! 1. encode the parameters of the [`TriggerRequest`];
//! 2. build `{ci_url}/gitblit/notifyCommit?{query}`;
//! 3. invoke the CI server once;
//! 4. on HTTP 200 only, append a [`BuildNote`] to the commit.
//!
//! A note is a durable claim that the CI server acknowledged the trigger, so
//! nothing is written for any other status or for a transport failure.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::ports::{CiInvoker, InvocationOutcome, NoteStore, TicketDirectory};
use crate::{
    query, refs, BuildNote, BuildStatus, CommitSha, RefName, RepositoryCiConfig, TicketMetadata,
    Timestamp, TriggerContext, TriggerId, UserName,
};

/// Caller-supplied inputs of one trigger attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    /// Ref to build.
    pub target_ref: RefName,
    /// Tip commit of `target_ref`; receives the note.
    pub last_commit: CommitSha,
    /// User on whose behalf the build runs.
    pub acting_user: Option<UserName>,
    /// Ticket the ref belongs to, if any.
    pub ticket: Option<TicketMetadata>,
    /// `true` when re-triggering a build that was already started.
    pub restart: bool,
}

/// How a trigger attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The CI server accepted the trigger and the note was stored.
    Recorded {
        /// The stored note.
        note: BuildNote,
    },
    /// The CI server did not answer with HTTP 200. `status` is `0` when no
    /// HTTP status was obtained.
    NotAccepted {
        /// HTTP status or the sentinel `0`.
        status: u16,
    },
    /// The CI server accepted the trigger but the note store refused the write.
    NoteRejected {
        /// The note that could not be stored.
        note: BuildNote,
        /// Store error, for logs.
        reason: String,
    },
}

impl TriggerOutcome {
    /// Returns `true` only when the trigger was accepted and recorded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Triggers CI verification for one repository.
///
/// Holds only read-only configuration and shared port handles, so one instance
/// may serve any number of concurrent triggers.
#[derive(Clone)]
pub struct Verification {
    config: RepositoryCiConfig,
    invoker: Arc<dyn CiInvoker>,
    notes: Arc<dyn NoteStore>,
}

impl Verification {
    /// Creates a trigger for the repository described by `config`.
    pub fn new(
        config: RepositoryCiConfig,
        invoker: Arc<dyn CiInvoker>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        Self {
            config,
            invoker,
            notes,
        }
    }

    /// Repository configuration in use.
    pub fn config(&self) -> &RepositoryCiConfig {
        &self.config
    }

    /// Builds the immutable context sent to the CI server.
    pub fn context(&self, request: &TriggerRequest) -> TriggerContext {
        TriggerContext {
            repository: self.config.name().clone(),
            job: self.config.job().clone(),
            target_ref: request.target_ref.clone(),
            last_commit: request.last_commit.clone(),
            acting_user: request.acting_user.clone(),
        }
    }

    /// Full notify-commit URL for `request`.
    pub fn endpoint(&self, request: &TriggerRequest) -> String {
        let query = query::encode(&self.context(request), request.ticket.as_ref());
        self.config.notify_commit_url(&query)
    }

    /// Runs one trigger attempt.
    #[instrument(
        skip_all,
        fields(
            trigger_id = %TriggerId::new_random(),
            repository = %self.config.name(),
            target_ref = %request.target_ref,
            commit = %request.last_commit,
            restart = request.restart,
        )
    )]
    pub async fn start(&self, request: &TriggerRequest) -> TriggerOutcome {
        let endpoint = self.endpoint(request);
        let outcome = self
            .invoker
            .invoke(&endpoint, self.config.credentials())
            .await;

        if !outcome.is_accepted() {
            let status = outcome.status_code();
            match &outcome {
                InvocationOutcome::TransportFailure { reason } => {
                    warn!(%reason, "CI server unreachable; no build note written");
                }
                InvocationOutcome::Responded { .. } => {
                    warn!(status, "CI server did not accept the trigger; no build note written");
                }
            }
            return TriggerOutcome::NotAccepted { status };
        }

        let note = BuildNote::new(
            Timestamp::now(),
            BuildStatus::for_trigger(request.restart),
            endpoint,
        );
        match self
            .notes
            .append_note(&request.last_commit, &note.to_note_text())
            .await
        {
            Ok(()) => {
                info!(status = %note.status(), "CI job triggered and build note recorded");
                TriggerOutcome::Recorded { note }
            }
            Err(e) => {
                warn!(error = %e, "CI job triggered but the build note was not stored");
                TriggerOutcome::NoteRejected {
                    note,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Runs one trigger attempt and reports the binary result.
    pub async fn start_verification(&self, request: &TriggerRequest) -> bool {
        self.start(request).await.is_success()
    }
}

impl std::fmt::Debug for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verification")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Looks up the ticket `target_ref` belongs to, if it belongs to one.
pub async fn resolve_ticket(
    directory: &dyn TicketDirectory,
    config: &RepositoryCiConfig,
    target_ref: &RefName,
) -> Option<TicketMetadata> {
    let id = refs::ticket_id(target_ref.as_str())?;
    directory.find_ticket(config.name(), id).await
}

//! Shared value types for the verification domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values that participate in encoding decisions: enums with a fixed wire
//! spelling, optional ticket fields, and credentials whose presence switches
//! authentication on or off.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CommitSha, JobName, RefName, RepositoryName, UserName, VerificationError};

// ---------------------------------------------------------------------------
// Build status
// ---------------------------------------------------------------------------

/// Lifecycle classification of a CI build as recorded in a commit note.
///
/// A trigger only ever writes [`BuildStatus::NotStartedYet`] or
/// [`BuildStatus::Restarted`]; the remaining states are written by whatever
/// later observes the build. Values this crate does not know are kept
/// verbatim in [`BuildStatus::Other`] so readers never lose information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuildStatus {
    /// The build was requested for the first time and has not started.
    NotStartedYet,
    /// A previously started build was explicitly requested again.
    Restarted,
    /// The CI server reports the build as running.
    InProgress,
    /// The build finished successfully.
    Success,
    /// The build finished with test failures or warnings.
    Unstable,
    /// The build failed.
    Failed,
    /// The build was cancelled before completion.
    Aborted,
    /// A status written by a newer or foreign writer.
    Other(String),
}

impl BuildStatus {
    /// Returns the status a trigger records for the given restart flag.
    pub fn for_trigger(restart: bool) -> Self {
        if restart {
            Self::Restarted
        } else {
            Self::NotStartedYet
        }
    }

    /// Returns the wire spelling of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStartedYet => "not_started_yet",
            Self::Restarted => "restarted",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Unstable => "unstable",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Other(value) => value,
        }
    }

    /// Parses a wire spelling. Never fails: unknown values become [`BuildStatus::Other`].
    pub fn parse(value: &str) -> Self {
        match value {
            "not_started_yet" => Self::NotStartedYet,
            "restarted" => Self::Restarted,
            "in_progress" => Self::InProgress,
            "success" => Self::Success,
            "unstable" => Self::Unstable,
            "failed" => Self::Failed,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Kind of work a ticket describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Enhancement,
    Task,
    Bug,
    Proposal,
    Question,
    Maintenance,
}

impl TicketType {
    /// Returns the lower-case wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enhancement => "enhancement",
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Proposal => "proposal",
            Self::Question => "question",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enhancement" => Ok(Self::Enhancement),
            "task" => Ok(Self::Task),
            "bug" => Ok(Self::Bug),
            "proposal" => Ok(Self::Proposal),
            "question" => Ok(Self::Question),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(VerificationError::UnknownTicketValue {
                field: "type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Urgency of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Urgent,
    High,
    Normal,
    Low,
}

impl TicketPriority {
    /// Returns the lower-case wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            _ => Err(VerificationError::UnknownTicketValue {
                field: "priority",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Ticket fields forwarded to the CI job when the triggered ref belongs to a ticket.
///
/// `title` and `topic` are optional in the tracker; an absent value is sent as
/// the literal `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMetadata {
    /// Ticket title.
    pub title: Option<String>,
    /// Free-form topic (often unset).
    pub topic: Option<String>,
    /// Kind of ticket.
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Ticket priority.
    pub priority: TicketPriority,
}

// ---------------------------------------------------------------------------
// Trigger inputs
// ---------------------------------------------------------------------------

/// Everything the CI server is told about one trigger attempt.
///
/// Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    /// Repository as known to the CI server.
    pub repository: RepositoryName,
    /// Job to run.
    pub job: JobName,
    /// Ref to build; sent as `branch`.
    pub target_ref: RefName,
    /// Tip commit of `target_ref`. Also the key of the note written on success.
    pub last_commit: CommitSha,
    /// User triggering the build. `None` for anonymous sessions.
    pub acting_user: Option<UserName>,
}

// ---------------------------------------------------------------------------

/// Credentials for the CI server's basic authentication.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Account name; blank means "no authentication".
    pub username: String,
    /// API token used as the basic-auth password.
    pub secret_token: String,
}

impl CredentialConfig {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, secret_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret_token: secret_token.into(),
        }
    }

    /// Returns `true` if the username is non-empty after trimming whitespace.
    pub fn is_configured(&self) -> bool {
        !self.username.trim().is_empty()
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("username", &self.username)
            .field("secret_token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 timestamp, normalising it to UTC.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

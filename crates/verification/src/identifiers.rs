//! Newtype domain identifiers.
//!
//! Every name that travels to the CI server or into a commit note is wrapped in
//! a distinct newtype. This keeps a [`JobName`] from being passed where a
//! [`RepositoryName`] is expected even though both are strings on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: ticket-tracker integers
// ---------------------------------------------------------------------------

/// Identifies a ticket in the repository's ticket tracker.
///
/// Ticket ids are positive integers embedded in ticket ref names, see
/// [`crate::refs::ticket_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(u64);

impl TicketId {
    /// Creates a new identifier, returning `None` for zero.
    pub fn new(value: u64) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single trigger attempt.
///
/// Generated fresh for every call to [`crate::Verification::start`] and
/// recorded on its tracing span so the request and the note write can be
/// correlated in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(Uuid);

impl TriggerId {
    /// Generates a new random trigger identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (configuration / Git names)
// ---------------------------------------------------------------------------

string_id! {
    /// The name of a hosted repository as known to the CI server
    /// (e.g. `"project/app.git"`).
    RepositoryName
}

string_id! {
    /// The name of the CI job that verifies a repository.
    JobName
}

string_id! {
    /// A fully qualified Git ref name (e.g. `"refs/heads/main"`).
    RefName
}

string_id! {
    /// A Git commit SHA, full or abbreviated.
    CommitSha
}

string_id! {
    /// The login of the user on whose behalf a build is triggered.
    UserName
}

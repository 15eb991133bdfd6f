//! Top-level error type for the verification domain.
//!
//! [`VerificationError`] covers programmer and configuration errors only.
//! Outcomes of the CI call itself are *values*, not errors: a transport
//! failure is an [`crate::InvocationOutcome::TransportFailure`], and a rejected
//! trigger is a [`crate::TriggerOutcome`]. Store-level failures are defined
//! with the store port in [`crate::ports`].

use thiserror::Error;

/// Errors raised while configuring a trigger or handling a build note.
///
/// None of these are retried; each describes input that must be fixed by
/// whoever supplied it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The repository's CI configuration is invalid.
    ///
    /// Produced at load time; a trigger never starts with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// A build note was finalised before every mandatory field was set.
    ///
    /// This is a contract violation by the caller of
    /// [`crate::BuildNoteBuilder::build`].
    #[error("Build note is missing mandatory field '{field}'")]
    IncompleteNote {
        /// Wire key of the missing field.
        field: &'static str,
    },

    /// Note text could not be read back as a build note.
    #[error("Malformed build note: {message}")]
    MalformedNote {
        /// Description of the first problem found.
        message: String,
    },

    /// A ticket type or priority string is not one of the known values.
    #[error("Unknown ticket {field} '{value}'")]
    UnknownTicketValue {
        /// Which ticket attribute was being parsed.
        field: &'static str,
        /// The rejected input.
        value: String,
    },
}

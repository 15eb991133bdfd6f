//! Commit-note storage adapters.
//!
//! Implements the [`verification::NoteStore`] trait twice:
//!
//! - [`GitNotesStore`]: appends to a notes ref of a local repository via the
//!   `git notes` command (default ref `refs/notes/commits`);
//! - [`InMemoryNoteStore`]: process-local storage for tests and dry runs.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning, ref names and git identity handling
//! live here. The [`verification`] crate sees only [`verification::NoteStore`].
//!
//! Both stores are append-only: nothing in this crate rewrites or removes a
//! note once written.

pub mod git;
pub mod memory;

pub use git::{GitNotesStore, NoteAuthor, DEFAULT_NOTES_REF};
pub use memory::InMemoryNoteStore;

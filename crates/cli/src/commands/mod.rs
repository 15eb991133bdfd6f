//! Subcommand handlers. Each returns `Ok(true)` on success, `Ok(false)` on a
//! reported failure, and `Err` for usage or configuration errors.

pub mod show_notes;
pub mod trigger;

use notes::{GitNotesStore, NoteAuthor};

use crate::config::{CliConfig, RepositorySettings};

/// Git-notes store for a configured repository.
fn git_notes_store(settings: &RepositorySettings, config: &CliConfig) -> GitNotesStore {
    let store = GitNotesStore::new(settings.path.clone()).with_notes_ref(&config.notes_ref);
    match &config.note_author {
        Some(author) => store.with_author(NoteAuthor {
            name: author.name.clone(),
            email: author.email.clone(),
        }),
        None => store,
    }
}

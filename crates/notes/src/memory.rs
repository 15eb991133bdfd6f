//! In-memory note store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use verification::{CommitSha, NoteStore, NoteStoreError};

/// Keeps notes in process memory, one list of appended blocks per commit.
///
/// Reads join the blocks with a blank line, matching what `git notes append`
/// produces. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNoteStore {
    notes: Arc<RwLock<HashMap<CommitSha, Vec<String>>>>,
}

impl InMemoryNoteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the blocks appended to `commit`, oldest first.
    pub async fn blocks(&self, commit: &CommitSha) -> Vec<String> {
        self.notes
            .read()
            .await
            .get(commit)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of appended blocks across all commits.
    pub async fn len(&self) -> usize {
        self.notes.read().await.values().map(Vec::len).sum()
    }

    /// True when no block has been appended yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn append_note(&self, commit: &CommitSha, text: &str) -> Result<(), NoteStoreError> {
        self.notes
            .write()
            .await
            .entry(commit.clone())
            .or_default()
            .push(text.trim_end().to_string());
        Ok(())
    }

    async fn read_note(&self, commit: &CommitSha) -> Result<Option<String>, NoteStoreError> {
        Ok(self
            .notes
            .read()
            .await
            .get(commit)
            .map(|blocks| blocks.join("\n\n")))
    }
}

//! Git-backed note store using the `git notes` plumbing.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use verification::{CommitSha, NoteStore, NoteStoreError};

/// Notes ref used by `git log --notes` when nothing else is configured.
pub const DEFAULT_NOTES_REF: &str = "refs/notes/commits";

/// Identity recorded on the notes-ref commits this store creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAuthor {
    /// Author and committer name.
    pub name: String,
    /// Author and committer e-mail.
    pub email: String,
}

/// Stores notes in a local Git repository by shelling out to `git`.
///
/// Appends to the same store are serialised so two triggers never race on
/// the notes ref lock.
#[derive(Debug)]
pub struct GitNotesStore {
    repository: PathBuf,
    notes_ref: String,
    author: Option<NoteAuthor>,
    write_lock: Mutex<()>,
}

impl GitNotesStore {
    /// Creates a store for the repository (work tree or bare) at `repository`.
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            notes_ref: DEFAULT_NOTES_REF.to_string(),
            author: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Uses `notes_ref` instead of [`DEFAULT_NOTES_REF`].
    pub fn with_notes_ref(mut self, notes_ref: impl Into<String>) -> Self {
        self.notes_ref = notes_ref.into();
        self
    }

    /// Records `author` on note commits instead of the repository's configured identity.
    pub fn with_author(mut self, author: NoteAuthor) -> Self {
        self.author = Some(author);
        self
    }

    /// Repository path.
    pub fn repository(&self) -> &Path {
        &self.repository
    }

    /// Notes ref in use.
    pub fn notes_ref(&self) -> &str {
        &self.notes_ref
    }

    async fn git(&self, args: &[&str]) -> std::io::Result<Output> {
        let mut command = Command::new("git");
        command.arg("-C").arg(&self.repository).args(args);
        if let Some(author) = &self.author {
            command
                .env("GIT_AUTHOR_NAME", &author.name)
                .env("GIT_AUTHOR_EMAIL", &author.email)
                .env("GIT_COMMITTER_NAME", &author.name)
                .env("GIT_COMMITTER_EMAIL", &author.email);
        }
        command.kill_on_drop(true).output().await
    }

    async fn commit_exists(&self, commit: &CommitSha) -> Result<bool, std::io::Error> {
        let spec = format!("{}^{{commit}}", commit.as_str());
        let output = self
            .git(&["rev-parse", "--verify", "--quiet", &spec])
            .await?;
        Ok(output.status.success())
    }
}

#[async_trait]
impl NoteStore for GitNotesStore {
    #[instrument(skip(self, text), fields(notes_ref = %self.notes_ref))]
    async fn append_note(&self, commit: &CommitSha, text: &str) -> Result<(), NoteStoreError> {
        let _guard = self.write_lock.lock().await;

        let exists = self
            .commit_exists(commit)
            .await
            .map_err(|e| NoteStoreError::WriteFailed(format!("could not run git: {e}")))?;
        if !exists {
            return Err(NoteStoreError::CommitNotFound(commit.clone()));
        }

        let notes_ref = format!("--ref={}", self.notes_ref);
        let output = self
            .git(&["notes", &notes_ref, "append", "-m", text, commit.as_str()])
            .await
            .map_err(|e| NoteStoreError::WriteFailed(format!("could not run git: {e}")))?;
        if !output.status.success() {
            return Err(NoteStoreError::WriteFailed(stderr_of(&output)));
        }

        debug!("Appended note");
        Ok(())
    }

    #[instrument(skip(self), fields(notes_ref = %self.notes_ref))]
    async fn read_note(&self, commit: &CommitSha) -> Result<Option<String>, NoteStoreError> {
        let read_failed =
            |e: std::io::Error| NoteStoreError::ReadFailed(format!("could not run git: {e}"));

        if !self.commit_exists(commit).await.map_err(read_failed)? {
            return Err(NoteStoreError::CommitNotFound(commit.clone()));
        }

        let notes_ref = format!("--ref={}", self.notes_ref);
        let listed = self
            .git(&["notes", &notes_ref, "list", commit.as_str()])
            .await
            .map_err(read_failed)?;
        if !listed.status.success() {
            // `git notes list <commit>` exits non-zero when the commit has no note.
            return Ok(None);
        }

        let output = self
            .git(&["notes", &notes_ref, "show", commit.as_str()])
            .await
            .map_err(read_failed)?;
        if !output.status.success() {
            return Err(NoteStoreError::ReadFailed(stderr_of(&output)));
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("git exited with {}", output.status)
    } else {
        stderr
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command as StdCommand;

    use super::*;
    use verification::{BuildNote, BuildStatus, Timestamp};

    fn git_available() -> bool {
        StdCommand::new("git").arg("--version").output().is_ok()
    }

    fn run(dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(args)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?} failed: {output:?}");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    fn repository_with_commit() -> (tempfile::TempDir, CommitSha) {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["init", "-q"]);
        run(dir.path(), &["commit", "-q", "--allow-empty", "-m", "initial"]);
        let head = run(dir.path(), &["rev-parse", "HEAD"]);
        (dir, CommitSha::new(head).unwrap())
    }

    fn store(dir: &Path) -> GitNotesStore {
        GitNotesStore::new(dir).with_author(NoteAuthor {
            name: "CI Trigger".to_string(),
            email: "ci@example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn test_append_then_read_two_notes() {
        if !git_available() {
            return;
        }
        let (dir, commit) = repository_with_commit();
        let store = store(dir.path());

        assert_eq!(store.read_note(&commit).await.unwrap(), None);

        let first = BuildNote::new(Timestamp::now(), BuildStatus::NotStartedYet, "http://ci/a");
        let second = BuildNote::new(Timestamp::now(), BuildStatus::Restarted, "http://ci/b");
        store.append_note(&commit, &first.to_note_text()).await.unwrap();
        store.append_note(&commit, &second.to_note_text()).await.unwrap();

        let text = store.read_note(&commit).await.unwrap().unwrap();
        let notes = BuildNote::parse_all(&text);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].status(), &BuildStatus::NotStartedYet);
        assert_eq!(notes[1].job_url(), "http://ci/b");
    }

    #[tokio::test]
    async fn test_custom_notes_ref_is_isolated() {
        if !git_available() {
            return;
        }
        let (dir, commit) = repository_with_commit();
        let ci_store = store(dir.path()).with_notes_ref("refs/notes/ci");

        ci_store.append_note(&commit, "ciBuildStatus=success").await.unwrap();

        assert!(ci_store.read_note(&commit).await.unwrap().is_some());
        assert!(store(dir.path()).read_note(&commit).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_commit_is_rejected() {
        if !git_available() {
            return;
        }
        let (dir, _) = repository_with_commit();
        let missing = CommitSha::new("0123456789abcdef0123456789abcdef01234567").unwrap();

        let err = store(dir.path()).append_note(&missing, "x=y").await.unwrap_err();

        assert!(matches!(err, NoteStoreError::CommitNotFound(_)));
    }
}

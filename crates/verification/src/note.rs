//! Build notes: the record a successful trigger attaches to its commit.
//!
//! ## Text format
//!
//! One `key=value` pair per line, always in this order:
//!
//! ```text
//! invocationTime=2024-05-01T10:30:00+00:00
//! ciBuildStatus=not_started_yet
//! ciJobUrl=http://ci.example.com/gitblit/notifyCommit?repository=repo1&...
//! ```
//!
//! Notes are append-only. Appending another note to the same commit leaves a
//! blank line between the blocks, which is how [`BuildNote::parse_all`] tells
//! them apart. Only the first `=` of a line separates key from value, so job
//! URLs are stored unescaped.

use crate::{BuildStatus, Timestamp, VerificationError};

/// Key of the invocation time line.
pub const INVOCATION_TIME_KEY: &str = "invocationTime";
/// Key of the build status line.
pub const BUILD_STATUS_KEY: &str = "ciBuildStatus";
/// Key of the job URL line.
pub const JOB_URL_KEY: &str = "ciJobUrl";

/// An immutable build note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNote {
    invocation_time: Timestamp,
    status: BuildStatus,
    job_url: String,
}

impl BuildNote {
    /// Creates a note from its three mandatory fields.
    pub fn new(invocation_time: Timestamp, status: BuildStatus, job_url: impl Into<String>) -> Self {
        Self {
            invocation_time,
            status,
            job_url: job_url.into(),
        }
    }

    /// Starts a staged builder.
    pub fn builder() -> BuildNoteBuilder {
        BuildNoteBuilder::default()
    }

    /// When the CI job was triggered.
    pub fn invocation_time(&self) -> Timestamp {
        self.invocation_time
    }

    /// Recorded build status.
    pub fn status(&self) -> &BuildStatus {
        &self.status
    }

    /// URL used to trigger the job.
    pub fn job_url(&self) -> &str {
        &self.job_url
    }

    /// Serialises the note in its fixed line order, without a trailing newline.
    pub fn to_note_text(&self) -> String {
        format!(
            "{INVOCATION_TIME_KEY}={}\n{BUILD_STATUS_KEY}={}\n{JOB_URL_KEY}={}",
            self.invocation_time, self.status, self.job_url
        )
    }

    /// Parses a single note block.
    ///
    /// Unknown keys are ignored; when a key repeats, the last value wins. All
    /// three mandatory keys must be present.
    pub fn parse(block: &str) -> Result<Self, VerificationError> {
        let mut invocation_time = None;
        let mut status = None;
        let mut job_url = None;

        for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                INVOCATION_TIME_KEY => {
                    let ts = Timestamp::parse_rfc3339(value.trim()).ok_or_else(|| {
                        VerificationError::MalformedNote {
                            message: format!("invalid {INVOCATION_TIME_KEY} '{value}'"),
                        }
                    })?;
                    invocation_time = Some(ts);
                }
                BUILD_STATUS_KEY => status = Some(BuildStatus::parse(value.trim())),
                JOB_URL_KEY => job_url = Some(value.trim().to_string()),
                _ => {}
            }
        }

        BuildNoteBuilder {
            invocation_time,
            status,
            job_url,
        }
        .build()
        .map_err(|e| VerificationError::MalformedNote {
            message: e.to_string(),
        })
    }

    /// Parses every build note in an appended note text.
    ///
    /// Blocks that are not build notes (for example notes written by other
    /// tools on the same commit) are skipped.
    pub fn parse_all(text: &str) -> Vec<Self> {
        split_blocks(text)
            .into_iter()
            .filter_map(|block| match Self::parse(&block) {
                Ok(note) => Some(note),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping note block");
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Display for BuildNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_note_text())
    }
}

fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Staged construction of a [`BuildNote`].
///
/// Fields may be set in any order. [`BuildNoteBuilder::build`] consumes the
/// builder and refuses to produce a partial note.
#[derive(Debug, Clone, Default)]
pub struct BuildNoteBuilder {
    invocation_time: Option<Timestamp>,
    status: Option<BuildStatus>,
    job_url: Option<String>,
}

impl BuildNoteBuilder {
    /// Records when the job was triggered.
    pub fn invocation_time(mut self, time: Timestamp) -> Self {
        self.invocation_time = Some(time);
        self
    }

    /// Records the build status.
    pub fn build_status(mut self, status: BuildStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Records the job URL.
    pub fn job_url(mut self, url: impl Into<String>) -> Self {
        self.job_url = Some(url.into());
        self
    }

    /// Finalises the note.
    ///
    /// # Errors
    ///
    /// [`VerificationError::IncompleteNote`] naming the first missing field.
    pub fn build(self) -> Result<BuildNote, VerificationError> {
        let invocation_time = self.invocation_time.ok_or(VerificationError::IncompleteNote {
            field: INVOCATION_TIME_KEY,
        })?;
        let status = self.status.ok_or(VerificationError::IncompleteNote {
            field: BUILD_STATUS_KEY,
        })?;
        let job_url = self
            .job_url
            .ok_or(VerificationError::IncompleteNote { field: JOB_URL_KEY })?;
        Ok(BuildNote::new(invocation_time, status, job_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const JOB_URL: &str = "http://ci.example.com/gitblit/notifyCommit?repository=repo1&job=job1";

    fn fixed_time() -> Timestamp {
        Timestamp::from_utc(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap())
    }

    #[test]
    fn test_note_text_has_fixed_layout() {
        let note = BuildNote::new(fixed_time(), BuildStatus::NotStartedYet, JOB_URL);
        assert_eq!(
            note.to_note_text(),
            format!(
                "invocationTime=2024-05-01T10:30:00+00:00\nciBuildStatus=not_started_yet\nciJobUrl={JOB_URL}"
            )
        );
    }

    #[test]
    fn test_builder_call_order_does_not_change_output() {
        let a = BuildNote::builder()
            .job_url(JOB_URL)
            .build_status(BuildStatus::Restarted)
            .invocation_time(fixed_time())
            .build()
            .unwrap();
        let b = BuildNote::builder()
            .invocation_time(fixed_time())
            .build_status(BuildStatus::Restarted)
            .job_url(JOB_URL)
            .build()
            .unwrap();
        assert_eq!(a.to_note_text(), b.to_note_text());
    }

    #[test]
    fn test_builder_rejects_missing_fields() {
        let err = BuildNote::builder()
            .invocation_time(fixed_time())
            .job_url(JOB_URL)
            .build()
            .unwrap_err();
        assert_eq!(err, VerificationError::IncompleteNote { field: "ciBuildStatus" });

        let err = BuildNote::builder().build().unwrap_err();
        assert_eq!(err, VerificationError::IncompleteNote { field: "invocationTime" });
    }

    #[test]
    fn test_parse_reads_back_written_note() {
        let note = BuildNote::new(fixed_time(), BuildStatus::Restarted, JOB_URL);
        assert_eq!(BuildNote::parse(&note.to_note_text()).unwrap(), note);
    }

    #[test]
    fn test_parse_rejects_partial_block() {
        let err = BuildNote::parse("ciBuildStatus=success").unwrap_err();
        assert!(matches!(err, VerificationError::MalformedNote { .. }));

        let err = BuildNote::parse("invocationTime=soon\nciBuildStatus=success\nciJobUrl=x");
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_all_splits_appended_notes_and_skips_foreign_blocks() {
        let first = BuildNote::new(fixed_time(), BuildStatus::NotStartedYet, JOB_URL);
        let second = BuildNote::new(fixed_time(), BuildStatus::Other("queued".into()), JOB_URL);
        let text = format!(
            "{}\n\nReviewed-by: bob\n\n{}\n",
            first.to_note_text(),
            second.to_note_text()
        );

        let notes = BuildNote::parse_all(&text);
        assert_eq!(notes, vec![first, second]);
    }
}

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use verification::{BuildNote, CommitSha, NoteStore};

use super::git_notes_store;
use crate::config::CliConfig;
use crate::ShowNotesArgs;

/// JSON shape of one build note.
#[derive(Debug, Serialize)]
struct NoteView<'a> {
    invocation_time: String,
    status: &'a str,
    job_url: &'a str,
}

pub async fn handle(args: ShowNotesArgs, config: &CliConfig) -> Result<bool> {
    let settings = config.repository(&args.repository)?;
    let commit =
        CommitSha::new(args.commit).ok_or_else(|| anyhow!("commit must not be empty"))?;

    let store = git_notes_store(settings, config);
    let text = store
        .read_note(&commit)
        .await
        .with_context(|| format!("Failed to read notes of {commit}"))?;
    let notes = text.as_deref().map(BuildNote::parse_all).unwrap_or_default();

    if args.json {
        println!("{}", render_json(&notes)?);
    } else if notes.is_empty() {
        println!("No build notes on {commit}");
    } else {
        println!("{}", render_table(&notes));
    }
    Ok(true)
}

fn render_json(notes: &[BuildNote]) -> Result<String> {
    let views: Vec<NoteView<'_>> = notes
        .iter()
        .map(|note| NoteView {
            invocation_time: note.invocation_time().to_string(),
            status: note.status().as_str(),
            job_url: note.job_url(),
        })
        .collect();
    serde_json::to_string_pretty(&views).context("Failed to serialise notes")
}

fn render_table(notes: &[BuildNote]) -> String {
    notes
        .iter()
        .map(|note| {
            format!(
                "{}  {:<16}  {}",
                note.invocation_time(),
                note.status().as_str(),
                note.job_url()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

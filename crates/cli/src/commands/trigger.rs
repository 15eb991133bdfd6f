use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use jenkins::JenkinsClient;
use notes::InMemoryNoteStore;
use verification::{
    resolve_ticket, CommitSha, NoteStore, RefName, TicketMetadata, TriggerOutcome,
    TriggerRequest, UserName, Verification,
};

use super::git_notes_store;
use crate::config::{CliConfig, API_TOKEN_ENV, USERNAME_ENV};
use crate::{TicketArgs, TriggerArgs};

pub async fn handle(args: TriggerArgs, config: &CliConfig) -> Result<bool> {
    let settings = config.repository(&args.repository)?;
    let ci = settings.to_ci_config(
        std::env::var(USERNAME_ENV).ok(),
        std::env::var(API_TOKEN_ENV).ok(),
    )?;

    let target_ref =
        RefName::new(args.target_ref).ok_or_else(|| anyhow!("--ref must not be empty"))?;
    let last_commit =
        CommitSha::new(args.commit).ok_or_else(|| anyhow!("--commit must not be empty"))?;
    let ticket = match explicit_ticket(&args.ticket) {
        Some(ticket) => Some(ticket),
        None => resolve_ticket(&config.ticket_directory(), &ci, &target_ref).await,
    };

    let request = TriggerRequest {
        target_ref,
        last_commit,
        acting_user: args.user.and_then(UserName::new),
        ticket,
        restart: args.restart,
    };

    let store: Arc<dyn NoteStore> = if args.dry_run {
        Arc::new(InMemoryNoteStore::new())
    } else {
        Arc::new(git_notes_store(settings, config))
    };
    let invoker = JenkinsClient::with_timeout(Duration::from_secs(config.request_timeout_secs));
    let verification = Verification::new(ci, Arc::new(invoker), store);

    let outcome = verification.start(&request).await;
    println!("{}", describe(&outcome, &request.last_commit));
    Ok(outcome.is_success())
}

fn explicit_ticket(args: &TicketArgs) -> Option<TicketMetadata> {
    Some(TicketMetadata {
        title: args.ticket_title.clone(),
        topic: args.ticket_topic.clone(),
        ticket_type: args.ticket_type?,
        priority: args.ticket_priority?,
    })
}

fn describe(outcome: &TriggerOutcome, commit: &CommitSha) -> String {
    match outcome {
        TriggerOutcome::Recorded { note } => {
            format!("Build triggered; note recorded on {commit}:\n{note}")
        }
        TriggerOutcome::NotAccepted { status: 0 } => {
            "CI server could not be reached; no note written".to_string()
        }
        TriggerOutcome::NotAccepted { status } => {
            format!("CI server answered HTTP {status}; no note written")
        }
        TriggerOutcome::NoteRejected { reason, .. } => {
            format!("Build triggered but the note on {commit} was not stored: {reason}")
        }
    }
}

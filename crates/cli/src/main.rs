//! CI verification CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `.verification/config.toml` and validate
//!    the selected repository's CI settings.
//! 2. **Wire observability**: configure `tracing-subscriber` (pretty or JSON)
//!    and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP
//!    exporter. All spans and events emitted by every crate flow through it.
//! 3. **Construct infrastructure**: create the `JenkinsClient` and the note
//!    store (`GitNotesStore`, or `InMemoryNoteStore` for `--dry-run`) and
//!    inject them into `Verification`.
//! 4. **Run the subcommand**: `trigger` or `show-notes`.

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use verification::{TicketPriority, TicketType};

use crate::config::{CliConfig, LogFormat, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "verify", version, about = "Trigger CI verification and record build notes")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "VERIFY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log format; overrides the config file.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trigger the CI job for a ref and record a build note on success.
    Trigger(TriggerArgs),
    /// Print the build notes attached to a commit.
    ShowNotes(ShowNotesArgs),
}

#[derive(Debug, Args)]
struct TriggerArgs {
    /// Configured repository name.
    #[arg(long, short)]
    repository: String,

    /// Ref to build, e.g. `refs/heads/main`.
    #[arg(long = "ref")]
    target_ref: String,

    /// Tip commit of the ref; receives the build note.
    #[arg(long)]
    commit: String,

    /// User on whose behalf the build runs.
    #[arg(long, env = "VERIFY_USER")]
    user: Option<String>,

    /// Record the trigger as a restart of an already started build.
    #[arg(long)]
    restart: bool,

    /// Record the note in memory instead of the repository.
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    ticket: TicketArgs,
}

/// Explicit ticket metadata; overrides the `[[tickets]]` lookup.
#[derive(Debug, Args)]
struct TicketArgs {
    #[arg(long, requires_all = ["ticket_type", "ticket_priority"])]
    ticket_title: Option<String>,

    #[arg(long, requires_all = ["ticket_type", "ticket_priority"])]
    ticket_topic: Option<String>,

    #[arg(long, requires = "ticket_priority")]
    ticket_type: Option<TicketType>,

    #[arg(long, requires = "ticket_type")]
    ticket_priority: Option<TicketPriority>,
}

#[derive(Debug, Args)]
struct ShowNotesArgs {
    /// Configured repository name.
    #[arg(long, short)]
    repository: String,

    /// Commit to inspect.
    commit: String,

    /// Print the notes as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let _telemetry = match telemetry::init(cli.log_format.unwrap_or(config.log_format)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Command::Trigger(args) => commands::trigger::handle(args, &config).await,
        Command::ShowNotes(args) => commands::show_notes::handle(args, &config).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

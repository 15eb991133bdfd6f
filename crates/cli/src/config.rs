//! CLI configuration loaded from `.verification/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use verification::{
    CredentialConfig, JobName, RepositoryCiConfig, RepositoryName, TicketDirectory, TicketId,
    TicketMetadata, TicketPriority, TicketType,
};

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".verification/config.toml";

/// Environment variable overriding every repository's Jenkins username.
pub const USERNAME_ENV: &str = "JENKINS_USERNAME";
/// Environment variable overriding every repository's Jenkins API token.
pub const API_TOKEN_ENV: &str = "JENKINS_API_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Notes ref build notes are appended to.
    #[serde(default = "default_notes_ref")]
    pub notes_ref: String,

    /// Upper bound on one notify-commit exchange, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Identity for note commits; the repository's git identity when unset.
    #[serde(default)]
    pub note_author: Option<NoteAuthorConfig>,

    /// Repositories that can be triggered.
    #[serde(default)]
    pub repositories: Vec<RepositorySettings>,

    /// Tickets known for ticket refs.
    #[serde(default)]
    pub tickets: Vec<TicketSettings>,
}

fn default_notes_ref() -> String {
    notes::DEFAULT_NOTES_REF.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            notes_ref: default_notes_ref(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: LogFormat::default(),
            note_author: None,
            repositories: Vec::new(),
            tickets: Vec::new(),
        }
    }
}

/// How log events are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// `[note_author]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAuthorConfig {
    pub name: String,
    pub email: String,
}

/// One `[[repositories]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    /// Repository name sent to the CI server.
    pub name: String,
    /// CI base URL.
    pub ci_url: String,
    /// Jenkins job name.
    pub job_name: String,
    /// Jenkins account; blank disables authentication.
    #[serde(default)]
    pub jenkins_username: String,
    /// Jenkins API token.
    #[serde(default)]
    pub jenkins_api_token: String,
    /// Local path of the Git repository that receives notes.
    pub path: PathBuf,
}

/// One `[[tickets]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSettings {
    /// Repository the ticket belongs to.
    pub repository: String,
    /// Ticket number.
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub priority: TicketPriority,
}

impl CliConfig {
    /// Loads the config at `path`. Returns the default config if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Finds the settings of repository `name`.
    pub fn repository(&self, name: &str) -> Result<&RepositorySettings> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| anyhow!("Repository '{name}' is not configured"))
    }

    /// Ticket directory backed by the `[[tickets]]` entries.
    pub fn ticket_directory(&self) -> ConfiguredTickets {
        ConfiguredTickets {
            tickets: self.tickets.clone(),
        }
    }
}

impl RepositorySettings {
    /// Builds the validated domain configuration.
    ///
    /// `username_override` and `token_override` (usually read from
    /// [`USERNAME_ENV`] / [`API_TOKEN_ENV`]) replace the file values when set.
    pub fn to_ci_config(
        &self,
        username_override: Option<String>,
        token_override: Option<String>,
    ) -> Result<RepositoryCiConfig> {
        let name = RepositoryName::new(self.name.clone())
            .ok_or_else(|| anyhow!("Repository name must not be empty"))?;
        let job = JobName::new(self.job_name.clone())
            .ok_or_else(|| anyhow!("Repository '{}' has an empty job_name", self.name))?;
        let credentials = CredentialConfig::new(
            username_override.unwrap_or_else(|| self.jenkins_username.clone()),
            token_override.unwrap_or_else(|| self.jenkins_api_token.clone()),
        );

        RepositoryCiConfig::new(name, self.ci_url.clone(), job, Some(credentials))
            .with_context(|| format!("Invalid CI settings for repository '{}'", self.name))
    }
}

/// [`TicketDirectory`] over the tickets listed in the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredTickets {
    tickets: Vec<TicketSettings>,
}

#[async_trait]
impl TicketDirectory for ConfiguredTickets {
    async fn find_ticket(
        &self,
        repository: &RepositoryName,
        id: TicketId,
    ) -> Option<TicketMetadata> {
        self.tickets
            .iter()
            .find(|t| t.repository == repository.as_str() && t.id == id.as_u64())
            .map(|t| TicketMetadata {
                title: t.title.clone(),
                topic: t.topic.clone(),
                ticket_type: t.ticket_type,
                priority: t.priority,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
notes_ref = "refs/notes/ci"
log_format = "json"

[[repositories]]
name = "repo1"
ci_url = "http://ci.example.com/"
job_name = "job1"
jenkins_username = "ci-bot"
jenkins_api_token = "token"
path = "/srv/git/repo1.git"

[[tickets]]
repository = "repo1"
id = 42
title = "Crash on start"
type = "bug"
priority = "high"
"#;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.notes_ref, "refs/notes/commits");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_sample() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = CliConfig::load(&path).unwrap();

        assert_eq!(config.notes_ref, "refs/notes/ci");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.tickets[0].ticket_type, TicketType::Bug);

        let ci = config.repository("repo1").unwrap().to_ci_config(None, None).unwrap();
        assert_eq!(ci.ci_url(), "http://ci.example.com");
        assert_eq!(ci.credentials().unwrap().username, "ci-bot");
        assert!(config.repository("other").is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "repositories = 3").unwrap();
        assert!(CliConfig::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides_replace_file_credentials() {
        let config: CliConfig = toml::from_str(SAMPLE).unwrap();
        let settings = config.repository("repo1").unwrap();

        let ci = settings
            .to_ci_config(Some("override".into()), Some("other".into()))
            .unwrap();
        assert_eq!(ci.credentials().unwrap().username, "override");

        let ci = settings.to_ci_config(Some(" ".into()), None).unwrap();
        assert!(ci.credentials().is_none());
    }

    #[tokio::test]
    async fn test_configured_tickets_lookup() {
        let config: CliConfig = toml::from_str(SAMPLE).unwrap();
        let directory = config.ticket_directory();
        let repo = RepositoryName::new("repo1").unwrap();

        let ticket = directory
            .find_ticket(&repo, TicketId::new(42).unwrap())
            .await
            .unwrap();
        assert_eq!(ticket.title.as_deref(), Some("Crash on start"));
        assert_eq!(ticket.topic, None);

        assert!(directory.find_ticket(&repo, TicketId::new(7).unwrap()).await.is_none());
    }
}

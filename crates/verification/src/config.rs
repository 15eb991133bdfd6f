//! Per-repository CI configuration.
//!
//! Loaded by the composition root and handed to [`crate::Verification`]
//! read-only. Validation happens once, here, so the trigger path never sees a
//! malformed base URL.

use url::Url;

use crate::{CredentialConfig, JobName, RepositoryName, VerificationError};

/// Fixed path appended to the CI base URL for commit notifications.
pub const NOTIFY_COMMIT_PATH: &str = "/gitblit/notifyCommit";

/// CI settings of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCiConfig {
    name: RepositoryName,
    ci_url: String,
    job: JobName,
    credentials: Option<CredentialConfig>,
}

impl RepositoryCiConfig {
    /// Validates and creates a repository configuration.
    ///
    /// `ci_url` must be an absolute `http` or `https` URL with a host and
    /// neither query nor fragment. It is stored in normalised form without a
    /// trailing `/` so the notify path can be appended verbatim.
    /// Credentials whose username is blank are dropped.
    pub fn new(
        name: RepositoryName,
        ci_url: impl Into<String>,
        job: JobName,
        credentials: Option<CredentialConfig>,
    ) -> Result<Self, VerificationError> {
        let ci_url = ci_url.into();
        let invalid = |reason: &str| VerificationError::ConfigurationError {
            message: format!("CI URL '{ci_url}' {reason}"),
        };

        let parsed = Url::parse(ci_url.trim())
            .map_err(|e| invalid(&format!("is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("must use http or https"));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("must name a host"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("must carry no query or fragment"));
        }

        Ok(Self {
            name,
            ci_url: parsed.as_str().trim_end_matches('/').to_string(),
            job,
            credentials: credentials.filter(CredentialConfig::is_configured),
        })
    }

    /// Repository name as known to the CI server.
    pub fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// CI base URL without a trailing slash.
    pub fn ci_url(&self) -> &str {
        &self.ci_url
    }

    /// Job that verifies this repository.
    pub fn job(&self) -> &JobName {
        &self.job
    }

    /// Credentials, present only when configured.
    pub fn credentials(&self) -> Option<&CredentialConfig> {
        self.credentials.as_ref()
    }

    /// Full notify-commit URL for an already encoded query string.
    pub fn notify_commit_url(&self, query: &str) -> String {
        format!("{}{}?{}", self.ci_url, NOTIFY_COMMIT_PATH, query)
    }
}

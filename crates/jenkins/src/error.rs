//! Transport-level failures of the notify-commit call.
//!
//! These never cross the [`verification::CiInvoker`] boundary as errors; the
//! client collapses them into
//! [`verification::InvocationOutcome::TransportFailure`].

use thiserror::Error;

/// Why no HTTP status was obtained.
#[derive(Debug, Error)]
pub enum JenkinsError {
    /// The endpoint is not a valid absolute URL.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Parser message.
        reason: String,
    },

    /// The endpoint has no host to send the request to.
    #[error("Endpoint '{0}' has no host")]
    MissingHost(String),

    /// The HTTP client could not be constructed (e.g. TLS backend failure).
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Connection, timeout, redirect or protocol failure.
    #[error("Request failed")]
    Request(#[source] reqwest::Error),
}

impl JenkinsError {
    /// Renders this error and all its sources as one `: `-separated line.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_without_source_is_display() {
        let err = JenkinsError::MissingHost("file:///tmp".to_string());
        assert_eq!(err.chain(), "Endpoint 'file:///tmp' has no host");
    }

    #[tokio::test]
    async fn test_chain_includes_sources() {
        let source = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .timeout(std::time::Duration::from_millis(1))
            .send()
            .await
            .unwrap_err();
        let err = JenkinsError::Request(source);
        assert!(err.chain().starts_with("Request failed: "));
    }
}

//! The notify-commit HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::{debug, instrument, warn};
use verification::{CiInvoker, CredentialConfig, InvocationOutcome};

use crate::auth::{redirect_policy, AuthScope, PreemptiveAuth};
use crate::error::JenkinsError;

/// Settings of the notify-commit client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsClientConfig {
    /// Upper bound on the whole exchange, body included.
    pub timeout: Duration,
    /// Redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for JenkinsClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

/// Triggers Jenkins jobs through the Gitblit plugin's notify-commit endpoint.
///
/// Every call builds its own short-lived [`Client`] because the redirect
/// policy depends on the credentials' scope. Exactly one request is sent per
/// call; nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct JenkinsClient {
    config: JenkinsClientConfig,
}

impl JenkinsClient {
    /// Creates a client with the given settings.
    pub fn new(config: JenkinsClientConfig) -> Self {
        Self { config }
    }

    /// Creates a client with the default redirect limit and `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(JenkinsClientConfig {
            timeout,
            ..JenkinsClientConfig::default()
        })
    }

    fn http_client(&self, scope: Option<AuthScope>) -> Result<Client, JenkinsError> {
        Client::builder()
            .timeout(self.config.timeout)
            .redirect(redirect_policy(scope, self.config.max_redirects))
            .build()
            .map_err(JenkinsError::ClientBuild)
    }

    async fn send(
        &self,
        endpoint: &str,
        credentials: Option<&CredentialConfig>,
    ) -> Result<u16, JenkinsError> {
        let url = Url::parse(endpoint).map_err(|e| JenkinsError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(JenkinsError::MissingHost(endpoint.to_string()));
        }

        let auth = credentials.and_then(|c| PreemptiveAuth::for_endpoint(&url, c));
        if let Some(auth) = &auth {
            debug!(scope = %auth.scope(), "Sending pre-emptive basic authentication");
        }

        let client = self.http_client(auth.as_ref().map(|a| a.scope().clone()))?;
        let mut request = client.get(url.clone());
        if let Some(auth) = &auth {
            request = auth.apply(&url, request);
        }

        let response = request.send().await.map_err(JenkinsError::Request)?;
        let status = response.status().as_u16();
        release(response).await;
        Ok(status)
    }
}

#[async_trait]
impl CiInvoker for JenkinsClient {
    #[instrument(
        skip(self, endpoint, credentials),
        fields(credentials_supplied = credentials.is_some())
    )]
    async fn invoke(
        &self,
        endpoint: &str,
        credentials: Option<&CredentialConfig>,
    ) -> InvocationOutcome {
        match self.send(endpoint, credentials).await {
            Ok(status) => {
                debug!(status, "CI server responded");
                InvocationOutcome::Responded { status }
            }
            Err(e) => {
                let reason = e.chain();
                warn!(error = %reason, "Notify-commit request failed");
                InvocationOutcome::TransportFailure { reason }
            }
        }
    }
}

/// Drains the body so the connection is released; a missing or broken body is fine.
async fn release(response: Response) {
    if let Err(e) = response.bytes().await {
        debug!(error = %e, "Discarding unreadable response body");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    /// Matches requests that carry no `Authorization` header.
    struct NoAuthorization;

    impl Match for NoAuthorization {
        fn matches(&self, request: &Request) -> bool {
            !request.headers.contains_key("authorization")
        }
    }

    fn endpoint(server: &MockServer) -> String {
        format!(
            "{}/gitblit/notifyCommit?repository=repo1&job=job1&branch=refs%2Fheads%2Fmain&user=alice&lastCommit=abcd1234",
            server.uri()
        )
    }

    fn client() -> JenkinsClient {
        JenkinsClient::with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gitblit/notifyCommit"))
            .and(query_param("branch", "refs/heads/main"))
            .and(NoAuthorization)
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client().invoke(&endpoint(&server), None).await;

        assert_eq!(outcome, InvocationOutcome::Responded { status: 200 });
    }

    #[tokio::test]
    async fn test_blank_username_sends_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(NoAuthorization)
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let creds = CredentialConfig::new("   ", "ignored");
        let outcome = client().invoke(&endpoint(&server), Some(&creds)).await;

        assert!(outcome.is_accepted());
    }

    #[tokio::test]
    async fn test_credentials_are_sent_on_first_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gitblit/notifyCommit"))
            .and(header("authorization", "Basic Y2ktYm90OnRva2Vu"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        // A challenge-driven client would hit this first.
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic realm=\"ci\""),
            )
            .expect(0)
            .mount(&server)
            .await;

        let creds = CredentialConfig::new("ci-bot", "token");
        let outcome = client().invoke(&endpoint(&server), Some(&creds)).await;

        assert_eq!(outcome.status_code(), 200);
    }

    #[tokio::test]
    async fn test_non_200_status_is_reported_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client().invoke(&endpoint(&server), None).await;

        assert_eq!(outcome, InvocationOutcome::Responded { status: 404 });
        assert!(!outcome.is_accepted());
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_sentinel() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{port}/gitblit/notifyCommit?repository=repo1");

        let outcome = client().invoke(&url, None).await;

        assert!(matches!(outcome, InvocationOutcome::TransportFailure { .. }));
        assert_eq!(outcome.status_code(), 0);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_maps_to_sentinel() {
        for url in ["not a url", "file:///tmp/notifyCommit"] {
            let outcome = client().invoke(url, None).await;
            assert_eq!(outcome.status_code(), InvocationOutcome::SENTINEL_STATUS);
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let outcome = JenkinsClient::with_timeout(Duration::from_millis(200))
            .invoke(&endpoint(&server), None)
            .await;

        assert!(matches!(outcome, InvocationOutcome::TransportFailure { .. }));
    }

    #[tokio::test]
    async fn test_credentials_do_not_follow_cross_origin_redirect() {
        let ci = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/landing", elsewhere.uri()).as_str()),
            )
            .expect(1)
            .mount(&ci)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&elsewhere)
            .await;

        let creds = CredentialConfig::new("ci-bot", "token");
        let outcome = client().invoke(&endpoint(&ci), Some(&creds)).await;

        assert_eq!(outcome, InvocationOutcome::Responded { status: 302 });
    }

    #[tokio::test]
    async fn test_anonymous_request_follows_redirects() {
        let ci = MockServer::start().await;
        let mirror = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/landing", mirror.uri()).as_str()),
            )
            .mount(&ci)
            .await;
        Mock::given(method("GET"))
            .and(path("/landing"))
            .and(NoAuthorization)
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mirror)
            .await;

        let outcome = client().invoke(&endpoint(&ci), None).await;

        assert!(outcome.is_accepted());
    }
}

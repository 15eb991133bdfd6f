//! Pre-emptive basic authentication scoped to one origin.
//!
//! A challenge-driven client sends the request anonymously, receives `401`,
//! and retries with credentials. The notify-commit call must be a single
//! request, so the `Authorization` header is attached up front, but only for
//! the (host, port) the credentials were configured for.

use reqwest::{redirect, RequestBuilder, Url};
use verification::CredentialConfig;

/// The (host, port) pair credentials are valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthScope {
    host: String,
    port: Option<u16>,
}

impl AuthScope {
    /// Returns the scope of `url`, or `None` if it has no host.
    ///
    /// The port is the explicit port or the scheme's default.
    pub fn of(url: &Url) -> Option<Self> {
        Some(Self {
            host: url.host_str()?.to_ascii_lowercase(),
            port: url.port_or_known_default(),
        })
    }

    /// Returns `true` if `url` targets this scope.
    pub fn contains(&self, url: &Url) -> bool {
        Self::of(url).as_ref() == Some(self)
    }
}

impl std::fmt::Display for AuthScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// Credentials cached for one scope, ready to be sent without a challenge.
#[derive(Debug, Clone)]
pub struct PreemptiveAuth {
    scope: AuthScope,
    credentials: CredentialConfig,
}

impl PreemptiveAuth {
    /// Caches `credentials` for the origin of `endpoint`.
    ///
    /// Returns `None` when the credentials are not configured (blank
    /// username) or the endpoint has no host; the request then goes out with
    /// no authentication at all.
    pub fn for_endpoint(endpoint: &Url, credentials: &CredentialConfig) -> Option<Self> {
        if !credentials.is_configured() {
            return None;
        }
        Some(Self {
            scope: AuthScope::of(endpoint)?,
            credentials: credentials.clone(),
        })
    }

    /// Scope the credentials are valid for.
    pub fn scope(&self) -> &AuthScope {
        &self.scope
    }

    /// Attaches the basic-auth header when `url` is inside the scope.
    pub fn apply(&self, url: &Url, request: RequestBuilder) -> RequestBuilder {
        if !self.scope.contains(url) {
            return request;
        }
        request.basic_auth(
            &self.credentials.username,
            Some(&self.credentials.secret_token),
        )
    }
}

/// Redirect policy for a request.
///
/// Without credentials redirects are followed up to `max_redirects`. With
/// credentials, a redirect that leaves the scope is not followed: the 3xx
/// response itself becomes the result.
pub fn redirect_policy(scope: Option<AuthScope>, max_redirects: usize) -> redirect::Policy {
    let Some(scope) = scope else {
        return redirect::Policy::limited(max_redirects);
    };
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if scope.contains(attempt.url()) {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

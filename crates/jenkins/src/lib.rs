//! Jenkins notify-commit adapter.
//!
//! Implements the [`verification::CiInvoker`] trait over HTTP with `reqwest`.
//! The Gitblit plugin on the Jenkins side exposes
//! `GET {ci_url}/gitblit/notifyCommit?...` and answers `200` when it has
//! scheduled the job.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL parsing, TLS, redirect handling, pre-emptive basic
//! authentication and timeouts all live here. The [`verification`] crate sees
//! only [`verification::CiInvoker`] and [`verification::InvocationOutcome`].
//!
//! ## Authentication
//!
//! When a repository has a Jenkins username configured, the `Authorization`
//! header is sent on the first and only request (see [`auth`]). Credentials
//! are bound to the endpoint's host and port and are never sent to another
//! origin, including through redirects.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AuthScope, PreemptiveAuth};
pub use client::{JenkinsClient, JenkinsClientConfig};
pub use error::JenkinsError;

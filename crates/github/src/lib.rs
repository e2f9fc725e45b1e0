//! Platform API client
//!
//! Authenticated, metric-instrumented access to the GitHub REST surface plus
//! a short-lived cache of runner registration tokens. Implements
//! `arc_core::platform::PlatformGroupClient`, the narrow interface the
//! scale-target resolver consults for named-runner-group reachability.

mod auth;
mod client;
mod config;
mod error;
mod metrics;
mod token_cache;

pub use client::{GithubClient, Runner, WorkflowRun};
pub use config::{BaseUrls, GithubClientConfig};
pub use error::{PlatformApiError, Result};

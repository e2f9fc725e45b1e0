//! Interface surface the resolver consults to reduce named runner groups to the
//! subset actually reachable from a given owner/repo (§4.2.3). The concrete
//! implementation talks to the GitHub REST API and lives outside this crate;
//! this trait is the seam, analogous to this codebase's other client traits
//! (`WorkerClientApi`) that let domain logic depend on a capability rather than
//! a transport.

use async_trait::async_trait;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformClientError>;

#[derive(Debug, Error)]
pub enum PlatformClientError {
    #[error("platform api request failed: {0}")]
    Request(String),
}

/// Reduces candidate runner-group names to the ones reachable from `owner`/`repo`.
///
/// Implementations must preserve relative order within each list and must not
/// invent group names absent from the input candidates. An empty `owner` input
/// short-circuits to `(vec![], vec![])` without making a network call (§9,
/// resolved open question).
#[async_trait]
pub trait PlatformGroupClient: Send + Sync {
    async fn reachable_runner_groups(
        &self,
        owner: &str,
        repo: &str,
        candidate_enterprise_groups: &[String],
        candidate_org_groups: &[String],
    ) -> Result<(Vec<String>, Vec<String>)>;
}

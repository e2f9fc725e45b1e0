//! In-process stand-in for the declarative state backend (§2.1).
//!
//! The real system stores HRAs and their target workloads in a Kubernetes API
//! server and relies on an informer cache for the `scaleTarget` secondary index.
//! That storage backend is an out-of-scope external collaborator; this module
//! provides the minimal in-memory equivalent the resolver and engine need to
//! run end to end: list-with-index, get, and an optimistic-concurrency patch.

mod error;
mod memory;

pub use error::{Result, StoreError};
pub use memory::InMemoryDeclarativeStore;

use async_trait::async_trait;

use crate::model::{CapacityReservation, Hra, RunnerWorkload, WorkloadKind};

/// Read/write access to the declarative HRA set.
#[async_trait]
pub trait HraRepository: Send + Sync {
    /// All HRAs, optionally restricted to one namespace (empty/`None` means all namespaces).
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<Hra>>;

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Hra>>;

    /// HRAs discoverable under a `scaleTarget` index key (§3, §4.5).
    async fn find_by_key(&self, key: &str) -> Result<Vec<Hra>>;

    /// Insert or fully replace an HRA (operator create/update path; seeds the index).
    async fn upsert(&self, hra: Hra) -> Result<()>;

    /// Apply the capacity-reservation engine's computed reservation list via an
    /// optimistic-concurrency merge patch (§4.3 step 6). Fails with
    /// [`StoreError::Conflict`] if `expected_resource_version` no longer matches.
    async fn patch_capacity_reservations(
        &self,
        namespace: &str,
        name: &str,
        expected_resource_version: u64,
        new_reservations: Vec<CapacityReservation>,
    ) -> Result<Hra>;
}

/// Read/write access to the declarative RunnerDeployment/RunnerSet set.
#[async_trait]
pub trait WorkloadRepository: Send + Sync {
    async fn get(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
    ) -> Result<Option<RunnerWorkload>>;

    async fn list(&self) -> Result<Vec<RunnerWorkload>>;

    /// Insert or fully replace a workload (operator create/update path; re-derives the index).
    async fn upsert(&self, workload: RunnerWorkload) -> Result<()>;
}

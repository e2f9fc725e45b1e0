use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{Result, StoreError};
use super::{HraRepository, WorkloadRepository};
use crate::index::index_keys_for_workload;
use crate::model::{CapacityReservation, Hra, RunnerWorkload, WorkloadKind};

type HraKey = (String, String);
type WorkloadKey = (String, WorkloadKind, String);

fn hra_key(namespace: &str, name: &str) -> HraKey {
    (namespace.to_string(), name.to_string())
}

fn workload_key(namespace: &str, kind: WorkloadKind, name: &str) -> WorkloadKey {
    (namespace.to_string(), kind, name.to_string())
}

#[derive(Default)]
struct State {
    hras: HashMap<HraKey, Hra>,
    workloads: HashMap<WorkloadKey, RunnerWorkload>,
    /// `scaleTarget` index: index key -> set of HRAs discoverable under it (§4.5).
    index: HashMap<String, HashSet<HraKey>>,
}

impl State {
    fn reindex(&mut self) {
        self.index.clear();
        for (hra_key, hra) in self.hras.iter() {
            let workload_key = workload_key(
                &hra.namespace,
                hra.scale_target_ref.resolved_kind(),
                &hra.scale_target_ref.name,
            );
            let Some(workload) = self.workloads.get(&workload_key) else {
                continue;
            };
            for key in index_keys_for_workload(workload) {
                self.index.entry(key).or_default().insert(hra_key.clone());
            }
        }
    }
}

/// In-memory, `RwLock`-guarded declarative state store (§2.1).
///
/// Grounded on this codebase's file-backed stores (`ProjectStore`, `WorkspaceStore`,
/// `HostStore`): a single `Arc<RwLock<...>>` behind a cheaply-cloneable handle, with a
/// composite key derived from the scope fields. Unlike those stores this one has no
/// file persistence, because HRAs are owned and persisted by the cluster's API server,
/// not by this process.
#[derive(Clone, Default)]
pub struct InMemoryDeclarativeStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryDeclarativeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HraRepository for InMemoryDeclarativeStore {
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<Hra>> {
        let state = self.state.read().await;
        let hras = state
            .hras
            .values()
            .filter(|hra| match namespace {
                Some(ns) if !ns.is_empty() => hra.namespace == ns,
                _ => true,
            })
            .cloned()
            .collect();
        Ok(hras)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Hra>> {
        let state = self.state.read().await;
        Ok(state.hras.get(&hra_key(namespace, name)).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Vec<Hra>> {
        let state = self.state.read().await;
        let Some(keys) = state.index.get(key) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|k| state.hras.get(k).cloned())
            .collect())
    }

    async fn upsert(&self, hra: Hra) -> Result<()> {
        let mut state = self.state.write().await;
        state.hras.insert(hra_key(&hra.namespace, &hra.name), hra);
        state.reindex();
        Ok(())
    }

    async fn patch_capacity_reservations(
        &self,
        namespace: &str,
        name: &str,
        expected_resource_version: u64,
        new_reservations: Vec<CapacityReservation>,
    ) -> Result<Hra> {
        let mut state = self.state.write().await;
        let key = hra_key(namespace, name);
        let hra = state
            .hras
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        if hra.resource_version != expected_resource_version {
            return Err(StoreError::Conflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
                expected: expected_resource_version,
                actual: hra.resource_version,
            });
        }

        hra.capacity_reservations = new_reservations;
        hra.resource_version += 1;
        Ok(hra.clone())
    }
}

#[async_trait]
impl WorkloadRepository for InMemoryDeclarativeStore {
    async fn get(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
    ) -> Result<Option<RunnerWorkload>> {
        let state = self.state.read().await;
        Ok(state.workloads.get(&workload_key(namespace, kind, name)).cloned())
    }

    async fn list(&self) -> Result<Vec<RunnerWorkload>> {
        let state = self.state.read().await;
        Ok(state.workloads.values().cloned().collect())
    }

    async fn upsert(&self, workload: RunnerWorkload) -> Result<()> {
        let mut state = self.state.write().await;
        let kind = match workload.kind.as_str() {
            "RunnerSet" => WorkloadKind::RunnerSet,
            _ => WorkloadKind::RunnerDeployment,
        };
        state
            .workloads
            .insert(workload_key(&workload.namespace, kind, &workload.name), workload);
        state.reindex();
        Ok(())
    }
}

//! `workflow_job` resolution (§4.2.2): unlike the generic trigger-type match,
//! multiple HRAs legitimately share an index key here - an operator can run
//! several label-distinguished runner pools against the same repository - so
//! candidates are resolved by label subset match, first-match-wins, instead
//! of by the ambiguity-is-nil rule the other event kinds use.

use std::sync::Arc;

use crate::model::{EventContext, Hra, RunnerWorkload, ScaleTarget};
use crate::store::{HraRepository, WorkloadRepository};

use super::{ResolverError, Result};

pub(super) async fn resolve_at_key(
    ctx: &EventContext,
    hras: &Arc<dyn HraRepository>,
    workloads: &Arc<dyn WorkloadRepository>,
    key: &str,
) -> Result<Option<ScaleTarget>> {
    // Only queued/completed carry a dispatcher-stamped amount (§4.2.2); other
    // workflow_job lifecycle actions (in_progress, waiting, ...) are a no-op
    // even when a pool's labels would otherwise satisfy the job.
    if !matches!(ctx.action.as_deref(), Some("queued") | Some("completed")) {
        return Ok(None);
    }

    let candidates = hras.find_by_key(key).await?;

    for hra in &candidates {
        if hra.is_being_deleted() {
            continue;
        }
        // An HRA with more than one scale-up trigger has opted into the
        // event-type-matching path instead; it is not a job-label candidate.
        if hra.scale_up_triggers.len() > 1 {
            continue;
        }

        let workload = fetch_workload(workloads, hra).await?;
        if job_labels_satisfied(&ctx.labels, &workload.labels) {
            let duration = hra
                .scale_up_triggers
                .first()
                .map(|t| t.effective_duration())
                .unwrap_or(crate::model::DEFAULT_TRIGGER_DURATION);
            return Ok(Some(ScaleTarget {
                hra: hra.clone(),
                duration,
                amount: None,
            }));
        }
    }

    Ok(None)
}

async fn fetch_workload(
    workloads: &Arc<dyn WorkloadRepository>,
    hra: &Hra,
) -> Result<RunnerWorkload> {
    let kind = hra.scale_target_ref.resolved_kind();
    workloads
        .get(&hra.namespace, kind, &hra.scale_target_ref.name)
        .await?
        .ok_or_else(|| ResolverError::WorkloadNotFound {
            namespace: hra.namespace.clone(),
            name: hra.scale_target_ref.name.clone(),
        })
}

/// The job's requested labels must all be present on the workload, ignoring
/// the implicit `self-hosted` label every self-hosted job carries.
fn job_labels_satisfied(requested: &[String], declared: &[String]) -> bool {
    requested
        .iter()
        .filter(|label| label.as_str() != "self-hosted")
        .all(|label| declared.iter().any(|d| d == label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OwnerType, ScaleTargetRef, ScaleUpTrigger};
    use crate::store::InMemoryDeclarativeStore;

    fn ctx(labels: Vec<&str>) -> EventContext {
        EventContext {
            repo_name: "web".to_string(),
            owner_login: "acme".to_string(),
            owner_type: Some(OwnerType::Organization),
            enterprise_slug: String::new(),
            event_kind: "workflow_job".to_string(),
            action: Some("queued".to_string()),
            labels: labels.into_iter().map(String::from).collect(),
            amount_hint: Some(1),
        }
    }

    fn hra(name: &str, target: &str, triggers: Vec<ScaleUpTrigger>) -> Hra {
        Hra {
            name: name.to_string(),
            namespace: "default".to_string(),
            deletion_timestamp: None,
            scale_target_ref: ScaleTargetRef {
                kind: "RunnerDeployment".to_string(),
                name: target.to_string(),
            },
            scale_up_triggers: triggers,
            capacity_reservations: vec![],
            resource_version: 0,
        }
    }

    fn workload(name: &str, repository: &str, labels: Vec<&str>) -> RunnerWorkload {
        RunnerWorkload {
            name: name.to_string(),
            namespace: "default".to_string(),
            kind: "RunnerDeployment".to_string(),
            repository: repository.to_string(),
            labels: labels.into_iter().map(String::from).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_pool_whose_labels_satisfy_the_job_wins() {
        let store = InMemoryDeclarativeStore::new();
        WorkloadRepository::upsert(&store, workload("cpu-deploy", "acme/web", vec!["self-hosted", "linux", "x64"]))
            .await
            .unwrap();
        WorkloadRepository::upsert(&store, workload("gpu-deploy", "acme/web", vec!["self-hosted", "linux", "gpu"]))
            .await
            .unwrap();
        HraRepository::upsert(&store, hra("cpu-hra", "cpu-deploy", vec![])).await.unwrap();
        HraRepository::upsert(&store, hra("gpu-hra", "gpu-deploy", vec![])).await.unwrap();
        let hras: Arc<dyn HraRepository> = Arc::new(store.clone());
        let workloads: Arc<dyn WorkloadRepository> = Arc::new(store);

        let target = resolve_at_key(
            &ctx(vec!["self-hosted", "gpu"]),
            &hras,
            &workloads,
            "acme/web",
        )
        .await
        .unwrap()
        .expect("expected a match");
        assert_eq!(target.hra.name, "gpu-hra");
        assert_eq!(target.amount, None);
    }

    #[tokio::test]
    async fn no_pool_matching_labels_is_a_no_op() {
        let store = InMemoryDeclarativeStore::new();
        WorkloadRepository::upsert(&store, workload("cpu-deploy", "acme/web", vec!["self-hosted", "linux", "x64"]))
            .await
            .unwrap();
        HraRepository::upsert(&store, hra("cpu-hra", "cpu-deploy", vec![])).await.unwrap();
        let hras: Arc<dyn HraRepository> = Arc::new(store.clone());
        let workloads: Arc<dyn WorkloadRepository> = Arc::new(store);

        let target = resolve_at_key(&ctx(vec!["self-hosted", "gpu"]), &hras, &workloads, "acme/web")
            .await
            .unwrap();
        assert!(target.is_none());
    }

    #[tokio::test]
    async fn hra_being_deleted_is_skipped() {
        let store = InMemoryDeclarativeStore::new();
        WorkloadRepository::upsert(&store, workload("cpu-deploy", "acme/web", vec!["self-hosted", "linux"]))
            .await
            .unwrap();
        let mut deleting = hra("cpu-hra", "cpu-deploy", vec![]);
        deleting.deletion_timestamp = Some(chrono::Utc::now());
        HraRepository::upsert(&store, deleting).await.unwrap();
        let hras: Arc<dyn HraRepository> = Arc::new(store.clone());
        let workloads: Arc<dyn WorkloadRepository> = Arc::new(store);

        let target = resolve_at_key(&ctx(vec!["self-hosted"]), &hras, &workloads, "acme/web")
            .await
            .unwrap();
        assert!(target.is_none());
    }

    #[tokio::test]
    async fn non_queued_completed_action_is_a_no_op_even_with_matching_labels() {
        let store = InMemoryDeclarativeStore::new();
        WorkloadRepository::upsert(&store, workload("gpu-deploy", "acme/web", vec!["self-hosted", "linux", "gpu"]))
            .await
            .unwrap();
        HraRepository::upsert(&store, hra("gpu-hra", "gpu-deploy", vec![])).await.unwrap();
        let hras: Arc<dyn HraRepository> = Arc::new(store.clone());
        let workloads: Arc<dyn WorkloadRepository> = Arc::new(store);

        let mut event = ctx(vec!["self-hosted", "gpu"]);
        event.action = Some("in_progress".to_string());
        let target = resolve_at_key(&event, &hras, &workloads, "acme/web").await.unwrap();
        assert!(target.is_none());
    }

    #[test]
    fn self_hosted_label_is_not_required_on_the_workload() {
        assert!(job_labels_satisfied(
            &["self-hosted".to_string(), "linux".to_string()],
            &["linux".to_string()]
        ));
    }
}

//! Named-runner-group candidate discovery and reduction (§4.2.3), the final
//! step in the search order.

use std::sync::Arc;

use crate::index::{enterprise_scope_key, org_scope_key};
use crate::model::{EventContext, ScaleTarget};
use crate::platform::PlatformGroupClient;
use crate::store::{HraRepository, WorkloadRepository};

use super::{job, trigger, Result};

pub(super) async fn resolve_named_groups(
    ctx: &EventContext,
    hras: &Arc<dyn HraRepository>,
    workloads: &Arc<dyn WorkloadRepository>,
    platform: Option<&Arc<dyn PlatformGroupClient>>,
    namespace: Option<&str>,
) -> Result<Option<ScaleTarget>> {
    let (enterprise_candidates, org_candidates) =
        candidate_groups(ctx, hras, workloads, namespace).await?;

    let (reachable_enterprise, reachable_org) = match platform {
        Some(client) => {
            client
                .reachable_runner_groups(
                    &ctx.owner_login,
                    &ctx.repo_name,
                    &enterprise_candidates,
                    &org_candidates,
                )
                .await?
        }
        // No platform client configured: trust the declarative candidate set as-is.
        None => (enterprise_candidates, org_candidates),
    };

    for group in &reachable_org {
        let key = org_scope_key(&ctx.owner_login, group);
        if let Some(target) = try_key(ctx, hras, workloads, &key).await? {
            return Ok(Some(target));
        }
    }

    for group in &reachable_enterprise {
        let key = enterprise_scope_key(&ctx.enterprise_slug, group);
        if let Some(target) = try_key(ctx, hras, workloads, &key).await? {
            return Ok(Some(target));
        }
    }

    Ok(None)
}

/// Mirrors `resolve`'s own per-key dispatch (kept private to this module so
/// the two named-runner-group loops above can reuse it without threading a
/// function pointer across an async boundary).
async fn try_key(
    ctx: &EventContext,
    hras: &Arc<dyn HraRepository>,
    workloads: &Arc<dyn WorkloadRepository>,
    key: &str,
) -> Result<Option<ScaleTarget>> {
    if ctx.event_kind == "workflow_job" {
        job::resolve_at_key(ctx, hras, workloads, key).await
    } else {
        trigger::resolve_at_key(ctx, hras, key).await
    }
}

/// Scans every HRA's target workload for a declared group under the event's
/// org/enterprise scope (§4.2.3). HRAs whose workload cannot be fetched are
/// silently skipped rather than failing the whole resolution: an unreachable
/// workload here just means it contributes no group candidate, not that the
/// webhook delivery itself is broken.
async fn candidate_groups(
    ctx: &EventContext,
    hras: &Arc<dyn HraRepository>,
    workloads: &Arc<dyn WorkloadRepository>,
    namespace: Option<&str>,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut enterprise_groups = Vec::new();
    let mut org_groups = Vec::new();

    for hra in hras.list(namespace).await? {
        let kind = hra.scale_target_ref.resolved_kind();
        let Ok(Some(workload)) = workloads.get(&hra.namespace, kind, &hra.scale_target_ref.name).await
        else {
            continue;
        };

        if workload.group.is_empty() {
            continue;
        }
        if !ctx.enterprise_slug.is_empty() && workload.enterprise == ctx.enterprise_slug {
            enterprise_groups.push(workload.group.clone());
        }
        if !ctx.owner_login.is_empty() && workload.organization == ctx.owner_login {
            org_groups.push(workload.group.clone());
        }
    }

    Ok((enterprise_groups, org_groups))
}

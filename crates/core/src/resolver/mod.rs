//! Scale-target resolver (§4.2): given a webhook's event context, finds the
//! unique HRA the event should scale.
//!
//! The search order is fixed (repo, then owner-scoped, then enterprise-scoped,
//! then named runner groups) and stops at the first step that yields exactly
//! one candidate. Ambiguity within a step - more than one HRA indexed under
//! the same key with a matching trigger - is deliberately treated the same as
//! "no match at this step", not as an error: it falls through to the next
//! step in the search order, and only surfaces as "no target" overall if no
//! later step resolves it either. This mirrors `getScaleTarget`'s behavior of
//! logging and continuing rather than aborting the whole search.

mod job;
mod named_groups;
mod trigger;

use std::sync::Arc;

use thiserror::Error;

use crate::model::{EventContext, OwnerType, ScaleTarget};
use crate::platform::{PlatformClientError, PlatformGroupClient};
use crate::store::{HraRepository, StoreError, WorkloadRepository};

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("workload {namespace}/{name} referenced by a candidate horizontalrunnerautoscaler was not found")]
    WorkloadNotFound { namespace: String, name: String },

    #[error("declarative store error: {0}")]
    Store(#[from] StoreError),

    #[error("platform client error: {0}")]
    Platform(#[from] PlatformClientError),
}

/// Event kinds the resolver knows how to match triggers against. Any other
/// `event_kind` (including `ping`, which the dispatcher handles before ever
/// reaching the resolver) yields `Ok(None)` without touching the store.
fn is_resolvable_event(event_kind: &str) -> bool {
    matches!(
        event_kind,
        "push" | "pull_request" | "check_run" | "workflow_job"
    )
}

/// Resolve `ctx` to the single HRA/trigger pair it should scale, or `None` if
/// no step in the search order produces a unique match.
///
/// `namespace` restricts the named-runner-group candidate scan (§4.2.3) to one
/// namespace; pass `None` to search across all namespaces the store knows about.
pub async fn resolve(
    ctx: &EventContext,
    hras: &Arc<dyn HraRepository>,
    workloads: &Arc<dyn WorkloadRepository>,
    platform: Option<&Arc<dyn PlatformGroupClient>>,
    namespace: Option<&str>,
) -> Result<Option<ScaleTarget>> {
    if !is_resolvable_event(&ctx.event_kind) {
        tracing::debug!(event_kind = %ctx.event_kind, "event kind is not subject to scale-target resolution");
        return Ok(None);
    }

    if let Some(key) = ctx.repo_scope_key() {
        if let Some(target) = try_key(ctx, hras, workloads, &key).await? {
            return Ok(Some(target));
        }
    }

    // A user-owned (non-organization) repository has no org or enterprise scope
    // to fall back to, and cannot declare named runner groups either.
    if ctx.owner_type == Some(OwnerType::User) {
        return Ok(None);
    }

    if !ctx.owner_login.is_empty() {
        let key = crate::index::org_scope_key(&ctx.owner_login, "");
        if let Some(target) = try_key(ctx, hras, workloads, &key).await? {
            return Ok(Some(target));
        }
    }

    if !ctx.enterprise_slug.is_empty() {
        let key = crate::index::enterprise_scope_key(&ctx.enterprise_slug, "");
        if let Some(target) = try_key(ctx, hras, workloads, &key).await? {
            return Ok(Some(target));
        }
    }

    named_groups::resolve_named_groups(ctx, hras, workloads, platform, namespace).await
}

/// Dispatches a single index-key lookup to the event-kind-specific matcher.
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

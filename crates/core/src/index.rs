//! Derivation of `scaleTarget` index keys (§3, §4.5).
//!
//! The index collapses repository/organization/enterprise/group scoping into a single
//! string key so the resolver can do a plain map lookup instead of scanning every HRA.

use crate::model::RunnerWorkload;

/// Index keys a workload should be discoverable under. A well-formed workload
/// populates exactly one of repository/organization/enterprise, so this normally
/// yields a single key, but each scope is evaluated independently.
pub fn index_keys_for_workload(workload: &RunnerWorkload) -> Vec<String> {
    let mut keys = Vec::with_capacity(1);

    if !workload.repository.is_empty() {
        keys.push(workload.repository.clone());
    }

    if !workload.organization.is_empty() {
        keys.push(org_scope_key(&workload.organization, &workload.group));
    }

    if !workload.enterprise.is_empty() {
        keys.push(enterprise_scope_key(&workload.enterprise, &workload.group));
    }

    keys
}

pub fn org_scope_key(owner: &str, group: &str) -> String {
    if group.is_empty() {
        owner.to_string()
    } else {
        format!("{}/group/{}", owner, group)
    }
}

pub fn enterprise_scope_key(slug: &str, group: &str) -> String {
    if group.is_empty() {
        format!("enterprises/{}", slug)
    } else {
        format!("enterprises/{}/group/{}", slug, group)
    }
}

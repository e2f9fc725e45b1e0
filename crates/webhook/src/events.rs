//! Webhook payload parsing (§4.4 steps 3-4): recovers the event-kind-specific
//! fields the resolver needs from the raw JSON body.

use arc_core::model::{EventContext, OwnerType};
use serde::Deserialize;

use crate::error::{DispatchError, Result};

#[derive(Deserialize)]
struct Owner {
    login: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct Repository {
    name: String,
    owner: Owner,
}

#[derive(Deserialize)]
struct GenericEventPayload {
    #[serde(default)]
    action: Option<String>,
    repository: Repository,
}

#[derive(Deserialize)]
struct WorkflowJobPayload {
    action: String,
    repository: Repository,
    workflow_job: WorkflowJob,
}

#[derive(Deserialize)]
struct WorkflowJob {
    #[serde(default)]
    labels: Vec<String>,
}

/// `{enterprise: {slug: "..."}}`, parsed separately because `enterprise` is
/// not present on every event type's top-level struct (§4.4 step 4).
#[derive(Deserialize, Default)]
struct EnterpriseSidecar {
    #[serde(default)]
    enterprise: Option<EnterpriseSlug>,
}

#[derive(Deserialize)]
struct EnterpriseSlug {
    slug: String,
}

fn owner_type(raw: &str) -> OwnerType {
    if raw.eq_ignore_ascii_case("organization") {
        OwnerType::Organization
    } else {
        OwnerType::User
    }
}

fn enterprise_slug(body: &[u8]) -> String {
    serde_json::from_slice::<EnterpriseSidecar>(body)
        .ok()
        .and_then(|s| s.enterprise)
        .map(|e| e.slug)
        .unwrap_or_default()
}

/// Parses `body` for `event_kind` into an [`EventContext`]. `push`,
/// `pull_request`, and `check_run` share a shape; `workflow_job` additionally
/// carries labels and forces the dispatcher-stamped `amount_hint`.
pub fn parse_event_context(event_kind: &str, body: &[u8]) -> Result<EventContext> {
    let enterprise_slug = enterprise_slug(body);

    if event_kind == "workflow_job" {
        let payload: WorkflowJobPayload =
            serde_json::from_slice(body).map_err(|source| DispatchError::PayloadParse {
                event_kind: event_kind.to_string(),
                source,
            })?;
        let amount_hint = match payload.action.as_str() {
            "queued" => Some(1),
            "completed" => Some(-1),
            _ => None,
        };
        return Ok(EventContext {
            repo_name: payload.repository.name,
            owner_login: payload.repository.owner.login,
            owner_type: Some(owner_type(&payload.repository.owner.kind)),
            enterprise_slug,
            event_kind: event_kind.to_string(),
            action: Some(payload.action),
            labels: payload.workflow_job.labels,
            amount_hint,
        });
    }

    let payload: GenericEventPayload =
        serde_json::from_slice(body).map_err(|source| DispatchError::PayloadParse {
            event_kind: event_kind.to_string(),
            source,
        })?;
    Ok(EventContext {
        repo_name: payload.repository.name,
        owner_login: payload.repository.owner.login,
        owner_type: Some(owner_type(&payload.repository.owner.kind)),
        enterprise_slug,
        event_kind: event_kind.to_string(),
        action: payload.action,
        labels: Vec::new(),
        amount_hint: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_job_queued_sets_amount_hint_positive() {
        let body = br#"{
            "action": "queued",
            "repository": {"name": "web", "owner": {"login": "acme", "type": "Organization"}},
            "workflow_job": {"labels": ["self-hosted", "linux"]}
        }"#;
        let ctx = parse_event_context("workflow_job", body).unwrap();
        assert_eq!(ctx.amount_hint, Some(1));
        assert_eq!(ctx.labels, vec!["self-hosted".to_string(), "linux".to_string()]);
        assert_eq!(ctx.owner_type, Some(OwnerType::Organization));
    }

    #[test]
    fn workflow_job_completed_sets_amount_hint_negative() {
        let body = br#"{
            "action": "completed",
            "repository": {"name": "web", "owner": {"login": "acme", "type": "Organization"}},
            "workflow_job": {"labels": []}
        }"#;
        let ctx = parse_event_context("workflow_job", body).unwrap();
        assert_eq!(ctx.amount_hint, Some(-1));
    }

    #[test]
    fn workflow_job_other_action_has_no_amount_hint() {
        let body = br#"{
            "action": "in_progress",
            "repository": {"name": "web", "owner": {"login": "acme", "type": "Organization"}},
            "workflow_job": {"labels": []}
        }"#;
        let ctx = parse_event_context("workflow_job", body).unwrap();
        assert_eq!(ctx.amount_hint, None);
    }

    #[test]
    fn enterprise_slug_recovered_from_sidecar_shape() {
        let body = br#"{
            "action": "opened",
            "repository": {"name": "web", "owner": {"login": "acme", "type": "Organization"}},
            "enterprise": {"slug": "contoso"}
        }"#;
        let ctx = parse_event_context("pull_request", body).unwrap();
        assert_eq!(ctx.enterprise_slug, "contoso");
    }

    #[test]
    fn push_event_has_no_action_field() {
        let body = br#"{
            "repository": {"name": "web", "owner": {"login": "acme", "type": "Organization"}}
        }"#;
        let ctx = parse_event_context("push", body).unwrap();
        assert_eq!(ctx.action, None);
    }

    #[test]
    fn user_owner_type_is_recognized() {
        let body = br#"{
            "repository": {"name": "dotfiles", "owner": {"login": "octocat", "type": "User"}}
        }"#;
        let ctx = parse_event_context("push", body).unwrap();
        assert_eq!(ctx.owner_type, Some(OwnerType::User));
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let err = parse_event_context("push", b"not json").unwrap_err();
        assert!(matches!(err, DispatchError::PayloadParse { .. }));
    }
}

//! Trigger-type matching for push/pull_request/check_run events (§4.2.1).

use std::sync::Arc;

use crate::model::{EventContext, Hra, ScaleTarget, ScaleUpTrigger};
use crate::store::HraRepository;

use super::Result;

pub(super) async fn resolve_at_key(
    ctx: &EventContext,
    hras: &Arc<dyn HraRepository>,
    key: &str,
) -> Result<Option<ScaleTarget>> {
    let candidates = hras.find_by_key(key).await?;
    let Some(hra) = pick_unique(&candidates) else {
        return Ok(None);
    };

    Ok(find_matching_trigger(hra, ctx.action.as_deref()).map(|trigger| ScaleTarget {
        hra: hra.clone(),
        duration: trigger.effective_duration(),
        amount: Some(trigger.amount),
    }))
}

/// A step yields a target only when exactly one HRA sits at the key. Finding
/// more than one is logged and treated as "nothing here", not an error -
/// it is an operator misconfiguration (two HRAs claiming the same scope) that
/// a human needs to resolve, not something this resolver should guess at.
fn pick_unique(candidates: &[Hra]) -> Option<&Hra> {
    match candidates.len() {
        0 => None,
        1 => Some(&candidates[0]),
        _ => {
            tracing::warn!(count = candidates.len(), "found too many scale targets");
            None
        }
    }
}

fn find_matching_trigger<'a>(hra: &'a Hra, action: Option<&str>) -> Option<&'a ScaleUpTrigger> {
    hra.scale_up_triggers
        .iter()
        .find(|trigger| trigger.matches_action(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OwnerType, ScaleTargetRef};
    use crate::store::InMemoryDeclarativeStore;

    fn hra(name: &str, triggers: Vec<ScaleUpTrigger>) -> Hra {
        Hra {
            name: name.to_string(),
            namespace: "default".to_string(),
            deletion_timestamp: None,
            scale_target_ref: ScaleTargetRef {
                kind: "RunnerDeployment".to_string(),
                name: "dep".to_string(),
            },
            scale_up_triggers: triggers,
            capacity_reservations: vec![],
            resource_version: 0,
        }
    }

    fn ctx(action: &str) -> EventContext {
        EventContext {
            repo_name: "web".to_string(),
            owner_login: "acme".to_string(),
            owner_type: Some(OwnerType::Organization),
            enterprise_slug: String::new(),
            event_kind: "pull_request".to_string(),
            action: Some(action.to_string()),
            labels: vec![],
            amount_hint: None,
        }
    }

    #[test]
    fn no_trigger_matching_the_action_is_a_no_op() {
        let hra_val = hra(
            "web-hra",
            vec![ScaleUpTrigger {
                github_event_types: vec!["closed".to_string()],
                amount: -1,
                duration: None,
            }],
        );
        assert!(find_matching_trigger(&hra_val, Some("opened")).is_none());
    }

    #[tokio::test]
    async fn resolve_at_key_returns_none_when_index_is_empty() {
        let store: Arc<dyn HraRepository> = Arc::new(InMemoryDeclarativeStore::new());
        let target = resolve_at_key(&ctx("opened"), &store, "acme/web").await.unwrap();
        assert!(target.is_none());
    }

    #[test]
    fn wildcard_trigger_matches_any_action() {
        let hra_val = hra("web-hra", vec![ScaleUpTrigger::default()]);
        assert!(find_matching_trigger(&hra_val, Some("anything")).is_some());
        assert!(find_matching_trigger(&hra_val, None).is_some());
    }

    #[test]
    fn pick_unique_logs_and_returns_none_for_multiple_candidates() {
        let candidates = vec![hra("a", vec![]), hra("b", vec![])];
        assert!(pick_unique(&candidates).is_none());
    }
}

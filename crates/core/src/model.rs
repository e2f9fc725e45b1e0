//! Domain types shared by the resolver, engine, and declarative-state stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which kind of GitHub account owns a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OwnerType {
    User,
    Organization,
}

/// The event-kind-specific fields a webhook delivery contributes to resolution.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub repo_name: String,
    pub owner_login: String,
    pub owner_type: Option<OwnerType>,
    pub enterprise_slug: String,
    pub event_kind: String,
    pub action: Option<String>,
    pub labels: Vec<String>,
    pub amount_hint: Option<i64>,
}

impl EventContext {
    /// `"<owner>/<repo>"`, empty if either half is unset.
    pub fn repo_scope_key(&self) -> Option<String> {
        if self.owner_login.is_empty() || self.repo_name.is_empty() {
            None
        } else {
            Some(format!("{}/{}", self.owner_login, self.repo_name))
        }
    }
}

/// Reference to the workload (`RunnerDeployment` or `RunnerSet`) an HRA scales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleTargetRef {
    /// `RunnerDeployment`, `RunnerSet`, or empty (treated as `RunnerDeployment`).
    pub kind: String,
    pub name: String,
}

impl ScaleTargetRef {
    pub fn resolved_kind(&self) -> WorkloadKind {
        match self.kind.as_str() {
            "RunnerSet" => WorkloadKind::RunnerSet,
            _ => WorkloadKind::RunnerDeployment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    RunnerDeployment,
    RunnerSet,
}

/// A single scale-up trigger clause on an HRA.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleUpTrigger {
    /// Event types this trigger matches for push/pull_request/check_run triggers.
    /// Empty means "matches any action".
    #[serde(default)]
    pub github_event_types: Vec<String>,
    #[serde(default)]
    pub amount: i64,
    /// Reservation TTL. `None` or non-positive means "use the 10-minute default".
    #[serde(default, with = "duration_seconds_opt")]
    pub duration: Option<Duration>,
}

pub(crate) const DEFAULT_TRIGGER_DURATION: Duration = Duration::from_secs(10 * 60);

impl ScaleUpTrigger {
    pub fn effective_duration(&self) -> Duration {
        match self.duration {
            Some(d) if d.as_secs() > 0 => d,
            _ => DEFAULT_TRIGGER_DURATION,
        }
    }

    pub fn matches_action(&self, action: Option<&str>) -> bool {
        if self.github_event_types.is_empty() {
            return true;
        }
        match action {
            None => false,
            Some(action) => self.github_event_types.iter().any(|t| t == action),
        }
    }
}

mod duration_seconds_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<u64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs))
    }
}

/// A pending, time-bounded capacity commitment on an HRA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReservation {
    pub expiration_time: DateTime<Utc>,
    pub replicas: i64,
}

impl CapacityReservation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time <= now
    }
}

/// HorizontalRunnerAutoscaler: the declarative autoscaling policy this core reads and patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hra {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub deletion_timestamp: Option<DateTime<Utc>>,
    pub scale_target_ref: ScaleTargetRef,
    #[serde(default)]
    pub scale_up_triggers: Vec<ScaleUpTrigger>,
    #[serde(default)]
    pub capacity_reservations: Vec<CapacityReservation>,
    /// Optimistic-concurrency token for the in-process declarative-state stand-in (§2.1).
    #[serde(default)]
    pub resource_version: u64,
}

impl Hra {
    pub fn is_being_deleted(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}

/// RunnerDeployment/RunnerSet: the read-only workload an HRA targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerWorkload {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub enterprise: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// The (HRA, trigger) pair the resolver selected for an event.
///
/// `amount` is populated from the matched trigger for push/pull_request/check_run
/// events; for workflow_job events the resolver leaves it `None` and the dispatcher
/// stamps `+1`/`-1` based on the `queued`/`completed` action (§4.2.2).
#[derive(Debug, Clone)]
pub struct ScaleTarget {
    pub hra: Hra,
    pub duration: Duration,
    pub amount: Option<i64>,
}

//! Capacity-reservation engine (§4.3): turns a signed delta into an HRA patch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CapacityReservation, Hra};
use crate::store::{HraRepository, StoreError};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("horizontalrunnerautoscaler {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("conflict patching {namespace}/{name}")]
    Conflict {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
}

impl From<(String, String, StoreError)> for EngineError {
    fn from((namespace, name, err): (String, String, StoreError)) -> Self {
        match err {
            StoreError::NotFound { .. } => EngineError::NotFound { namespace, name },
            conflict @ StoreError::Conflict { .. } => EngineError::Conflict {
                namespace,
                name,
                source: conflict,
            },
        }
    }
}

/// Apply `amount` (with TTL `duration` for positive amounts) to `hra`'s capacity
/// reservations and submit the optimistic patch. Returns the patched HRA.
///
/// `amount == 0` is coerced to `1`, matching the reference behavior (§4.3 step 5):
/// a scale request with no explicit magnitude still reserves one replica.
pub async fn apply_reservation_delta(
    repository: &Arc<dyn HraRepository>,
    hra: &Hra,
    amount: i64,
    duration: Duration,
) -> Result<Hra> {
    let now = Utc::now();
    let new_reservations = compute_reservations(&hra.capacity_reservations, amount, duration, now);

    repository
        .patch_capacity_reservations(&hra.namespace, &hra.name, hra.resource_version, new_reservations)
        .await
        .map_err(|err| (hra.namespace.clone(), hra.name.clone(), err).into())
}

/// Pure computation of the new reservation list (§4.3 steps 2-5), split out from the
/// store call so it can be property-tested without a repository in the loop.
pub fn compute_reservations(
    current: &[CapacityReservation],
    amount: i64,
    duration: Duration,
    now: DateTime<Utc>,
) -> Vec<CapacityReservation> {
    let amount = if amount == 0 { 1 } else { amount };

    let mut valid: Vec<CapacityReservation> = current
        .iter()
        .filter(|r| !r.is_expired(now))
        .cloned()
        .collect();

    if amount > 0 {
        let expiration_time = now
            + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::seconds(0));
        valid.push(CapacityReservation {
            expiration_time,
            replicas: amount,
        });
        return valid;
    }

    // amount < 0: drop the first reservation whose magnitude exactly cancels it (FIFO).
    if let Some(idx) = valid.iter().position(|r| r.replicas + amount == 0) {
        valid.remove(idx);
    }
    valid
}

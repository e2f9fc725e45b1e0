//! Registration-token cache (§4.1, §5): a single exclusive lock guards lookup,
//! insert, and sweep, mirroring the host-token rotation discipline this
//! codebase already uses for JWT-backed session tokens.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// Entries are considered usable until 3 minutes before their real expiry, so
/// a caller never receives a token that expires mid-registration.
const EXPIRY_SAFETY_MARGIN: i64 = 3 * 60;

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, CachedToken>,
}

#[derive(Clone, Default)]
pub struct RegistrationTokenCache {
    state: Arc<Mutex<State>>,
}

/// `"org=<o>,repo=<r>,enterprise=<e>"` (§6).
pub fn cache_key(enterprise: &str, org: &str, repo: &str) -> String {
    format!("org={org},repo={repo},enterprise={enterprise}")
}

impl RegistrationTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cached token if one exists and is not within the expiry
    /// safety margin of `now`; otherwise calls `issue` under the same lock
    /// that guards the cache, inserts the result, and schedules a sweep.
    pub async fn get_or_issue<F, E>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        issue: F,
    ) -> std::result::Result<String, E>
    where
        F: std::future::Future<Output = std::result::Result<CachedToken, E>>,
    {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.entries.get(key) {
            if cached.expires_at > now + Duration::seconds(EXPIRY_SAFETY_MARGIN) {
                return Ok(cached.token.clone());
            }
        }

        let issued = issue.await?;
        let token = issued.token.clone();
        state.entries.insert(key.to_string(), issued);
        drop(state);

        let cache = self.clone();
        tokio::spawn(async move {
            cache.sweep(Utc::now()).await;
        });

        Ok(token)
    }

    async fn sweep(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.entries.retain(|_, cached| cached.expires_at > now);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

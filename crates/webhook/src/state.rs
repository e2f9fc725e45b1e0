//! Shared application state (§4.4, §5): the declarative stores, the
//! Platform client, and the webhook secret, wired once at startup and
//! cloned cheaply into every request via axum's `State` extractor.

use std::sync::Arc;

use arc_core::platform::PlatformGroupClient;
use arc_core::store::{HraRepository, InMemoryDeclarativeStore, WorkloadRepository};
use arc_github::GithubClient;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    hras: Arc<dyn HraRepository>,
    workloads: Arc<dyn WorkloadRepository>,
    platform: Option<Arc<dyn PlatformGroupClient>>,
    webhook_secret: Option<Vec<u8>>,
    namespace: Option<String>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let store = InMemoryDeclarativeStore::new();
        let platform = has_configured_auth(config).then(|| {
            GithubClient::new(&config.github)
                .map(|client| Arc::new(client) as Arc<dyn PlatformGroupClient>)
        });
        let platform = match platform {
            Some(Ok(client)) => Some(client),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "failed to construct platform client, falling back to declarative-only resolution");
                None
            }
            None => None,
        };

        Self::with_stores(store.clone(), store, platform, config)
    }

    pub fn with_stores(
        hras: impl HraRepository + 'static,
        workloads: impl WorkloadRepository + 'static,
        platform: Option<Arc<dyn PlatformGroupClient>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                hras: Arc::new(hras),
                workloads: Arc::new(workloads),
                platform,
                webhook_secret: config.webhook_secret.clone(),
                namespace: config.namespace.clone(),
            }),
        }
    }

    pub fn hras(&self) -> &Arc<dyn HraRepository> {
        &self.inner.hras
    }

    pub fn workloads(&self) -> &Arc<dyn WorkloadRepository> {
        &self.inner.workloads
    }

    pub fn platform(&self) -> Option<&Arc<dyn PlatformGroupClient>> {
        self.inner.platform.as_ref()
    }

    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.webhook_secret.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }
}

fn has_configured_auth(config: &AppConfig) -> bool {
    let gh = &config.github;
    gh.token.is_some()
        || (gh.basicauth_username.is_some() && gh.basicauth_password.is_some())
        || (gh.app_id.is_some() && gh.app_installation_id.is_some() && gh.app_private_key.is_some())
}

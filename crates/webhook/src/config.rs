//! Typed configuration assembled from `ARC_*` environment variables (§3.1, §6).

use std::net::SocketAddr;

use arc_github::GithubClientConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub namespace: Option<String>,
    pub webhook_secret: Option<Vec<u8>>,
    pub github: GithubClientConfig,
    pub listen_addr: SocketAddr,
}

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            namespace: non_empty(std::env::var("ARC_NAMESPACE").ok()),
            webhook_secret: non_empty(std::env::var("ARC_WEBHOOK_SECRET").ok())
                .map(|s| s.into_bytes()),
            github: GithubClientConfig {
                enterprise_url: non_empty(std::env::var("ARC_GITHUB_ENTERPRISE_URL").ok()),
                app_id: non_empty(std::env::var("ARC_GITHUB_APP_ID").ok()),
                app_installation_id: non_empty(std::env::var("ARC_GITHUB_APP_INSTALLATION_ID").ok()),
                app_private_key: non_empty(std::env::var("ARC_GITHUB_APP_PRIVATE_KEY").ok()),
                token: non_empty(std::env::var("ARC_GITHUB_TOKEN").ok()),
                basicauth_username: non_empty(std::env::var("ARC_GITHUB_BASICAUTH_USERNAME").ok()),
                basicauth_password: non_empty(std::env::var("ARC_GITHUB_BASICAUTH_PASSWORD").ok()),
                url: non_empty(std::env::var("ARC_GITHUB_URL").ok()),
                upload_url: non_empty(std::env::var("ARC_GITHUB_UPLOAD_URL").ok()),
                runner_github_url: non_empty(std::env::var("ARC_GITHUB_RUNNER_URL").ok()),
            },
            listen_addr: std::env::var("ARC_LISTEN_ADDR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.parse().unwrap()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

//! Construction inputs for the Platform API client (§4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubClientConfig {
    pub enterprise_url: Option<String>,
    pub app_id: Option<String>,
    pub app_installation_id: Option<String>,
    pub app_private_key: Option<String>,
    pub token: Option<String>,
    pub basicauth_username: Option<String>,
    pub basicauth_password: Option<String>,
    pub url: Option<String>,
    pub upload_url: Option<String>,
    pub runner_github_url: Option<String>,
}

const PUBLIC_API_BASE_URL: &str = "https://api.github.com/";
const PUBLIC_GITHUB_BASE_URL: &str = "https://github.com/";

/// Resolved base URLs for a client instance, after enterprise-URL normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    pub api_base_url: String,
    pub upload_base_url: String,
    /// The browser-facing base URL runners are configured against (`GithubBaseURL`).
    pub github_base_url: String,
}

impl GithubClientConfig {
    pub fn resolve_base_urls(&self) -> BaseUrls {
        match &self.enterprise_url {
            None => BaseUrls {
                api_base_url: self
                    .url
                    .clone()
                    .map(|u| ensure_trailing_slash(&u))
                    .unwrap_or_else(|| PUBLIC_API_BASE_URL.to_string()),
                upload_base_url: self
                    .upload_url
                    .clone()
                    .map(|u| ensure_trailing_slash(&u))
                    .unwrap_or_else(|| PUBLIC_API_BASE_URL.to_string()),
                github_base_url: self
                    .runner_github_url
                    .clone()
                    .unwrap_or_else(|| PUBLIC_GITHUB_BASE_URL.to_string()),
            },
            Some(enterprise) => {
                let api_base_url = normalize_enterprise_url(enterprise);
                let github_base_url = self
                    .runner_github_url
                    .clone()
                    .unwrap_or_else(|| api_base_url.replace("api/v3/", ""));
                BaseUrls {
                    api_base_url: api_base_url.clone(),
                    upload_base_url: api_base_url,
                    github_base_url,
                }
            }
        }
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Trailing slash ensured; `api/v3/` appended unless already present or the
/// host is a `api.*`/`.api.` GitHub API host (§4.1).
fn normalize_enterprise_url(url: &str) -> String {
    let url = ensure_trailing_slash(url);
    let host_is_api = url.contains("://api.") || url.contains(".api.");
    if url.ends_with("api/v3/") || host_is_api {
        url
    } else {
        format!("{}api/v3/", url)
    }
}

//! Platform API client (§4.1): authenticated REST access plus the
//! registration-token cache. Endpoint wrappers are deliberately thin - the
//! interesting logic lives in scope dispatch, pagination, and
//! `GetRunnerGroupsFromRepository`'s two-level reachability check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;

use arc_core::platform::{PlatformClientError, PlatformGroupClient};

use crate::auth::{issue_installation_jwt, AuthMode};
use crate::config::{BaseUrls, GithubClientConfig};
use crate::error::{PlatformApiError, Result};
use crate::metrics::instrumented;
use crate::token_cache::{cache_key, CachedToken, RegistrationTokenCache};

pub struct GithubClient {
    http: Client,
    auth: Option<AuthMode>,
    base_urls: BaseUrls,
    token_cache: RegistrationTokenCache,
}

/// One of the three scopes an endpoint dispatches on (§4.1 scope dispatch).
#[derive(Debug)]
enum Scope {
    Repo { owner: String, repo: String },
    Org { org: String },
    Enterprise { enterprise: String },
}

fn resolve_scope(enterprise: &str, org: &str, repo: &str) -> Result<Scope> {
    if !repo.is_empty() {
        let mut parts = repo.splitn(2, '/');
        let (Some(owner), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PlatformApiError::invalid_repository_name(repo));
        };
        if owner.is_empty() || name.is_empty() {
            return Err(PlatformApiError::invalid_repository_name(repo));
        }
        return Ok(Scope::Repo {
            owner: owner.to_string(),
            repo: name.to_string(),
        });
    }
    if !org.is_empty() {
        return Ok(Scope::Org { org: org.to_string() });
    }
    if !enterprise.is_empty() {
        return Ok(Scope::Enterprise {
            enterprise: enterprise.to_string(),
        });
    }
    Err(PlatformApiError::validation(
        "enterprise, organization and repository are all empty",
    ))
}

impl GithubClient {
    pub fn new(config: &GithubClientConfig) -> Result<Self> {
        let auth = AuthMode::select(config)?;
        Ok(Self {
            http: Client::new(),
            auth,
            base_urls: config.resolve_base_urls(),
            token_cache: RegistrationTokenCache::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_urls.api_base_url, path.trim_start_matches('/'))
    }

    async fn authorization_header(&self) -> Result<Option<(&'static str, String)>> {
        match &self.auth {
            None => Ok(None),
            Some(AuthMode::Token(token)) => Ok(Some(("Authorization", format!("Bearer {token}")))),
            Some(AuthMode::Basic { username, password }) => {
                let encoded = base64_basic_auth(username, password);
                Ok(Some(("Authorization", format!("Basic {encoded}"))))
            }
            Some(AuthMode::AppInstallation {
                app_id,
                installation_id,
                private_key_pem,
            }) => {
                let installation_token = self.installation_access_token(app_id, installation_id, private_key_pem).await?;
                Ok(Some(("Authorization", format!("Bearer {installation_token}"))))
            }
        }
    }

    /// Exchanges a freshly-issued installation JWT for an installation access
    /// token. Not cached beyond the registration-token cache's own reuse of
    /// this path for the scope-dispatched create calls below - GitHub
    /// installation tokens are already short-lived (1 hour), so re-issuing
    /// a signing JWT per call favors simplicity over shaving one round trip.
    async fn installation_access_token(
        &self,
        app_id: &str,
        installation_id: &str,
        private_key_pem: &[u8],
    ) -> Result<String> {
        let jwt = issue_installation_jwt(app_id, private_key_pem)?;
        let path = format!("app/installations/{installation_id}/access_tokens");
        let response = instrumented("app", &Method::POST, &path, || {
            self.http
                .post(self.url(&path))
                .bearer_auth(&jwt)
                .header("User-Agent", "runner-autoscaler")
                .send()
        })
        .await?;

        if response.status() != StatusCode::CREATED {
            return Err(http_error(&path, response).await);
        }

        #[derive(Deserialize)]
        struct AccessTokenResponse {
            token: String,
        }
        let body: AccessTokenResponse = response.json().await?;
        Ok(body.token)
    }

    async fn request(
        &self,
        scope_label: &str,
        method: Method,
        path: &str,
    ) -> Result<reqwest::Response> {
        let auth_header = self.authorization_header().await?;
        let url = self.url(path);
        let response = instrumented(scope_label, &method, path, || {
            let mut req = self
                .http
                .request(method.clone(), &url)
                .header("User-Agent", "runner-autoscaler");
            if let Some((name, value)) = &auth_header {
                req = req.header(*name, value);
            }
            req.send()
        })
        .await?;
        Ok(response)
    }

    /// GET registration tokens (repo/org/enterprise scoped endpoints), cached
    /// under a single exclusive lock keyed by `"org=<o>,repo=<r>,enterprise=<e>"`.
    pub async fn get_registration_token(
        &self,
        enterprise: &str,
        org: &str,
        repo: &str,
        name: &str,
    ) -> Result<String> {
        let scope = resolve_scope(enterprise, org, repo)?;
        let key = cache_key(enterprise, org, repo);
        let path = registration_token_path(&scope);
        let scope_label = scope_label(&scope);

        self.token_cache
            .get_or_issue(&key, Utc::now(), async {
                let response = self.request(scope_label, Method::POST, &path).await?;
                if response.status() != StatusCode::CREATED {
                    return Err(http_error(&path, response).await);
                }
                #[derive(Deserialize)]
                struct TokenResponse {
                    token: String,
                    expires_at: DateTime<Utc>,
                }
                let body: TokenResponse = response.json().await?;
                tracing::debug!(runner_name = name, "issued registration token");
                Ok(CachedToken {
                    token: body.token,
                    expires_at: body.expires_at,
                })
            })
            .await
    }

    pub async fn remove_runner(
        &self,
        enterprise: &str,
        org: &str,
        repo: &str,
        runner_id: u64,
    ) -> Result<()> {
        let scope = resolve_scope(enterprise, org, repo)?;
        let path = format!("{}/runners/{runner_id}", scope_base_path(&scope));
        let response = self.request(scope_label(&scope), Method::DELETE, &path).await?;
        if response.status() != StatusCode::NO_CONTENT {
            return Err(http_error(&path, response).await);
        }
        Ok(())
    }

    /// Paginated `per_page=100` until the response carries no further `Link: rel="next"`.
    pub async fn list_runners(&self, enterprise: &str, org: &str, repo: &str) -> Result<Vec<Runner>> {
        let scope = resolve_scope(enterprise, org, repo)?;
        let first_page = format!("{}/runners?per_page=100", scope_base_path(&scope));
        self.paginate(scope_label(&scope), &first_page, |page: RunnersPage| page.runners)
            .await
    }

    /// `Ok(busy)` when the runner is online; `Err(RunnerOffline)` when it
    /// isn't, still carrying the busy flag the runner last reported (§7).
    pub async fn is_runner_busy(
        &self,
        enterprise: &str,
        org: &str,
        repo: &str,
        name: &str,
    ) -> Result<bool> {
        let runners = self.list_runners(enterprise, org, repo).await?;
        let runner = runners
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| PlatformApiError::RunnerNotFound { name: name.to_string() })?;
        if runner.status != "online" {
            return Err(PlatformApiError::RunnerOffline {
                name: name.to_string(),
                busy: runner.busy,
            });
        }
        Ok(runner.busy)
    }

    /// status ∈ {queued, in_progress}, concatenated (§4.1).
    pub async fn list_repository_workflow_runs(&self, owner: &str, repo: &str) -> Result<Vec<WorkflowRun>> {
        let mut runs = Vec::new();
        for status in ["queued", "in_progress"] {
            let first_page = format!("repos/{owner}/{repo}/actions/runs?status={status}&per_page=100");
            let mut page = self
                .paginate("repo", &first_page, |page: WorkflowRunsPage| page.workflow_runs)
                .await?;
            runs.append(&mut page);
        }
        Ok(runs)
    }

    async fn paginate<T, P>(
        &self,
        scope_label: &str,
        first_page: &str,
        extract: impl Fn(P) -> Vec<T>,
    ) -> Result<Vec<T>>
    where
        P: for<'de> Deserialize<'de>,
    {
        let mut items = Vec::new();
        let mut next_path = Some(first_page.to_string());

        while let Some(path) = next_path.take() {
            let response = self.request(scope_label, Method::GET, &path).await?;
            if response.status() != StatusCode::OK {
                return Err(http_error(&path, response).await);
            }
            next_path = next_link(&response).map(|url| strip_base(&self.base_urls.api_base_url, &url));
            let page: P = response.json().await?;
            items.extend(extract(page));
        }

        Ok(items)
    }
}

#[async_trait]
impl PlatformGroupClient for GithubClient {
    async fn reachable_runner_groups(
        &self,
        org: &str,
        repo: &str,
        candidate_enterprise_groups: &[String],
        candidate_org_groups: &[String],
    ) -> std::result::Result<(Vec<String>, Vec<String>), PlatformClientError> {
        if org.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let groups = self
            .list_organization_runner_groups(org)
            .await
            .map_err(|err| PlatformClientError::Request(err.to_string()))?;

        let mut enterprise_groups = Vec::new();
        let mut org_groups = Vec::new();

        for group in groups {
            if group.inherited {
                if !candidate_enterprise_groups.iter().any(|g| g == &group.name) {
                    continue;
                }
                if group.visibility == "all" {
                    enterprise_groups.push(group.name);
                    continue;
                }
                if self
                    .group_grants_repository_access(org, group.id, owner_repo(org, repo))
                    .await
                    .map_err(|err| PlatformClientError::Request(err.to_string()))?
                {
                    enterprise_groups.push(group.name);
                }
            } else {
                if !candidate_org_groups.iter().any(|g| g == &group.name) {
                    continue;
                }
                if group.visibility == "all" {
                    org_groups.push(group.name);
                    continue;
                }
                if self
                    .group_grants_repository_access(org, group.id, owner_repo(org, repo))
                    .await
                    .map_err(|err| PlatformClientError::Request(err.to_string()))?
                {
                    org_groups.push(group.name);
                }
            }
        }

        Ok((enterprise_groups, org_groups))
    }
}

impl GithubClient {
    async fn list_organization_runner_groups(&self, org: &str) -> Result<Vec<RunnerGroup>> {
        let first_page = format!("orgs/{org}/actions/runner-groups?per_page=100");
        self.paginate("org", &first_page, |page: RunnerGroupsPage| page.runner_groups)
            .await
    }

    /// Paginates `ListRepositoryAccessRunnerGroup(org, group_id)` until
    /// `owner/repo` appears in `full_name` of any listed repository.
    async fn group_grants_repository_access(
        &self,
        org: &str,
        group_id: u64,
        target_full_name: String,
    ) -> Result<bool> {
        let first_page = format!("orgs/{org}/actions/runner-groups/{group_id}/repositories?per_page=100");
        let repos: Vec<RepositoryRef> = self
            .paginate("org", &first_page, |page: RepositoriesPage| page.repositories)
            .await?;
        Ok(repos.iter().any(|r| r.full_name == target_full_name))
    }
}

fn owner_repo(owner: &str, repo: &str) -> String {
    format!("{owner}/{repo}")
}

fn registration_token_path(scope: &Scope) -> String {
    format!("{}/actions/runners/registration-token", scope_base_path(scope))
}

fn scope_base_path(scope: &Scope) -> String {
    match scope {
        Scope::Repo { owner, repo } => format!("repos/{owner}/{repo}"),
        Scope::Org { org } => format!("orgs/{org}"),
        Scope::Enterprise { enterprise } => format!("enterprises/{enterprise}"),
    }
}

fn scope_label(scope: &Scope) -> &'static str {
    match scope {
        Scope::Repo { .. } => "repo",
        Scope::Org { .. } => "org",
        Scope::Enterprise { .. } => "enterprise",
    }
}

async fn http_error(path: &str, response: reqwest::Response) -> PlatformApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    PlatformApiError::Http {
        status,
        path: path.to_string(),
        body,
    }
}

fn next_link(response: &reqwest::Response) -> Option<String> {
    let header = response.headers().get("link")?.to_str().ok()?;
    parse_next_link(header)
}

fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let url_segment = segments.next()?.trim();
        let is_next = segments.any(|s| s.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        Some(
            url_segment
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string(),
        )
    })
}

fn strip_base(base: &str, url: &str) -> String {
    url.strip_prefix(base).unwrap_or(url).to_string()
}

fn base64_basic_auth(username: &str, password: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Runner {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub busy: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub status: String,
}

#[derive(Deserialize)]
struct RunnersPage {
    #[serde(default)]
    runners: Vec<Runner>,
}

#[derive(Deserialize)]
struct WorkflowRunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct RunnerGroup {
    id: u64,
    name: String,
    visibility: String,
    inherited: bool,
}

#[derive(Deserialize)]
struct RunnerGroupsPage {
    #[serde(default)]
    runner_groups: Vec<RunnerGroup>,
}

#[derive(Deserialize)]
struct RepositoryRef {
    full_name: String,
}

#[derive(Deserialize)]
struct RepositoriesPage {
    #[serde(default)]
    repositories: Vec<RepositoryRef>,
}


/// HTTP-layer tests against a mocked Platform API, grounded on the
/// `wiremock`-based request/response fixtures used elsewhere in the pack for
/// GitHub API clients (`other_examples/XAMPPRocky-octocrab`).
#[cfg(test)]
mod wiremock_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client_for(mock_server: &MockServer) -> GithubClient {
        let config = GithubClientConfig {
            url: Some(mock_server.uri()),
            token: Some("test-token".to_string()),
            ..Default::default()
        };
        GithubClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn paginate_follows_the_link_header_across_pages() {
        let mock_server = MockServer::start().await;
        let base = format!("{}/", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/orgs/acme/runners"))
            .respond_with(move |req: &Request| {
                let on_page_two = req
                    .url
                    .query_pairs()
                    .any(|(k, v)| k == "page" && v == "2");
                if on_page_two {
                    ResponseTemplate::new(200).set_body_json(json!({
                        "runners": [{"id": 2, "name": "runner-b", "status": "online", "busy": false}]
                    }))
                } else {
                    ResponseTemplate::new(200)
                        .insert_header(
                            "link",
                            format!("<{base}orgs/acme/runners?per_page=100&page=2>; rel=\"next\""),
                        )
                        .set_body_json(json!({
                            "runners": [{"id": 1, "name": "runner-a", "status": "online", "busy": true}]
                        }))
                }
            })
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let runners = client.list_runners("", "acme", "").await.unwrap();
        assert_eq!(runners.len(), 2);
        assert_eq!(runners[0].name, "runner-a");
        assert_eq!(runners[1].name, "runner-b");
    }

    #[tokio::test]
    async fn get_registration_token_hits_the_repo_scoped_endpoint_and_is_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/web/actions/runners/registration-token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": "AABBCC",
                "expires_at": (chrono::Utc::now() + chrono::Duration::minutes(30)).to_rfc3339(),
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let first = client
            .get_registration_token("", "", "acme/web", "runner-1")
            .await
            .unwrap();
        let second = client
            .get_registration_token("", "", "acme/web", "runner-1")
            .await
            .unwrap();
        assert_eq!(first, "AABBCC");
        assert_eq!(second, "AABBCC");
    }

    #[tokio::test]
    async fn reachable_runner_groups_falls_back_from_enterprise_to_org() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orgs/acme/actions/runner-groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "runner_groups": [
                    {"id": 1, "name": "ent-group", "visibility": "all", "inherited": true},
                    {"id": 2, "name": "org-group", "visibility": "all", "inherited": false},
                    {"id": 3, "name": "ent-private", "visibility": "selected", "inherited": true},
                    {"id": 4, "name": "unrelated-group", "visibility": "all", "inherited": false},
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/orgs/acme/actions/runner-groups/3/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "repositories": [{"full_name": "acme/web"}]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (enterprise, org) = client
            .reachable_runner_groups(
                "acme",
                "web",
                &["ent-group".to_string(), "ent-private".to_string()],
                &["org-group".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(enterprise, vec!["ent-group".to_string(), "ent-private".to_string()]);
        assert_eq!(org, vec!["org-group".to_string()]);
    }

    #[tokio::test]
    async fn reachable_runner_groups_excludes_inaccessible_private_group() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orgs/acme/actions/runner-groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "runner_groups": [
                    {"id": 3, "name": "ent-private", "visibility": "selected", "inherited": true},
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/orgs/acme/actions/runner-groups/3/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "repositories": [{"full_name": "acme/other"}]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (enterprise, org) = client
            .reachable_runner_groups("acme", "web", &["ent-private".to_string()], &[])
            .await
            .unwrap();

        assert!(enterprise.is_empty());
        assert!(org.is_empty());
    }
}

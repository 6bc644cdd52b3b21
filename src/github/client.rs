use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::types::{SearchPage, SearchRequest, TokenScopes};
use super::{GitHubApi, GitHubError, API_VERSION};

const USER_AGENT: &str = "pr-digest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `GitHubApi` backed by reqwest, authenticating every request with a bearer token.
pub struct HttpGitHubClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpGitHubClient {
    /// Build a client for the API rooted at `base_url`
    /// (`https://api.github.com`, or `https://<host>/api/v3` for Enterprise).
    pub fn new(token: impl Into<String>, base_url: &str) -> Result<Self, GitHubError> {
        let mut parsed =
            Url::parse(base_url).map_err(|_| GitHubError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(GitHubError::InvalidBaseUrl(base_url.to_string()));
        }
        // Url::join replaces the last path segment unless the base ends in '/'.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: parsed,
            token: token.into(),
        })
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, GitHubError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|_| GitHubError::InvalidBaseUrl(self.base_url.to_string()))?;
        Ok(self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json"))
    }
}

/// Turn non-2xx responses into `GitHubError::Status`, keeping the body GitHub sent.
async fn check_status(response: Response) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(status_error(status, response.text().await))
}

/// An unreadable body is logged and reported as empty.
fn status_error(status: StatusCode, body: Result<String, reqwest::Error>) -> GitHubError {
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            debug!(status = status.as_u16(), error = %err, "failed to read error response body");
            String::new()
        }
    };
    GitHubError::Status {
        status: status.as_u16(),
        body,
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl GitHubApi for HttpGitHubClient {
    #[instrument(skip(self))]
    async fn authenticated_user(&self) -> Result<String, GitHubError> {
        #[derive(serde::Deserialize)]
        struct User {
            login: String,
        }

        debug!("fetching authenticated user");
        let response = check_status(self.get("user")?.send().await?).await?;
        let user: User = decode(response).await?;
        Ok(user.login)
    }

    #[instrument(skip(self))]
    async fn token_scopes(&self) -> Result<Option<TokenScopes>, GitHubError> {
        let response = self
            .get("user")?
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;
        let response = check_status(response).await?;

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|value| value.to_str().ok())
            .map(TokenScopes::parse);
        Ok(scopes)
    }

    #[instrument(skip(self))]
    async fn list_private_repos(&self, per_page: u8) -> Result<usize, GitHubError> {
        let response = self
            .get("user/repos")?
            .query(&[("visibility", "private".to_string()), ("per_page", per_page.to_string())])
            .send()
            .await?;
        let repos: Vec<serde_json::Value> = decode(check_status(response).await?).await?;
        Ok(repos.len())
    }

    #[instrument(skip(self, request), fields(page = request.page, per_page = request.per_page))]
    async fn search_issues(&self, request: &SearchRequest) -> Result<SearchPage, GitHubError> {
        debug!(q = %request.query, "searching issues");
        let response = self
            .get("search/issues")?
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(&[
                ("q", request.query.clone()),
                ("order", "desc".to_string()),
                ("advanced_search", "true".to_string()),
                ("per_page", request.per_page.to_string()),
                ("page", request.page.to_string()),
            ])
            .send()
            .await?;
        decode(check_status(response).await?).await
    }
}

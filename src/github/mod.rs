pub mod client;
pub mod types;

pub use client::HttpGitHubClient;
pub use types::{SearchPage, SearchRequest, TokenScopes};

use async_trait::async_trait;
use thiserror::Error;

/// REST API version pinned on version-sensitive requests.
pub const API_VERSION: &str = "2022-11-28";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode GitHub API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid GitHub API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// The subset of the GitHub REST API the pull request service talks to.
/// Implementations must be Send + Sync so a service can be shared across tasks.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Login of the user the token belongs to (`GET /user`).
    async fn authenticated_user(&self) -> Result<String, GitHubError>;

    /// Scopes granted to the token. `None` when GitHub sends no
    /// `X-OAuth-Scopes` header (fine-grained tokens, GitHub Apps).
    async fn token_scopes(&self) -> Result<Option<TokenScopes>, GitHubError>;

    /// Number of private repositories visible to the token, up to `per_page`.
    async fn list_private_repos(&self, per_page: u8) -> Result<usize, GitHubError>;

    /// One page of `GET /search/issues`.
    async fn search_issues(&self, request: &SearchRequest) -> Result<SearchPage, GitHubError>;
}

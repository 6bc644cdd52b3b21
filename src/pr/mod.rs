pub mod query;
pub mod types;
pub mod validate;

pub use query::{DateRange, Login, QueryError, DEFAULT_LOOKBACK_DAYS};
pub use types::{Digest, PrState, PullRequest};
pub use validate::ValidationError;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::github::{GitHubApi, GitHubError, SearchRequest, TokenScopes};

/// GitHub never returns more than 100 search results per page.
pub const MAX_PER_PAGE: u8 = 100;

/// The search API serves only the first 1000 matches of any query.
pub const SEARCH_RESULT_LIMIT: u32 = 1000;

/// How many private repositories the diagnostic probe asks for.
const PROBE_REPO_LIMIT: u8 = 5;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to resolve the authenticated user: {0}")]
    Auth(#[source] GitHubError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Pull request search failed: {0}")]
    Search(#[source] GitHubError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Knobs for how a search is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Results requested per page, clamped to 1..=100
    pub per_page: u8,
    /// Upper bound on pages fetched; 1 means first page only
    pub max_pages: u32,
    /// Run the token diagnostic probe before searching
    pub probe: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: MAX_PER_PAGE,
            // the search API stops at 1000 results
            max_pages: 10,
            probe: true,
        }
    }
}

/// Finds the pull requests the token's owner opened in a lookback window.
pub struct PullRequestService<C> {
    client: C,
    token_hint: String,
    options: SearchOptions,
    today: fn() -> NaiveDate,
}

impl<C: GitHubApi> PullRequestService<C> {
    /// `token` is only used for diagnostics here; `client` carries the credential.
    pub fn new(client: C, token: &str, options: SearchOptions) -> Self {
        Self {
            client,
            token_hint: token_hint(token),
            options,
            today: query::utc_today,
        }
    }

    /// Replace the clock that decides what "today" is.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Login of the token's owner. Any failure, including transport errors,
    /// is an authentication failure and is not retried.
    #[instrument(skip(self))]
    pub async fn resolve_identity(&self) -> Result<Login, ServiceError> {
        let raw = self
            .client
            .authenticated_user()
            .await
            .map_err(ServiceError::Auth)?;
        debug!(login = %raw, "resolved authenticated user");
        Ok(Login::parse(&raw)?)
    }

    /// Window of `days` ending today.
    pub fn compute_date_range(&self, days: i64) -> Result<DateRange, ServiceError> {
        Ok(query::compute_date_range(days, (self.today)())?)
    }

    /// Scopes granted to the token. Failures are logged and reported as `None`.
    #[instrument(skip(self))]
    pub async fn check_token_scopes(&self) -> Option<TokenScopes> {
        match self.client.token_scopes().await {
            Ok(Some(scopes)) => {
                info!(scopes = %scopes, "token scopes");
                Some(scopes)
            }
            Ok(None) => {
                info!("token reported no OAuth scopes");
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to check token scopes");
                None
            }
        }
    }

    /// Log what the token can see. Never fails.
    #[instrument(skip(self, login), fields(login = %login))]
    async fn probe(&self, login: &Login) {
        info!(login = %login, "authenticated user");
        self.check_token_scopes().await;

        match self.client.list_private_repos(PROBE_REPO_LIMIT).await {
            Ok(count) => info!(count, "private repos accessible"),
            Err(err) => warn!(error = %err, "token permission probe failed"),
        }
    }

    /// Run `query` against the search API and validate every item.
    ///
    /// Pages are fetched in order until a short page, `total_count` items,
    /// `max_pages`, or the search API's 1000-result ceiling, whichever comes
    /// first. Items keep the order GitHub
    /// returned them in.
    #[instrument(skip(self))]
    pub async fn fetch_and_validate(&self, query: &str) -> Result<Vec<PullRequest>, ServiceError> {
        let per_page = self.options.per_page.clamp(1, MAX_PER_PAGE);
        let max_pages = self.options.max_pages.max(1);
        let mut pull_requests: Vec<PullRequest> = Vec::new();
        let mut page = 1;

        loop {
            let request = SearchRequest {
                query: query.to_string(),
                page,
                per_page,
            };
            let response = self
                .client
                .search_issues(&request)
                .await
                .map_err(ServiceError::Search)?;
            let fetched = response.items.len();
            debug!(page, fetched, total_count = response.total_count, "fetched search page");
            if response.incomplete_results {
                warn!(page, "GitHub reported incomplete search results");
            }

            let validated = validate::validate_items(response.items, pull_requests.len())?;
            pull_requests.extend(validated);

            let exhausted = fetched < usize::from(per_page)
                || pull_requests.len() as u64 >= response.total_count;
            if exhausted {
                break;
            }
            if page * u32::from(per_page) >= SEARCH_RESULT_LIMIT {
                warn!(
                    limit = SEARCH_RESULT_LIMIT,
                    fetched = pull_requests.len(),
                    total_count = response.total_count,
                    "search result ceiling reached, remaining results not fetched"
                );
                break;
            }
            if page >= max_pages {
                warn!(
                    max_pages,
                    fetched = pull_requests.len(),
                    total_count = response.total_count,
                    "page limit reached, remaining results not fetched"
                );
                break;
            }
            page += 1;
        }

        Ok(pull_requests)
    }

    /// The authenticated user's pull requests created in the last `days` days
    /// (default 100), in the order GitHub returned them, together with the
    /// login, window and query that produced them.
    /// Identity failure aborts before any search is issued.
    #[instrument(skip(self))]
    pub async fn get_user_pull_requests_by_days(
        &self,
        days: Option<i64>,
    ) -> Result<Digest, ServiceError> {
        let login = self.resolve_identity().await?;
        let range = self.compute_date_range(days.unwrap_or(DEFAULT_LOOKBACK_DAYS))?;
        let query = query::build_query(&login, &range);
        info!(token = %self.token_hint, login = %login, %range, "searching pull requests");

        if self.options.probe {
            self.probe(&login).await;
        }

        let pull_requests = self.fetch_and_validate(&query).await?;
        info!(count = pull_requests.len(), "pull requests found");

        Ok(Digest {
            login,
            range,
            query,
            pull_requests,
        })
    }
}

/// First ten characters of the token, for logs.
fn token_hint(token: &str) -> String {
    let prefix: String = token.chars().take(10).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::SearchPage;
    use crate::pr::validate::tests::search_item;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory GitHub that records every call it receives.
    struct FakeGitHub {
        login: Option<String>,
        scopes_fail: bool,
        repos_fail: bool,
        total_count: u64,
        pages: Vec<Vec<serde_json::Value>>,
        calls: Mutex<Vec<String>>,
        searches: Mutex<Vec<SearchRequest>>,
    }

    impl FakeGitHub {
        fn new(login: &str) -> Self {
            Self {
                login: Some(login.to_string()),
                scopes_fail: false,
                repos_fail: false,
                total_count: 0,
                pages: Vec::new(),
                calls: Mutex::new(Vec::new()),
                searches: Mutex::new(Vec::new()),
            }
        }

        fn with_pages(mut self, total_count: u64, pages: Vec<Vec<serde_json::Value>>) -> Self {
            self.total_count = total_count;
            self.pages = pages;
            self
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    fn unavailable() -> GitHubError {
        GitHubError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[async_trait]
    impl GitHubApi for FakeGitHub {
        async fn authenticated_user(&self) -> Result<String, GitHubError> {
            self.record("user");
            self.login.clone().ok_or(GitHubError::Status {
                status: 401,
                body: "Bad credentials".to_string(),
            })
        }

        async fn token_scopes(&self) -> Result<Option<TokenScopes>, GitHubError> {
            self.record("scopes");
            if self.scopes_fail {
                return Err(unavailable());
            }
            Ok(Some(TokenScopes::parse("repo")))
        }

        async fn list_private_repos(&self, _per_page: u8) -> Result<usize, GitHubError> {
            self.record("repos");
            if self.repos_fail {
                return Err(unavailable());
            }
            Ok(2)
        }

        async fn search_issues(&self, request: &SearchRequest) -> Result<SearchPage, GitHubError> {
            self.record("search");
            self.searches.lock().unwrap().push(request.clone());
            let items = self
                .pages
                .get(request.page as usize - 1)
                .cloned()
                .unwrap_or_default();
            Ok(SearchPage {
                total_count: self.total_count,
                incomplete_results: false,
                items,
            })
        }
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 11).unwrap()
    }

    fn service(fake: FakeGitHub, options: SearchOptions) -> PullRequestService<FakeGitHub> {
        PullRequestService::new(fake, "ghp_abcdefghijklmnop", options).with_clock(fixed_today)
    }

    fn items(numbers: std::ops::RangeInclusive<u64>) -> Vec<serde_json::Value> {
        numbers.map(|n| search_item(n, "open")).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_builds_default_window_query() {
        let fake = FakeGitHub::new("alice").with_pages(2, vec![items(1..=2)]);
        let svc = service(fake, SearchOptions::default());

        let digest = svc.get_user_pull_requests_by_days(None).await.unwrap();
        assert_eq!(digest.login.as_str(), "alice");
        assert_eq!(
            digest.query,
            "type:pr author:alice created:2025-01-01..2025-04-11"
        );
        assert_eq!(digest.pull_requests.len(), 2);

        let searches = svc.client.searches.lock().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].query, digest.query);
        assert_eq!(searches[0].page, 1);
        assert_eq!(searches[0].per_page, MAX_PER_PAGE);
    }

    #[tokio::test]
    async fn test_calls_run_in_order() {
        let fake = FakeGitHub::new("alice").with_pages(1, vec![items(1..=1)]);
        let svc = service(fake, SearchOptions::default());

        svc.get_user_pull_requests_by_days(Some(7)).await.unwrap();
        let calls = svc.client.calls.lock().unwrap();
        assert_eq!(*calls, ["user", "scopes", "repos", "search"]);
    }

    #[tokio::test]
    async fn test_custom_days_window() {
        let fake = FakeGitHub::new("alice");
        let svc = service(fake, SearchOptions::default());

        let digest = svc.get_user_pull_requests_by_days(Some(0)).await.unwrap();
        assert_eq!(digest.range.start, digest.range.end);
        assert!(digest.query.ends_with("created:2025-04-11..2025-04-11"));
        assert!(digest.pull_requests.is_empty());
    }

    #[tokio::test]
    async fn test_identity_failure_prevents_search() {
        let mut fake = FakeGitHub::new("alice");
        fake.login = None;
        let svc = service(fake, SearchOptions::default());

        let err = svc.get_user_pull_requests_by_days(None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(_)));
        assert_eq!(*svc.client.calls.lock().unwrap(), ["user"]);
    }

    #[tokio::test]
    async fn test_invalid_login_prevents_search() {
        let fake = FakeGitHub::new("alice created:>2000-01-01");
        let svc = service(fake, SearchOptions::default());

        let err = svc.get_user_pull_requests_by_days(None).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Query(QueryError::InvalidLogin(_))
        ));
        assert!(svc.client.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_aborts() {
        let mut bad = search_item(2, "open");
        bad.as_object_mut().unwrap().remove("state");
        let fake = FakeGitHub::new("alice").with_pages(2, vec![vec![search_item(1, "open"), bad]]);
        let svc = service(fake, SearchOptions::default());

        let err = svc.get_user_pull_requests_by_days(None).await.unwrap_err();
        match err {
            ServiceError::Validation(e) => assert_eq!(e.index, 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_paginates_until_short_page() {
        let fake = FakeGitHub::new("alice").with_pages(
            5,
            vec![items(1..=2), items(3..=4), items(5..=5)],
        );
        let options = SearchOptions {
            per_page: 2,
            ..SearchOptions::default()
        };
        let svc = service(fake, options);

        let prs = svc.get_user_pull_requests_by_days(None).await.unwrap().pull_requests;
        assert_eq!(prs.iter().map(|p| p.number).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
        let pages: Vec<u32> = svc.client.searches.lock().unwrap().iter().map(|r| r.page).collect();
        assert_eq!(pages, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stops_at_total_count() {
        let fake = FakeGitHub::new("alice").with_pages(2, vec![items(1..=2), items(3..=4)]);
        let options = SearchOptions {
            per_page: 2,
            ..SearchOptions::default()
        };
        let svc = service(fake, options);

        let prs = svc.get_user_pull_requests_by_days(None).await.unwrap().pull_requests;
        assert_eq!(prs.len(), 2);
        assert_eq!(svc.client.searches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stops_at_page_limit() {
        let fake = FakeGitHub::new("alice").with_pages(6, vec![items(1..=2), items(3..=4), items(5..=6)]);
        let options = SearchOptions {
            per_page: 2,
            max_pages: 1,
            probe: false,
        };
        let svc = service(fake, options);

        let prs = svc.get_user_pull_requests_by_days(None).await.unwrap().pull_requests;
        assert_eq!(prs.len(), 2);
        assert_eq!(svc.client.searches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stops_at_search_result_ceiling() {
        let pages = (0..15_u64).map(|p| items(p * 100 + 1..=p * 100 + 100)).collect();
        let fake = FakeGitHub::new("alice").with_pages(1500, pages);
        let options = SearchOptions {
            per_page: 100,
            max_pages: 20,
            probe: false,
        };
        let svc = service(fake, options);

        let prs = svc.get_user_pull_requests_by_days(None).await.unwrap().pull_requests;
        assert_eq!(prs.len(), 1000);
        assert_eq!(prs.last().map(|p| p.number), Some(1000));
        let pages: Vec<u32> = svc.client.searches.lock().unwrap().iter().map(|r| r.page).collect();
        assert_eq!(pages, (1..=10).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_ceiling_respects_odd_page_size() {
        let pages = (0..20_u64).map(|p| items(p * 60 + 1..=p * 60 + 60)).collect();
        let fake = FakeGitHub::new("alice").with_pages(1200, pages);
        let options = SearchOptions {
            per_page: 60,
            max_pages: 30,
            probe: false,
        };
        let svc = service(fake, options);

        let prs = svc.get_user_pull_requests_by_days(None).await.unwrap().pull_requests;
        // page 17 ends at result 1020; asking for page 18 would be refused
        assert_eq!(prs.len(), 1020);
        assert_eq!(svc.client.searches.lock().unwrap().len(), 17);
    }

    #[tokio::test]
    async fn test_validation_index_spans_pages() {
        let fake = FakeGitHub::new("alice").with_pages(
            4,
            vec![items(1..=2), vec![search_item(3, "open"), search_item(4, "reopened")]],
        );
        let options = SearchOptions {
            per_page: 2,
            ..SearchOptions::default()
        };
        let svc = service(fake, options);

        match svc.get_user_pull_requests_by_days(None).await.unwrap_err() {
            ServiceError::Validation(e) => assert_eq!(e.index, 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_probe_failures_are_swallowed() {
        let mut fake = FakeGitHub::new("alice").with_pages(1, vec![items(1..=1)]);
        fake.scopes_fail = true;
        fake.repos_fail = true;
        let svc = service(fake, SearchOptions::default());

        let prs = svc.get_user_pull_requests_by_days(None).await.unwrap().pull_requests;
        assert_eq!(prs.len(), 1);
        assert!(svc.check_token_scopes().await.is_none());
    }

    #[tokio::test]
    async fn test_probe_disabled_skips_diagnostic_calls() {
        let fake = FakeGitHub::new("alice").with_pages(1, vec![items(1..=1)]);
        let options = SearchOptions {
            probe: false,
            ..SearchOptions::default()
        };
        let svc = service(fake, options);

        svc.get_user_pull_requests_by_days(None).await.unwrap();
        assert_eq!(*svc.client.calls.lock().unwrap(), ["user", "search"]);
    }

    #[test]
    fn test_token_hint_truncates() {
        assert_eq!(token_hint("ghp_abcdefghijklmnop"), "ghp_abcdef...");
        assert_eq!(token_hint("short"), "short...");
    }
}

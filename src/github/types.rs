use serde::Deserialize;

/// Parameters for a single `GET /search/issues` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search predicate passed as `q`
    pub query: String,
    /// 1-based page number
    pub page: u32,
    /// Results per page (GitHub caps this at 100)
    pub per_page: u8,
}

/// One page of raw search results.
///
/// Items are kept as untyped JSON: the caller decides what shape they must have.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    /// Total number of matches GitHub reports for the query
    pub total_count: u64,
    /// Set when GitHub timed out before collecting every match
    #[serde(default)]
    pub incomplete_results: bool,
    /// Raw result items for this page
    pub items: Vec<serde_json::Value>,
}

/// OAuth scopes granted to the token, as reported in `X-OAuth-Scopes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenScopes(Vec<String>);

impl TokenScopes {
    /// Parse the comma-separated header value. Blank entries are dropped.
    pub fn parse(header: &str) -> Self {
        let scopes = header
            .split(',')
            .map(str::trim)
            .filter(|scope| !scope.is_empty())
            .map(str::to_string)
            .collect();
        Self(scopes)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for TokenScopes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", self.as_slice().join(", "))
        }
    }
}

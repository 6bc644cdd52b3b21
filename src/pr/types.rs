use serde::{Deserialize, Deserializer};

use super::query::{DateRange, Login};

/// A pull request as returned by the search API, validated on ingress.
/// Fields GitHub sends beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    /// PR title
    pub title: String,
    /// PR number, unique within its repository only
    pub number: u64,
    /// API URL of the pull request
    pub url: String,
    /// ISO-8601 creation timestamp, kept verbatim
    pub created_at: String,
    /// ISO-8601 last-update timestamp, kept verbatim
    pub updated_at: String,
    pub state: PrState,
    /// Description; the key is required but may be null
    #[serde(deserialize_with = "nullable")]
    pub body: Option<String>,
}

/// A `deserialize_with` on an Option turns off serde's implicit
/// "missing means None", so `body` must be present even when null.
fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Draft,
    Merged,
    Closed,
}

impl PrState {
    pub const ALL: [PrState; 4] = [PrState::Open, PrState::Draft, PrState::Merged, PrState::Closed];
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Draft => write!(f, "draft"),
            PrState::Merged => write!(f, "merged"),
            PrState::Closed => write!(f, "closed"),
        }
    }
}

/// Everything one lookback search produced: who, when, what was asked, what came back.
#[derive(Debug, Clone)]
pub struct Digest {
    pub login: Login,
    pub range: DateRange,
    pub query: String,
    pub pull_requests: Vec<PullRequest>,
}

use crate::pr::{PrState, PullRequest};

/// Number of pull requests in one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCount {
    pub state: PrState,
    pub count: usize,
}

/// Rendered view of one lookback search.
#[derive(Debug)]
pub struct Report {
    /// Login the search ran for
    pub login: String,
    /// `YYYY-MM-DD..YYYY-MM-DD`
    pub range: String,
    /// Search predicate sent to GitHub
    pub query: String,
    /// Pull requests in the order GitHub returned them
    pub pull_requests: Vec<PullRequest>,
    /// Non-zero per-state tallies, in `PrState::ALL` order
    pub counts: Vec<StateCount>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.pull_requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_counts_pull_requests() {
        let report = Report {
            login: "alice".to_string(),
            range: "2025-01-01..2025-04-11".to_string(),
            query: String::new(),
            pull_requests: vec![],
            counts: vec![],
        };
        assert_eq!(report.total(), 0);
    }
}

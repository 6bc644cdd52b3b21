use thiserror::Error;

use super::types::PullRequest;

/// A search result item that does not have the pull request shape.
#[derive(Debug, Error)]
#[error("Item {index} does not match the pull request schema: {detail}")]
pub struct ValidationError {
    /// Position of the item across every page fetched so far
    pub index: usize,
    /// What serde rejected (missing field, wrong type, unknown state...)
    pub detail: String,
}

/// Validate raw search items field by field, keeping their order.
///
/// `offset` is the number of items already accepted from earlier pages, so
/// reported indices stay meaningful across pagination. The first bad item
/// fails the whole batch.
pub fn validate_items(
    items: Vec<serde_json::Value>,
    offset: usize,
) -> Result<Vec<PullRequest>, ValidationError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<PullRequest>(item).map_err(|err| ValidationError {
                index: offset + i,
                detail: err.to_string(),
            })
        })
        .collect()
}

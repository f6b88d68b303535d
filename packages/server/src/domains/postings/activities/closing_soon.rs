use anyhow::Result;

use crate::domains::postings::data::PostingData;
use crate::kernel::ServerDeps;

/// Size of the dashboard sneak peek
pub const CLOSING_SOON_LIMIT: usize = 5;

/// Postings with the nearest known deadline, soonest first
pub async fn closing_soon(deps: &ServerDeps) -> Result<Vec<PostingData>> {
    let postings = deps.postings.closing_soon(CLOSING_SOON_LIMIT).await?;
    Ok(postings.iter().map(PostingData::from).collect())
}

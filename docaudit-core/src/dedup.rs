//! Duplicate checker: partitions freshly-split passages against what the
//! store already holds, in batches, without mutating the store.

use crate::error::StoreError;
use crate::model::Passage;
use crate::store::VectorStore;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Result of checking a list of passages against the store.
pub struct DedupResult {
    /// Input passages whose id was already present in the store.
    pub hits: Vec<Passage>,
    /// Input passages whose id was absent.
    pub misses: Vec<Passage>,
    /// The store's own records for the `hits`, carrying their authoritative
    /// `locations`.
    pub retrieved: Vec<Passage>,
}

/// Checks `passages` against `store` in batches of `batch_size`.
pub async fn check_duplicates(
    store: &dyn VectorStore,
    passages: Vec<Passage>,
    batch_size: usize,
) -> Result<DedupResult, StoreError> {
    let mut hits = Vec::new();
    let mut misses = Vec::new();
    let mut retrieved = Vec::new();

    for batch in passages.chunks(batch_size.max(1)) {
        let ids: Vec<String> = batch.iter().map(|p| p.id.clone()).collect();
        let found = store.filter_by_ids(&ids).await?;
        let found_ids: std::collections::HashSet<&str> =
            found.iter().map(|p| p.id.as_str()).collect();

        for passage in batch {
            if found_ids.contains(passage.id.as_str()) {
                hits.push(passage.clone());
            } else {
                misses.push(passage.clone());
            }
        }
        retrieved.extend(found);
    }

    Ok(DedupResult {
        hits,
        misses,
        retrieved,
    })
}

//! Deindex: `filter_retriever → location_remover → overwriter`.

use crate::error::CoreError;
use crate::store::{VectorStore, WritePolicy};

/// Removes every reference to any id in `source_ids` from the store.
/// Passages whose `locations` becomes empty as a result are deleted
/// outright rather than left as empty-`locations` tombstones; the rest are
/// overwritten with their pruned `locations`. Returns the number of
/// passages affected (deleted plus overwritten).
pub async fn deindex(store: &dyn VectorStore, source_ids: &[String]) -> Result<usize, CoreError> {
    let retrieved = store.filter_by_location_ids(source_ids).await?;
    if retrieved.is_empty() {
        return Ok(0);
    }

    let mut to_delete = Vec::new();
    let mut to_overwrite = Vec::new();

    for mut passage in retrieved {
        passage
            .locations
            .retain(|loc| !source_ids.contains(&loc.id));
        if passage.locations.is_empty() {
            to_delete.push(passage.id);
        } else {
            to_overwrite.push(passage);
        }
    }

    let count = to_delete.len() + to_overwrite.len();

    if !to_overwrite.is_empty() {
        store.write(to_overwrite, WritePolicy::Overwrite).await?;
    }
    if !to_delete.is_empty() {
        store.delete_by_ids(&to_delete).await?;
    }

    Ok(count)
}

//! Ingestion: `parser → cleaner → splitter → content_ids → content_merger →
//! duplicate_checker → { retrieved+hits → duplicate_merger → overwriter ;
//! misses → embedder → writer }`. The two tails after the duplicate checker
//! run independently; the call completes once both have.

use crate::dedup::{check_duplicates, DEFAULT_BATCH_SIZE};
use crate::embed::{embed_passages, Embedder};
use crate::error::{CoreError, StoreError};
use crate::ids::assign_content_ids;
use crate::merge::merge_passages_by_id;
use crate::model::{Location, Passage};
use crate::parsing::{self, iter_sources};
use crate::store::{VectorStore, WritePolicy};

/// One document to ingest, paired positionally with an optional source id.
pub struct IngestInput {
    pub bytes: Vec<u8>,
}

/// Summary of one ingestion call, useful for logging and for the HTTP
/// layer's response.
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub sources_parsed: usize,
    pub sources_failed: usize,
    pub passages_written: usize,
    pub passages_merged: usize,
}

/// Runs the full ingestion pipeline over `sources`, positionally paired with
/// `source_ids` per [`iter_sources`]'s padding/truncation rule. Returns the
/// source ids actually used (including any freshly generated ones) and
/// ingestion stats.
pub async fn ingest(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    sources: Vec<IngestInput>,
    source_ids: Option<Vec<String>>,
) -> Result<(Vec<String>, IngestStats), CoreError> {
    let paired = iter_sources(sources, source_ids);
    let mut stats = IngestStats::default();
    let mut used_ids = Vec::with_capacity(paired.len());
    let mut all_passages = Vec::new();

    for (input, source_id) in paired {
        used_ids.push(source_id.clone());
        match parsing::parse(&input.bytes) {
            Ok(sections) => {
                stats.sources_parsed += 1;
                for (heading_path, body) in sections {
                    let cleaned = crate::preprocess::clean(&body);
                    for window in crate::preprocess::split(&cleaned) {
                        all_passages.push(Passage::new(
                            window,
                            vec![Location::docx(source_id.clone(), heading_path.clone())],
                        ));
                    }
                }
            }
            Err(err) => {
                stats.sources_failed += 1;
                tracing::warn!(source_id = %source_id, error = %err, "failed to parse document, skipping");
            }
        }
    }

    assign_content_ids(&mut all_passages);
    let merged = merge_passages_by_id(all_passages);

    let dedup = check_duplicates(store, merged, DEFAULT_BATCH_SIZE).await?;

    let overwrite_tail = async {
        if dedup.hits.is_empty() {
            return Ok::<usize, CoreError>(0);
        }
        let combined = merge_passages_by_id(
            dedup
                .retrieved
                .into_iter()
                .chain(dedup.hits.into_iter())
                .collect(),
        );
        let count = combined.len();
        store.write(combined, WritePolicy::Overwrite).await?;
        Ok(count)
    };

    let write_tail = async {
        if dedup.misses.is_empty() {
            return Ok::<usize, CoreError>(0);
        }
        let mut misses = dedup.misses;
        embed_passages(embedder, &mut misses, crate::embed::DEFAULT_BATCH_SIZE).await?;
        let count = misses.len();
        store
            .write(misses, WritePolicy::Fail)
            .await
            .map_err(|err| match err {
                StoreError::DuplicateId(id) => CoreError::DuplicateFailure(id),
                other => CoreError::Store(other),
            })?;
        Ok(count)
    };

    let (merged_count, written_count) = tokio::try_join!(overwrite_tail, write_tail)?;
    stats.passages_merged = merged_count;
    stats.passages_written = written_count;

    Ok((used_ids, stats))
}

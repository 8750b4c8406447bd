//! Query: `text_embedder → embedding_retriever`, followed by
//! location-pruning so callers never see locations outside what they asked
//! for.

use crate::embed::Embedder;
use crate::error::CoreError;
use crate::model::ScoredPassage;
use crate::store::VectorStore;

pub const DEFAULT_TOP_K: usize = 3;

/// A query against the store.
pub struct QueryInput<'a> {
    pub content: &'a str,
    pub top_k: usize,
    pub source_ids: Option<&'a [String]>,
}

impl<'a> Default for QueryInput<'a> {
    fn default() -> Self {
        Self {
            content: "",
            top_k: DEFAULT_TOP_K,
            source_ids: None,
        }
    }
}

/// Embeds `input.content`, retrieves the top-k matching passages, and
/// prunes each result's `locations` down to the queried `source_ids` (a
/// no-op when unrestricted).
pub async fn query(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    input: QueryInput<'_>,
) -> Result<Vec<ScoredPassage>, CoreError> {
    let embedding = embedder.embed_query(input.content).await?;
    let mut results = store
        .query(&embedding, input.top_k, input.source_ids)
        .await?;

    if let Some(source_ids) = input.source_ids {
        for scored in results.iter_mut() {
            scored
                .passage
                .locations
                .retain(|loc| source_ids.contains(&loc.id));
        }
    }

    Ok(results)
}

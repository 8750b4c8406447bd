//! `/api/query` handler: embeds the query text and retrieves top-k passages,
//! optionally restricted to a set of source ids.
//!
//! `source_ids` is accepted as a single comma-separated value, matching the
//! convention `routes::sources` uses (see its module comment).

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use docaudit_core::pipeline::QueryInput;
use docaudit_core::model::ScoredPassage;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QueryParams {
    pub content: Option<String>,
    pub top_k: Option<usize>,
    pub source_ids: Option<String>,
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub id: String,
    pub r#type: String,
    pub path: Vec<String>,
}

#[derive(Serialize)]
pub struct QueryResult {
    pub id: String,
    pub score: f32,
    pub content: String,
    pub locations: Vec<LocationResponse>,
}

impl From<ScoredPassage> for QueryResult {
    fn from(scored: ScoredPassage) -> Self {
        Self {
            id: scored.passage.id,
            score: scored.score,
            content: scored.passage.content,
            locations: scored
                .passage
                .locations
                .into_iter()
                .map(|loc| LocationResponse {
                    id: loc.id,
                    r#type: loc.r#type,
                    path: loc.path,
                })
                .collect(),
        }
    }
}

pub async fn run_query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<QueryResult>>, ServerError> {
    let content = params
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing required argument 'content'".into()))?;

    let source_ids: Option<Vec<String>> = params.source_ids.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    });

    let results = docaudit_core::query(
        state.embedder.as_ref(),
        state.store.as_ref(),
        QueryInput {
            content: &content,
            top_k: params.top_k.unwrap_or(docaudit_core::pipeline::query::DEFAULT_TOP_K),
            source_ids: source_ids.as_deref(),
        },
    )
    .await?;

    Ok(Json(results.into_iter().map(QueryResult::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_result_prunes_to_response_shape() {
        let scored = ScoredPassage {
            passage: docaudit_core::model::Passage {
                id: "abc".into(),
                content: "hello".into(),
                embedding: None,
                locations: vec![docaudit_core::model::Location::docx(
                    "s1",
                    vec!["Intro".into()],
                )],
            },
            score: 0.9,
        };
        let result: QueryResult = scored.into();
        assert_eq!(result.id, "abc");
        assert_eq!(result.locations[0].r#type, "docx");
    }
}

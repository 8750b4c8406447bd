//! `/api/sources` handlers: upload, status lookup, and cancellation/delete.
//!
//! `source_ids` query parameters are accepted as a single comma-separated
//! value (`?source_ids=a,b,c`) rather than repeated keys, to avoid pulling
//! in a second query-string crate solely for multi-value deserialisation
//! (see DESIGN.md).

use std::io::Write;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SourceStatusResponse {
    pub id: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct SourceIdsQuery {
    pub source_ids: Option<String>,
}

fn split_ids(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

pub async fn upload_source(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SourceStatusResponse>), ServerError> {
    let mut bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?
                    .to_vec(),
            );
        }
    }
    let bytes =
        bytes.ok_or_else(|| ServerError::BadRequest("missing 'file' field in multipart upload".into()))?;

    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(&bytes)?;

    let source_id = docaudit_core::parsing::new_source_id();
    state.broker.set_waiting(&source_id);

    let store = state.store.clone();
    let embedder = state.embedder.clone();
    let broker = state.broker.clone();
    let id = source_id.clone();

    tokio::spawn(async move {
        let _store_write = broker.acquire_store_write().await;

        if broker.is_aborted(&id) {
            broker.set_completed(&id);
            return;
        }
        broker.set_indexing(&id);

        let staged = std::fs::read(temp_file.path());
        // temp_file stays alive (and the file on disk with it) until this
        // task returns, regardless of which branch below is taken.
        let outcome = match staged {
            Ok(bytes) => {
                docaudit_core::ingest(
                    embedder.as_ref(),
                    store.as_ref(),
                    vec![docaudit_core::IngestInput { bytes }],
                    Some(vec![id.clone()]),
                )
                .await
            }
            Err(err) => {
                tracing::warn!(source_id = %id, error = %err, "failed to read staged upload");
                broker.set_completed(&id);
                return;
            }
        };

        match outcome {
            Ok((_, stats)) => tracing::info!(
                source_id = %id,
                passages_written = stats.passages_written,
                passages_merged = stats.passages_merged,
                sources_failed = stats.sources_failed,
                "ingest complete"
            ),
            Err(err) => tracing::warn!(source_id = %id, error = %err, "ingest failed"),
        }

        broker.set_completed(&id);
    });

    Ok((
        StatusCode::CREATED,
        Json(SourceStatusResponse {
            id: source_id,
            status: "indexing".to_string(),
        }),
    ))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SourceStatusResponse>, ServerError> {
    let status = state.broker.status(state.store.as_ref(), &id).await?;
    Ok(Json(SourceStatusResponse {
        id,
        status: status.as_str().to_string(),
    }))
}

pub async fn list_statuses(
    State(state): State<AppState>,
    Query(params): Query<SourceIdsQuery>,
) -> Result<Json<Vec<SourceStatusResponse>>, ServerError> {
    let ids = split_ids(&params.source_ids);
    let statuses = state.broker.statuses(state.store.as_ref(), &ids).await?;
    Ok(Json(
        statuses
            .into_iter()
            .map(|(id, status)| SourceStatusResponse {
                id,
                status: status.as_str().to_string(),
            })
            .collect(),
    ))
}

pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    delete_ids(&state, vec![id]).await
}

pub async fn delete_sources(
    State(state): State<AppState>,
    Query(params): Query<SourceIdsQuery>,
) -> Result<StatusCode, ServerError> {
    delete_ids(&state, split_ids(&params.source_ids)).await
}

async fn delete_ids(state: &AppState, ids: Vec<String>) -> Result<StatusCode, ServerError> {
    if ids.is_empty() {
        return Ok(StatusCode::NO_CONTENT);
    }

    let _store_write = state.broker.acquire_store_write().await;
    let to_deindex = state
        .broker
        .prepare_delete(state.store.as_ref(), &ids)
        .await?;
    if !to_deindex.is_empty() {
        docaudit_core::deindex(state.store.as_ref(), &to_deindex).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Error types for the ingestion, deindex, and query pipelines.

use thiserror::Error;

/// A `.docx` could not be opened or its contents could not be walked.
#[derive(Error, Debug)]
#[error("failed to parse document: {0}")]
pub struct DocxParserError(pub String);

/// The vector store rejected or failed a call.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store transport error: {0}")]
    Transport(String),

    #[error("store returned an unexpected response: {0}")]
    Protocol(String),

    #[error("no record found for id {0}")]
    NotFound(String),

    /// A FAIL-policy write observed `id` already present in the store.
    #[error("id {0} already exists under FAIL policy")]
    DuplicateId(String),
}

/// The embedding backend failed to embed a batch.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedder transport error: {0}")]
    Transport(String),

    #[error("embedder returned an unexpected response: {0}")]
    Protocol(String),
}

/// Errors surfaced by the core ingestion/deindex/query operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] DocxParserError),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    /// A FAIL-policy write observed an existing id on the misses branch.
    /// Indicates a concurrent-writer bug, not a user-facing failure.
    #[error("duplicate write for id {0}: concurrent-writer violation")]
    DuplicateFailure(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

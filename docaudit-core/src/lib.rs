//! Core ingestion, deindex, and query pipelines for passage-level document
//! search over `.docx` sources.
//!
//! This crate has no HTTP surface of its own; `docaudit-server` wraps it
//! with an axum router, an upload staging layer, and the source-status
//! broker's process-wide singleton.

pub mod broker;
pub mod dedup;
pub mod embed;
pub mod error;
pub mod ids;
pub mod merge;
pub mod model;
pub mod parsing;
pub mod pipeline;
pub mod preprocess;
pub mod store;

pub use broker::{Broker, SourceStatus};
pub use embed::{Embedder, HttpEmbedder};
pub use error::CoreError;
pub use model::{Location, Passage, ScoredPassage};
pub use pipeline::{deindex, ingest, query, IngestInput, IngestStats, QueryInput};
pub use store::{InMemoryVectorStore, QdrantStore, VectorStore, WritePolicy};

pub type Result<T> = std::result::Result<T, CoreError>;

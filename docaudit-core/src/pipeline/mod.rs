//! Statically-composed pipelines: plain async function composition wiring
//! the parser, preprocessors, content-id assigner, merger, duplicate
//! checker, embedder, and store into the three public operations.

pub mod deindex;
pub mod ingest;
pub mod query;

pub use deindex::deindex;
pub use ingest::{ingest, IngestInput, IngestStats};
pub use query::{query, QueryInput};

//! The passage/location data model shared by every pipeline.

use serde::{Deserialize, Serialize};

/// A stored unit of searchable text.
///
/// `id` is always `lowercase_hex(sha256(content))` once a passage has
/// passed through [`crate::ids::assign_content_ids`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub content: String,
    /// Absent until the passage has been through the embedder.
    pub embedding: Option<Vec<f32>>,
    pub locations: Vec<Location>,
}

impl Passage {
    pub fn new(content: String, locations: Vec<Location>) -> Self {
        Self {
            id: String::new(),
            content,
            embedding: None,
            locations,
        }
    }
}

/// Where one source contributed a passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub r#type: String,
    pub path: Vec<String>,
}

pub const LOCATION_TYPE_DOCX: &str = "docx";

impl Location {
    pub fn docx(source_id: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            id: source_id.into(),
            r#type: LOCATION_TYPE_DOCX.to_string(),
            path,
        }
    }
}

/// A passage returned from a top-k query, carrying the store's cosine score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

//! Content-based id assignment.
//!
//! Mirrors `SetContentBasedIds`: a passage's id is always derived from its
//! own content, so two passages with identical text collapse onto the same
//! id regardless of where they were extracted from.

use sha2::{Digest, Sha256};

use crate::model::Passage;

/// Returns `lowercase_hex(sha256(content))`.
pub fn content_id(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Assigns a content-derived id to every passage in place.
pub fn assign_content_ids(passages: &mut [Passage]) {
    for passage in passages.iter_mut() {
        passage.id = content_id(&passage.content);
    }
}

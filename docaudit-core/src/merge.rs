//! Recursive metadata merge and passage deduplication-by-id.
//!
//! `recursively_merge` is a direct port of `recursively_merge_dicts`: maps
//! merge key-by-key (recursing into shared keys), sequences concatenate
//! left-then-right, and anything else resolves to the left value. It exists
//! to keep the merge rule testable against the exact behaviour it was
//! copied from; the pipeline itself only ever needs to merge a passage's
//! `locations`, which `merge_passages_by_id` does directly without routing
//! through this generic representation.

use serde_json::{Map, Value};

use crate::model::Passage;

/// Merges `b` into `a` per the recursive-dict-merge rule:
/// - both maps: recurse key by key, keys unique to either side pass through
/// - both sequences: concatenate `a` then `b`
/// - anything else (including mismatched shapes): `a` wins
pub fn recursively_merge(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let mut merged = Map::new();
            for (key, left_val) in left {
                match right.get(key) {
                    Some(right_val) => {
                        merged.insert(key.clone(), recursively_merge(left_val, right_val));
                    }
                    None => {
                        merged.insert(key.clone(), left_val.clone());
                    }
                }
            }
            for (key, right_val) in right {
                if !left.contains_key(key) {
                    merged.insert(key.clone(), right_val.clone());
                }
            }
            Value::Object(merged)
        }
        (Value::Array(left), Value::Array(right)) => {
            let mut merged = left.clone();
            merged.extend(right.clone());
            Value::Array(merged)
        }
        _ => a.clone(),
    }
}

/// Groups passages by id, merging duplicates' `locations` into the first
/// occurrence. Preserves the order in which each id was first seen. Within
/// a merged passage, `locations` entries identical in `(id, type, path)` are
/// collapsed to their first occurrence, so re-merging a passage against its
/// own already-stored `locations` is idempotent.
pub fn merge_passages_by_id(passages: Vec<Passage>) -> Vec<Passage> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: std::collections::HashMap<String, Passage> = std::collections::HashMap::new();

    for passage in passages {
        match by_id.get_mut(&passage.id) {
            Some(existing) => {
                existing.locations.extend(passage.locations);
            }
            None => {
                order.push(passage.id.clone());
                by_id.insert(passage.id.clone(), passage);
            }
        }
    }

    order
        .into_iter()
        .map(|id| {
            let mut passage = by_id.remove(&id).expect("id was just inserted");
            dedup_locations(&mut passage.locations);
            passage
        })
        .collect()
}

/// Drops `locations` entries that repeat an earlier `(id, type, path)`,
/// keeping the first occurrence's position.
fn dedup_locations(locations: &mut Vec<crate::model::Location>) {
    let mut seen = std::collections::HashSet::new();
    locations.retain(|loc| seen.insert((loc.id.clone(), loc.r#type.clone(), loc.path.clone())));
}

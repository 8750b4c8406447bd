//! The vector store abstraction and its two implementations: an HTTP client
//! for Qdrant (production) and an in-memory double (tests).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Passage, ScoredPassage};

/// Write-conflict policy for [`VectorStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Refuse the write if any id already exists.
    Fail,
    /// Unconditionally replace existing records.
    Overwrite,
}

/// Collaborator contract for the passage store. Implementors must index at
/// least `id` and `locations[].id` as filterable keyword fields.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns every stored passage whose id is in `ids`.
    async fn filter_by_ids(&self, ids: &[String]) -> Result<Vec<Passage>, StoreError>;

    /// Returns every stored passage with at least one location whose id is
    /// in `location_ids`.
    async fn filter_by_location_ids(
        &self,
        location_ids: &[String],
    ) -> Result<Vec<Passage>, StoreError>;

    /// Writes `passages` under `policy`. `Fail` must reject the whole batch
    /// (no partial write) if any id already exists.
    async fn write(&self, passages: Vec<Passage>, policy: WritePolicy) -> Result<(), StoreError>;

    /// Top-k passages by cosine similarity to `query_embedding`, optionally
    /// restricted to passages whose `locations[].id` intersects
    /// `location_ids`.
    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        location_ids: Option<&[String]>,
    ) -> Result<Vec<ScoredPassage>, StoreError>;

    /// Whether any stored passage references `location_id`.
    async fn has_location(&self, location_id: &str) -> Result<bool, StoreError>;

    /// Deletes the records for `ids` outright. A no-op for ids that aren't
    /// present.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), StoreError>;
}

/// In-process test double backing `RwLock<HashMap<id, Passage>>`, mirroring
/// the shape of a plain in-memory keyed store.
#[derive(Default)]
pub struct InMemoryVectorStore {
    passages: RwLock<HashMap<String, Passage>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Passage>>, StoreError> {
        self.passages
            .read()
            .map_err(|_| StoreError::Protocol("store lock poisoned".into()))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Passage>>, StoreError> {
        self.passages
            .write()
            .map_err(|_| StoreError::Protocol("store lock poisoned".into()))
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn filter_by_ids(&self, ids: &[String]) -> Result<Vec<Passage>, StoreError> {
        let store = self.read_lock()?;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }

    async fn filter_by_location_ids(
        &self,
        location_ids: &[String],
    ) -> Result<Vec<Passage>, StoreError> {
        let store = self.read_lock()?;
        Ok(store
            .values()
            .filter(|p| p.locations.iter().any(|loc| location_ids.contains(&loc.id)))
            .cloned()
            .collect())
    }

    async fn write(&self, passages: Vec<Passage>, policy: WritePolicy) -> Result<(), StoreError> {
        let mut store = self.write_lock()?;
        if policy == WritePolicy::Fail {
            for passage in &passages {
                if store.contains_key(&passage.id) {
                    return Err(StoreError::DuplicateId(passage.id.clone()));
                }
            }
        }
        for passage in passages {
            store.insert(passage.id.clone(), passage);
        }
        Ok(())
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        location_ids: Option<&[String]>,
    ) -> Result<Vec<ScoredPassage>, StoreError> {
        let store = self.read_lock()?;
        let mut scored: Vec<ScoredPassage> = store
            .values()
            .filter(|p| match location_ids {
                Some(ids) => p.locations.iter().any(|loc| ids.contains(&loc.id)),
                None => true,
            })
            .filter_map(|p| {
                let embedding = p.embedding.as_ref()?;
                Some(ScoredPassage {
                    passage: p.clone(),
                    score: cosine(query_embedding, embedding),
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn has_location(&self, location_id: &str) -> Result<bool, StoreError> {
        let store = self.read_lock()?;
        Ok(store
            .values()
            .any(|p| p.locations.iter().any(|loc| loc.id == location_id)))
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut store = self.write_lock()?;
        for id in ids {
            store.remove(id);
        }
        Ok(())
    }
}

/// Qdrant requires a point id to be an unsigned integer or a UUID, but a
/// passage id is a 64-character content hash. Point ids are therefore a
/// UUIDv5 derived deterministically from the content id; the content id
/// itself travels in the payload's `id` field and is what every other
/// method in this trait treats as authoritative.
const QDRANT_POINT_ID_NAMESPACE: uuid::Uuid = uuid::Uuid::from_bytes([
    0xd0, 0xc4, 0x1d, 0x17, 0x4a, 0x9c, 0x4b, 0x3e, 0x8f, 0x0a, 0x52, 0x1e, 0x6a, 0x3f, 0x9c, 0x11,
]);

fn point_id_for(content_id: &str) -> String {
    uuid::Uuid::new_v5(&QDRANT_POINT_ID_NAMESPACE, content_id.as_bytes()).to_string()
}

/// HTTP client for a Qdrant collection, configured with a 1024-dimensional
/// cosine-distance index over `id` and `meta.locations[].id`.
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

impl QdrantStore {
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            collection: collection.into(),
        }
    }

    fn points_url(&self) -> String {
        format!("{}/collections/{}/points", self.base_url, self.collection)
    }

    fn scroll_url(&self) -> String {
        format!("{}/scroll", self.points_url())
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.points_url())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn filter_by_ids(&self, ids: &[String]) -> Result<Vec<Passage>, StoreError> {
        let body = serde_json::json!({
            "filter": { "must": [ { "key": "id", "match": { "any": ids } } ] },
            "with_payload": true,
            "with_vector": true,
            "limit": ids.len().max(1),
        });
        scroll(&self.client, &self.scroll_url(), body).await
    }

    async fn filter_by_location_ids(
        &self,
        location_ids: &[String],
    ) -> Result<Vec<Passage>, StoreError> {
        let body = serde_json::json!({
            "filter": {
                "must": [ { "key": "meta.locations[].id", "match": { "any": location_ids } } ]
            },
            "with_payload": true,
            "with_vector": true,
            "limit": 10_000,
        });
        scroll(&self.client, &self.scroll_url(), body).await
    }

    async fn write(&self, passages: Vec<Passage>, policy: WritePolicy) -> Result<(), StoreError> {
        if policy == WritePolicy::Fail {
            let ids: Vec<String> = passages.iter().map(|p| p.id.clone()).collect();
            let existing = self.filter_by_ids(&ids).await?;
            if !existing.is_empty() {
                return Err(StoreError::DuplicateId(existing[0].id.clone()));
            }
        }

        let points: Vec<_> = passages
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": point_id_for(&p.id),
                    "vector": p.embedding,
                    "payload": {
                        "id": p.id,
                        "content": p.content,
                        "meta": { "locations": p.locations },
                    },
                })
            })
            .collect();
        let body = serde_json::json!({ "points": points });

        let resp = self
            .client
            .put(self.points_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(StoreError::Protocol(format!(
                "qdrant upsert returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        location_ids: Option<&[String]>,
    ) -> Result<Vec<ScoredPassage>, StoreError> {
        let mut body = serde_json::json!({
            "vector": query_embedding,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(ids) = location_ids {
            body["filter"] = serde_json::json!({
                "must": [ { "key": "meta.locations[].id", "match": { "any": ids } } ]
            });
        }

        let resp = self
            .client
            .post(self.search_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(StoreError::Protocol(format!(
                "qdrant search returned {}",
                resp.status()
            )));
        }

        let parsed: QdrantSearchResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))?;
        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredPassage {
                passage: hit.payload.into_passage(hit.vector),
                score: hit.score,
            })
            .collect())
    }

    async fn has_location(&self, location_id: &str) -> Result<bool, StoreError> {
        let hits = self
            .filter_by_location_ids(std::slice::from_ref(&location_id.to_string()))
            .await?;
        Ok(!hits.is_empty())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        let point_ids: Vec<String> = ids.iter().map(|id| point_id_for(id)).collect();
        let body = serde_json::json!({ "points": point_ids });
        let resp = self
            .client
            .post(format!("{}/delete", self.points_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(StoreError::Protocol(format!(
                "qdrant delete returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

async fn scroll(
    client: &reqwest::Client,
    url: &str,
    body: serde_json::Value,
) -> Result<Vec<Passage>, StoreError> {
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(StoreError::Protocol(format!(
            "qdrant scroll returned {}",
            resp.status()
        )));
    }
    let parsed: QdrantScrollResponse = resp
        .json()
        .await
        .map_err(|e| StoreError::Protocol(e.to_string()))?;
    Ok(parsed
        .result
        .points
        .into_iter()
        .map(|point| point.payload.into_passage(point.vector))
        .collect())
}

#[derive(serde::Deserialize)]
struct QdrantScrollResponse {
    result: QdrantScrollResult,
}

#[derive(serde::Deserialize)]
struct QdrantScrollResult {
    points: Vec<QdrantPoint>,
}

/// `vector` is a sibling of `payload` in Qdrant's point representation, only
/// populated when the request set `with_vector: true`.
#[derive(serde::Deserialize)]
struct QdrantPoint {
    payload: QdrantPayload,
    vector: Option<Vec<f32>>,
}

#[derive(serde::Deserialize)]
struct QdrantSearchResponse {
    result: Vec<QdrantHit>,
}

#[derive(serde::Deserialize)]
struct QdrantHit {
    score: f32,
    payload: QdrantPayload,
    vector: Option<Vec<f32>>,
}

/// The point's Qdrant-assigned id is a UUIDv5 derived from the content id
/// (see [`point_id_for`]) and carries no information of its own; the
/// authoritative passage id always comes from the payload's `id` field.
/// `locations` lives under `meta`, matching the original Haystack/Qdrant
/// schema's `payload_fields_to_index` over `meta.locations[].id`.
#[derive(serde::Deserialize)]
struct QdrantPayload {
    id: String,
    content: String,
    meta: QdrantMeta,
}

#[derive(serde::Deserialize)]
struct QdrantMeta {
    locations: Vec<crate::model::Location>,
}

impl QdrantPayload {
    fn into_passage(self, vector: Option<Vec<f32>>) -> Passage {
        Passage {
            id: self.id,
            content: self.content,
            embedding: vector,
            locations: self.meta.locations,
        }
    }
}

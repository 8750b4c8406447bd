//! The embedding-model adapter: batches passages, calls an external HTTP
//! embedding service, and writes unit-norm vectors back onto each passage.

use async_trait::async_trait;

use crate::error::EmbedError;
use crate::model::Passage;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const EMBEDDING_DIM: usize = 1024;

/// Collaborator contract for the embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embeds a batch of passage contents, returning one vector per input
    /// in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Called once at process start before the first real embed call.
    async fn warm_up(&self) -> Result<(), EmbedError> {
        Ok(())
    }
}

/// Embeds every passage's content in batches of `batch_size`, setting
/// `embedding` on each in place. Any batch failure aborts the whole call.
pub async fn embed_passages(
    embedder: &dyn Embedder,
    passages: &mut [Passage],
    batch_size: usize,
) -> Result<(), EmbedError> {
    for chunk in passages.chunks_mut(batch_size.max(1)) {
        let texts: Vec<String> = chunk.iter().map(|p| p.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        for (passage, embedding) in chunk.iter_mut().zip(embeddings) {
            passage.embedding = Some(embedding);
        }
    }
    Ok(())
}

/// HTTP-backed embedder calling out to a sentence-embedding sidecar.
/// Normalises every returned vector to unit length, matching the source's
/// `normalize_embeddings=True` contract.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEmbedder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn call(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let body = serde_json::json!({ "inputs": texts });
        let resp = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(EmbedError::Protocol(format!(
                "embedder returned {}",
                resp.status()
            )));
        }
        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::Protocol(e.to_string()))?;
        Ok(parsed.embeddings.into_iter().map(normalize).collect())
    }
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut result = self.call(&[text.to_string()]).await?;
        Ok(result.pop().unwrap_or_default())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.call(texts).await
    }

    async fn warm_up(&self) -> Result<(), EmbedError> {
        self.embed_query("warm up").await.map(|_| ())
    }
}

//! Application state assembled once at startup and threaded through every
//! handler as a parameter, rather than via process-global singletons.

use std::sync::Arc;

use docaudit_core::{Broker, Embedder, HttpEmbedder, QdrantStore, VectorStore};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub broker: Arc<Broker>,
}

impl AppState {
    /// Assembles the store and embedder clients and warms the embedder up
    /// once, matching the original's memoised-factory startup sequence.
    pub async fn new(config: &Config) -> Result<Self, docaudit_core::CoreError> {
        let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(
            config.qdrant.base_url(),
            config.qdrant.collection_name.clone(),
        ));
        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(config.embedder.url.clone()));
        embedder.warm_up().await?;

        Ok(Self {
            store,
            embedder,
            broker: Arc::new(Broker::new()),
        })
    }

    /// Assembles state backed by the in-memory store double and a stub
    /// embedder, for tests that exercise the router without a live Qdrant
    /// or embedding sidecar.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(docaudit_core::InMemoryVectorStore::new()),
            embedder: Arc::new(test_support::StubEmbedder),
            broker: Arc::new(Broker::new()),
        }
    }
}

pub mod test_support {
    use async_trait::async_trait;
    use docaudit_core::embed::Embedder;
    use docaudit_core::error::EmbedError;

    pub struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }
}

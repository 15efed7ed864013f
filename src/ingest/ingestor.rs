use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::converter::{ConvertError, DataConverter};
use crate::core::config::DataConfig;
use crate::core::errors::ApiError;
use crate::llm::EmbeddingProvider;
use crate::rag::{Document, SqliteVectorStore, VectorStore};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("vector store error: {0}")]
    Store(#[source] ApiError),

    #[error("embedding failed: {0}")]
    Embedding(#[source] ApiError),
}

/// Builds the vector index from the review CSV, or reopens the persisted one.
pub struct DataIngestor {
    csv_path: PathBuf,
    db_path: PathBuf,
    batch_size: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl DataIngestor {
    pub fn new(config: &DataConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            csv_path: config.csv_path.clone(),
            db_path: config.vector_db.clone(),
            batch_size: config.embedding_batch_size.max(1),
            embedder,
        }
    }

    /// Returns a queryable store.
    ///
    /// With `load_existing`, a populated index built with the current
    /// embedding model is reused as-is; anything else triggers a full rebuild.
    pub async fn ingest(&self, load_existing: bool) -> Result<Arc<dyn VectorStore>, IngestError> {
        let store = SqliteVectorStore::open(&self.db_path)
            .await
            .map_err(IngestError::Store)?;
        let store: Arc<dyn VectorStore> = Arc::new(store);

        if load_existing && self.can_reuse(store.as_ref()).await? {
            let count = store.count().await.map_err(IngestError::Store)?;
            tracing::info!(
                "Loaded existing vector index from {} ({} documents)",
                self.db_path.display(),
                count
            );
            return Ok(store);
        }

        let docs = DataConverter::new(&self.csv_path).convert()?;
        tracing::info!(
            "Building vector index from {} ({} documents)",
            self.csv_path.display(),
            docs.len()
        );

        self.rebuild(store.as_ref(), docs).await?;
        Ok(store)
    }

    async fn can_reuse(&self, store: &dyn VectorStore) -> Result<bool, IngestError> {
        let count = store.count().await.map_err(IngestError::Store)?;
        if count == 0 {
            return Ok(false);
        }

        let stored_model = store.embedding_model().await.map_err(IngestError::Store)?;
        let current_model = self.embedder.model_name();
        if stored_model.as_deref() != Some(current_model) {
            tracing::warn!(
                "Vector index was built with {:?}, configured model is {}; rebuilding",
                stored_model,
                current_model
            );
            return Ok(false);
        }

        Ok(true)
    }

    async fn rebuild(&self, store: &dyn VectorStore, docs: Vec<Document>) -> Result<(), IngestError> {
        store.clear().await.map_err(IngestError::Store)?;

        let total = docs.len();
        let mut done = 0;
        for batch in docs.chunks(self.batch_size) {
            let inputs: Vec<String> = batch.iter().map(|doc| doc.content.clone()).collect();
            let embeddings = self
                .embedder
                .embed(&inputs)
                .await
                .map_err(IngestError::Embedding)?;

            if embeddings.len() != batch.len() {
                return Err(IngestError::Embedding(ApiError::Upstream(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                ))));
            }

            let items = batch.iter().cloned().zip(embeddings).collect();
            store.insert_batch(items).await.map_err(IngestError::Store)?;

            done += batch.len();
            tracing::debug!("Embedded {}/{} documents", done, total);
        }

        // The model marker doubles as the completion flag.
        store
            .set_embedding_model(self.embedder.model_name())
            .await
            .map_err(IngestError::Store)?;

        tracing::info!("Vector index ready ({} documents)", total);
        Ok(())
    }
}

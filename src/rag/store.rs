//! VectorStore trait: the storage seam between ingestion and the chain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::ApiError;

/// One product review, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier derived from the source row.
    pub id: String,
    /// The review text.
    pub content: String,
    /// Always carries `product_name`.
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn from_review(row: usize, product_title: String, review: String) -> Self {
        let mut metadata = Map::new();
        metadata.insert("product_name".to_string(), Value::String(product_title));
        Self {
            id: format!("review-{}", row),
            content: review,
            metadata,
        }
    }

    pub fn product_name(&self) -> &str {
        self.metadata
            .get("product_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert documents with their embeddings in one batch.
    async fn insert_batch(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), ApiError>;

    /// Return the `limit` documents most similar to the query embedding.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    /// Embedding model the stored vectors were produced with, if recorded.
    async fn embedding_model(&self) -> Result<Option<String>, ApiError>;

    /// Drop every stored vector together with the recorded model.
    async fn clear(&self) -> Result<(), ApiError>;

    /// Marks the index as complete for `embedding_model`.
    async fn set_embedding_model(&self, embedding_model: &str) -> Result<(), ApiError>;
}

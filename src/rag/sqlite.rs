//! SQLite-backed vector store.
//!
//! Documents and their embeddings live in one SQLite file so the index
//! survives restarts; search is brute-force cosine similarity in process.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{Document, ScoredDocument, VectorStore};
use crate::core::errors::ApiError;

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(ApiError::internal)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Map<String, Value>>(&metadata_str).unwrap_or_default();

        Document {
            id: row.get("id"),
            content: row.get("content"),
            metadata,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert_batch(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (document, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str =
                serde_json::to_string(&document.metadata).map_err(ApiError::internal)?;

            sqlx::query(
                "INSERT OR REPLACE INTO documents (id, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&document.id)
            .bind(&document.content)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, ApiError> {
        let rows = sqlx::query("SELECT id, content, metadata, embedding FROM documents")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<ScoredDocument> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored);

                Some(ScoredDocument {
                    document: Self::row_to_document(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn embedding_model(&self) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM store_meta WHERE key = 'embedding_model'")
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    async fn clear(&self) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM store_meta WHERE key = 'embedding_model'")
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM documents")
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn set_embedding_model(&self, embedding_model: &str) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT OR REPLACE INTO store_meta (key, value, updated_at)
             VALUES ('embedding_model', ?1, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(embedding_model)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(dir: &tempfile::TempDir) -> SqliteVectorStore {
        SqliteVectorStore::open(dir.path().join("vectors.db"))
            .await
            .unwrap()
    }

    fn review(row: usize, title: &str, text: &str) -> Document {
        Document::from_review(row, title.to_string(), text.to_string())
    }

    #[tokio::test]
    async fn insert_and_search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .insert_batch(vec![
                (review(0, "Earbuds", "Great bass"), vec![1.0, 0.0, 0.0]),
                (review(1, "Phone", "Battery lasts two days"), vec![0.0, 1.0, 0.0]),
                (review(2, "Earbuds", "Decent bass, weak mic"), vec![0.9, 0.1, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.id, "review-0");
        assert_eq!(results[1].document.id, "review-2");
        assert!(results[0].score > 0.99);
        assert_eq!(results[0].document.product_name(), "Earbuds");
    }

    #[tokio::test]
    async fn search_returns_at_least_one_result_for_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .insert_batch(vec![(review(0, "Fan", "Quiet"), vec![0.5, 0.5])])
            .await
            .unwrap();

        let results = store.search(&[0.5, 0.5], 0).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn mismatched_dimensions_score_zero() {
        assert_eq!(SqliteVectorStore::cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(SqliteVectorStore::cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn clear_drops_documents_and_model_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        assert_eq!(store.embedding_model().await.unwrap(), None);

        store
            .insert_batch(vec![(review(0, "Fan", "Quiet"), vec![1.0])])
            .await
            .unwrap();
        store.set_embedding_model("bge-small").await.unwrap();
        assert_eq!(
            store.embedding_model().await.unwrap().as_deref(),
            Some("bge-small")
        );

        store.clear().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.embedding_model().await.unwrap(), None);
    }

    #[tokio::test]
    async fn open_fails_when_parent_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = SqliteVectorStore::open(blocker.join("vectors.db")).await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn index_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = test_store(&dir).await;
            store
                .insert_batch(vec![(review(0, "Fan", "Quiet"), vec![1.0, 2.0])])
                .await
                .unwrap();
            store.set_embedding_model("bge-base").await.unwrap();
            store.pool.close().await;
        }

        let reopened = test_store(&dir).await;
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(
            reopened.embedding_model().await.unwrap().as_deref(),
            Some("bge-base")
        );
        let results = reopened.search(&[1.0, 2.0], 1).await.unwrap();
        assert_eq!(results[0].document.content, "Quiet");
    }
}

use std::sync::Arc;

use super::history::SessionHistory;
use super::retrieval::{HistoryAwareRagChain, RetrievalChain};
use crate::core::config::RetrievalConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatProvider, EmbeddingProvider};
use crate::rag::{ContextBuilder, ContextBuilderConfig, VectorStore};

#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub top_k: usize,
    pub max_context_length: usize,
    pub max_history_messages: usize,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for ChainSettings {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_context_length: config.max_context_length,
            max_history_messages: config.max_history_messages,
        }
    }
}

pub struct RagChainBuilder {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn ChatProvider>,
    settings: ChainSettings,
}

impl RagChainBuilder {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            settings: ChainSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ChainSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build_chain(self) -> Result<Arc<dyn RetrievalChain>, ApiError> {
        if self.settings.top_k == 0 {
            return Err(ApiError::BadRequest(
                "retrieval chain needs top_k of at least 1".to_string(),
            ));
        }

        tracing::info!(
            "Built retrieval chain (llm: {}, top_k: {}, history: {} messages)",
            self.llm.model_name(),
            self.settings.top_k,
            self.settings.max_history_messages
        );

        Ok(Arc::new(HistoryAwareRagChain {
            store: self.store,
            embedder: self.embedder,
            llm: self.llm,
            history: SessionHistory::new(self.settings.max_history_messages),
            context_builder: ContextBuilder::new(ContextBuilderConfig {
                max_context_length: self.settings.max_context_length,
            }),
            top_k: self.settings.top_k,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainInput;
    use crate::llm::ChatRequest;
    use crate::rag::SqliteVectorStore;
    use async_trait::async_trait;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl ChatProvider for EchoLlm {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
            Ok(request.messages[0].content.clone())
        }
    }

    #[tokio::test]
    async fn built_chain_answers_from_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("v.db")).await.unwrap();
        store
            .insert_batch(vec![(
                crate::rag::Document::from_review(0, "Fan".into(), "Silent at night".into()),
                vec![1.0, 0.0],
            )])
            .await
            .unwrap();

        let chain = RagChainBuilder::new(Arc::new(store), Arc::new(FixedEmbedder), Arc::new(EchoLlm))
            .build_chain()
            .unwrap();

        let output = chain
            .invoke(ChainInput::new("Is it loud?", "user-session"))
            .await
            .unwrap();

        // EchoLlm returns the system prompt, which carries the context block.
        assert!(output.answer.contains("Product: Fan"));
        assert!(output.answer.contains("Silent at night"));
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("v.db")).await.unwrap();

        let result = RagChainBuilder::new(Arc::new(store), Arc::new(FixedEmbedder), Arc::new(EchoLlm))
            .with_settings(ChainSettings {
                top_k: 0,
                ..ChainSettings::default()
            })
            .build_chain();

        assert!(result.is_err());
    }
}

use std::sync::Arc;

use crate::chain::{ChainSettings, RagChainBuilder, RetrievalChain};
use crate::core::config::AppConfig;
use crate::ingest::DataIngestor;
use crate::llm::{ChatProvider, EmbeddingProvider, OpenAiCompatibleClient};
use crate::metrics::AppMetrics;

pub mod error;

use error::InitializationError;

/// Application state shared by every route.
///
/// Built once before the listener is bound; the chain and the vector store
/// behind it are never rebuilt while the process runs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub metrics: AppMetrics,
    pub chain: Arc<dyn RetrievalChain>,
}

impl AppState {
    pub fn new(config: AppConfig, metrics: AppMetrics, chain: Arc<dyn RetrievalChain>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            metrics,
            chain,
        })
    }

    /// Runs the startup sequence:
    /// 1. Register the request counters
    /// 2. Connect the embedding and chat clients
    /// 3. Ingest reviews, or load the persisted index
    /// 4. Build the retrieval chain over the resulting store
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let metrics = AppMetrics::new().map_err(|e| InitializationError::Metrics(e.into()))?;

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OpenAiCompatibleClient::for_embeddings(&config.embedding));
        let llm: Arc<dyn ChatProvider> = Arc::new(OpenAiCompatibleClient::for_chat(&config.llm));

        if config.llm.api_key.is_none() {
            tracing::warn!("No API key configured for the chat model (set GROQ_API_KEY)");
        }

        let store = DataIngestor::new(&config.data, embedder.clone())
            .ingest(config.data.load_existing)
            .await
            .map_err(InitializationError::Ingest)?;

        let chain = RagChainBuilder::new(store, embedder, llm)
            .with_settings(ChainSettings::from(&config.retrieval))
            .build_chain()
            .map_err(|e| InitializationError::Chain(e.into()))?;

        Ok(Self::new(config, metrics, chain))
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Typed view of `config.yml` merged with `secrets.yaml`.
///
/// Every section and field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            debug: defaults::DEBUG,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Review CSV with `product_title` and `review` columns.
    pub csv_path: PathBuf,
    /// SQLite file holding the persisted vector index.
    pub vector_db: PathBuf,
    /// Reuse a populated index instead of re-embedding the CSV.
    pub load_existing: bool,
    pub embedding_batch_size: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(defaults::CSV_PATH),
            vector_db: PathBuf::from(defaults::VECTOR_DB),
            load_existing: true,
            embedding_batch_size: defaults::EMBEDDING_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::EMBEDDING_BASE_URL.to_string(),
            model: defaults::EMBEDDING_MODEL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::LLM_BASE_URL.to_string(),
            model: defaults::LLM_MODEL.to_string(),
            api_key: None,
            temperature: defaults::LLM_TEMPERATURE,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub max_context_length: usize,
    pub max_history_messages: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::TOP_K,
            max_context_length: defaults::MAX_CONTEXT_LENGTH,
            max_history_messages: defaults::MAX_HISTORY_MESSAGES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Session id passed to the chain for every request.
    pub session_id: String,
    pub max_input_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_id: defaults::SESSION_ID.to_string(),
            max_input_length: defaults::MAX_INPUT_LENGTH,
        }
    }
}

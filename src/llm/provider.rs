use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// model identifier sent with every completion request
    fn model_name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// model identifier, recorded alongside persisted vectors
    fn model_name(&self) -> &str;

    /// one embedding per input, in input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

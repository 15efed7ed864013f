use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::provider::{ChatProvider, EmbeddingProvider};
use super::types::ChatRequest;
use crate::core::config::{EmbeddingConfig, LlmConfig};
use crate::core::errors::ApiError;

/// Client for any server speaking the OpenAI REST dialect
/// (`/v1/chat/completions`, `/v1/embeddings`), e.g. Groq or a local
/// text-embeddings server.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            temperature: None,
            max_tokens: None,
            client: Client::new(),
        }
    }

    pub fn for_chat(config: &LlmConfig) -> Self {
        let mut client = Self::new(&config.base_url, &config.model, config.api_key.clone());
        client.temperature = Some(config.temperature);
        client.max_tokens = config.max_tokens;
        client
    }

    pub fn for_embeddings(config: &EmbeddingConfig) -> Self {
        Self::new(&config.base_url, &config.model, config.api_key.clone())
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send_json(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let res = self
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "{} returned {}: {}",
                endpoint, status, text
            )));
        }

        res.json().await.map_err(ApiError::upstream)
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature.or(self.temperature) {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens.or(self.max_tokens) {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let payload = self.send_json("/v1/chat/completions", &body).await?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.to_string())
            .ok_or_else(|| {
                ApiError::Upstream("chat completion response has no message content".to_string())
            })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let payload = self.send_json("/v1/embeddings", &body).await?;

        let Some(data) = payload["data"].as_array() else {
            return Err(ApiError::Upstream(
                "embedding response has no data array".to_string(),
            ));
        };

        // Servers may return items out of order; `index` is authoritative when present.
        let mut items: Vec<(usize, Vec<f32>)> = data
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(position);
                let vector = item["embedding"]
                    .as_array()
                    .map(|vals| {
                        vals.iter()
                            .filter_map(|v| v.as_f64().map(|f| f as f32))
                            .collect()
                    })
                    .unwrap_or_default();
                (index, vector)
            })
            .collect();
        items.sort_by_key(|(index, _)| *index);

        let embeddings: Vec<Vec<f32>> = items.into_iter().map(|(_, vector)| vector).collect();
        if embeddings.len() != inputs.len() {
            return Err(ApiError::Upstream(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }
}

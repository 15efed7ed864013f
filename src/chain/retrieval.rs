use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::history::SessionHistory;
use super::prompts::{qa_system_message, CONTEXTUALIZE_SYSTEM_PROMPT};
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatProvider, ChatRequest, EmbeddingProvider};
use crate::rag::{ContextBuilder, Document, VectorStore};

#[derive(Debug, Clone)]
pub struct ChainInput {
    pub input: String,
    /// Scopes the conversational memory the chain reads and writes.
    pub session_id: String,
}

impl ChainInput {
    pub fn new(input: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            session_id: session_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainOutput {
    pub input: String,
    pub answer: String,
    /// Reviews the answer was grounded on, most similar first.
    pub context: Vec<Document>,
}

/// A callable question-answering pipeline.
#[async_trait]
pub trait RetrievalChain: Send + Sync {
    async fn invoke(&self, input: ChainInput) -> Result<ChainOutput, ApiError>;
}

pub struct HistoryAwareRagChain {
    pub(super) store: Arc<dyn VectorStore>,
    pub(super) embedder: Arc<dyn EmbeddingProvider>,
    pub(super) llm: Arc<dyn ChatProvider>,
    pub(super) history: SessionHistory,
    pub(super) context_builder: ContextBuilder,
    pub(super) top_k: usize,
}

impl HistoryAwareRagChain {
    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    async fn standalone_question(
        &self,
        history: &[ChatMessage],
        input: &str,
    ) -> Result<String, ApiError> {
        if history.is_empty() {
            return Ok(input.to_string());
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(CONTEXTUALIZE_SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(input));

        let rewritten = self.llm.chat(ChatRequest::new(messages)).await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            Ok(input.to_string())
        } else {
            Ok(rewritten.to_string())
        }
    }

    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, ApiError> {
        let mut embeddings = self.embedder.embed(&[question.to_string()]).await?;
        let Some(query) = embeddings.pop() else {
            return Err(ApiError::Upstream(
                "embedding service returned no vector for the question".to_string(),
            ));
        };

        let hits = self.store.search(&query, self.top_k).await?;
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }

    async fn answer(
        &self,
        history: &[ChatMessage],
        input: &str,
        context: &[Document],
    ) -> Result<String, ApiError> {
        let context_block = self.context_builder.build(context);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(qa_system_message(&context_block)));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(input));

        self.llm.chat(ChatRequest::new(messages)).await
    }
}

#[async_trait]
impl RetrievalChain for HistoryAwareRagChain {
    async fn invoke(&self, input: ChainInput) -> Result<ChainOutput, ApiError> {
        let span = tracing::debug_span!(
            "chain",
            run_id = %Uuid::new_v4(),
            session_id = %input.session_id
        );

        async move {
            let history = self.history.messages(&input.session_id).await;

            let question = self.standalone_question(&history, &input.input).await?;
            if question != input.input {
                tracing::debug!("Rewrote question as: {}", question);
            }

            let context = self.retrieve(&question).await?;
            tracing::debug!("Retrieved {} reviews", context.len());

            let answer = self.answer(&history, &input.input, &context).await?;

            self.history
                .append_exchange(&input.session_id, &input.input, &answer)
                .await;

            Ok(ChainOutput {
                input: input.input,
                answer,
                context,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::ScoredDocument;
    use std::sync::Mutex;

    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    let text = text.to_lowercase();
                    vec![
                        text.contains("battery") as u8 as f32,
                        text.contains("bass") as u8 as f32,
                    ]
                })
                .collect())
        }
    }

    struct MemoryStore {
        items: Vec<(Document, Vec<f32>)>,
    }

    #[async_trait]
    impl VectorStore for MemoryStore {
        async fn insert_batch(&self, _items: Vec<(Document, Vec<f32>)>) -> Result<(), ApiError> {
            Ok(())
        }

        async fn search(
            &self,
            query_embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<ScoredDocument>, ApiError> {
            let mut hits: Vec<ScoredDocument> = self
                .items
                .iter()
                .map(|(document, vector)| ScoredDocument {
                    document: document.clone(),
                    score: vector.iter().zip(query_embedding).map(|(a, b)| a * b).sum(),
                })
                .collect();
            hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            hits.truncate(limit);
            Ok(hits)
        }

        async fn count(&self) -> Result<usize, ApiError> {
            Ok(self.items.len())
        }

        async fn embedding_model(&self) -> Result<Option<String>, ApiError> {
            Ok(Some("keyword".to_string()))
        }

        async fn clear(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn set_embedding_model(&self, _embedding_model: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Rewrites by prefixing "battery", answers by echoing the context size.
    #[derive(Default)]
    struct ScriptedLlm {
        requests: Mutex<Vec<ChatRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ApiError::Upstream("llm unavailable".to_string()));
            }
            let system = &request.messages[0].content;
            let last = &request.messages.last().unwrap().content;
            if system == CONTEXTUALIZE_SYSTEM_PROMPT {
                Ok(format!("battery: {}", last))
            } else {
                Ok(format!("answer to {}", last))
            }
        }
    }

    fn chain_with(llm: Arc<ScriptedLlm>) -> HistoryAwareRagChain {
        let items = vec![
            (
                Document::from_review(0, "Phone".into(), "Battery lasts two days".into()),
                vec![1.0, 0.0],
            ),
            (
                Document::from_review(1, "Earbuds".into(), "Deep bass".into()),
                vec![0.0, 1.0],
            ),
        ];
        HistoryAwareRagChain {
            store: Arc::new(MemoryStore { items }),
            embedder: Arc::new(KeywordEmbedder),
            llm,
            history: SessionHistory::new(10),
            context_builder: ContextBuilder::default(),
            top_k: 1,
        }
    }

    #[tokio::test]
    async fn first_turn_answers_without_rewrite() {
        let llm = Arc::new(ScriptedLlm::default());
        let chain = chain_with(llm.clone());

        let output = chain
            .invoke(ChainInput::new("How is the battery?", "s1"))
            .await
            .unwrap();

        assert_eq!(output.answer, "answer to How is the battery?");
        assert_eq!(output.context.len(), 1);
        assert_eq!(output.context[0].product_name(), "Phone");

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[0].content.contains("Battery lasts two days"));
    }

    #[tokio::test]
    async fn follow_up_rewrites_with_history_and_retrieves_on_rewrite() {
        let llm = Arc::new(ScriptedLlm::default());
        let chain = chain_with(llm.clone());

        chain
            .invoke(ChainInput::new("Tell me about the bass", "s1"))
            .await
            .unwrap();
        let output = chain
            .invoke(ChainInput::new("and how long does it last?", "s1"))
            .await
            .unwrap();

        // The rewrite mentions "battery", so the phone review wins retrieval.
        assert_eq!(output.context[0].product_name(), "Phone");
        assert_eq!(output.answer, "answer to and how long does it last?");

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].messages[0].content, CONTEXTUALIZE_SYSTEM_PROMPT);
        // system + previous exchange + new question
        assert_eq!(requests[2].messages.len(), 4);
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let llm = Arc::new(ScriptedLlm::default());
        let chain = chain_with(llm.clone());

        chain.invoke(ChainInput::new("bass?", "alice")).await.unwrap();
        chain.invoke(ChainInput::new("bass?", "bob")).await.unwrap();

        assert_eq!(llm.requests.lock().unwrap().len(), 2);
        assert_eq!(chain.history().messages("bob").await.len(), 2);
    }

    #[tokio::test]
    async fn llm_failure_propagates_and_leaves_history_untouched() {
        let llm = Arc::new(ScriptedLlm {
            fail: true,
            ..Default::default()
        });
        let chain = chain_with(llm);

        let err = chain
            .invoke(ChainInput::new("battery?", "s1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Upstream(_)));
        assert!(chain.history().messages("s1").await.is_empty());
    }
}

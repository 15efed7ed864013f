pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiCompatibleClient;
pub use provider::{ChatProvider, EmbeddingProvider};
pub use types::{ChatMessage, ChatRequest};

//! Review retrieval: document model, vector store, and context formatting.

mod context_builder;
mod sqlite;
mod store;

pub use context_builder::{ContextBuilder, ContextBuilderConfig};
pub use sqlite::SqliteVectorStore;
pub use store::{Document, ScoredDocument, VectorStore};

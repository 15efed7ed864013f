//! Retrieval chain: history-aware question rewriting, retrieval, and
//! answer generation over the review index.

mod builder;
mod history;
mod prompts;
mod retrieval;

pub use builder::{ChainSettings, RagChainBuilder};
pub use history::SessionHistory;
pub use retrieval::{ChainInput, ChainOutput, HistoryAwareRagChain, RetrievalChain};

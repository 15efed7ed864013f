//! Product-review question answering over HTTP.
//!
//! Startup ingests a review CSV into a persisted vector index and builds a
//! history-aware retrieval chain; the server then answers chat messages with it.

pub mod chain;
pub mod core;
pub mod ingest;
pub mod llm;
pub mod metrics;
pub mod rag;
pub mod server;
pub mod state;

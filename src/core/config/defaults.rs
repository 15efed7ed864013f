//! Default values for every configurable knob.
//!
//! The model and endpoint defaults match the deployment this service was
//! built for: Groq for generation, a BGE model served behind an
//! OpenAI-compatible embeddings endpoint.

pub const HOST: &str = "0.0.0.0";
pub const PORT: u16 = 5000;
pub const DEBUG: bool = true;

pub const CSV_PATH: &str = "data/flipkart_product_review.csv";
pub const VECTOR_DB: &str = "vector_store.db";
pub const EMBEDDING_BATCH_SIZE: usize = 32;

pub const EMBEDDING_BASE_URL: &str = "http://127.0.0.1:8080";
pub const EMBEDDING_MODEL: &str = "BAAI/bge-base-en-v1.5";

pub const LLM_BASE_URL: &str = "https://api.groq.com/openai";
pub const LLM_MODEL: &str = "llama-3.1-8b-instant";
pub const LLM_TEMPERATURE: f64 = 0.5;

pub const TOP_K: usize = 3;
pub const MAX_CONTEXT_LENGTH: usize = 4000;
pub const MAX_HISTORY_MESSAGES: usize = 20;

pub const SESSION_ID: &str = "user-session";
pub const MAX_INPUT_LENGTH: usize = 4000;

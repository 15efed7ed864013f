use thiserror::Error;

use crate::ingest::IngestError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to initialize metrics: {0}")]
    Metrics(#[source] anyhow::Error),

    #[error("Failed to ingest reviews: {0}")]
    Ingest(#[source] IngestError),

    #[error("Failed to build retrieval chain: {0}")]
    Chain(#[source] anyhow::Error),
}

//! Review ingestion: CSV rows become documents, documents become a
//! persisted vector index.

mod converter;
mod ingestor;

pub use converter::{ConvertError, DataConverter};
pub use ingestor::{DataIngestor, IngestError};

use std::fs::File;
use std::path::PathBuf;

use thiserror::Error;

use crate::rag::Document;

const TITLE_COLUMN: &str = "product_title";
const REVIEW_COLUMN: &str = "review";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Reads the review CSV and produces one [`Document`] per row.
pub struct DataConverter {
    file_path: PathBuf,
}

impl DataConverter {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Rows keep their file order; empty cells become empty strings.
    pub fn convert(&self) -> Result<Vec<Document>, ConvertError> {
        let file = File::open(&self.file_path).map_err(|source| ConvertError::Io {
            path: self.file_path.clone(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = reader.headers().map_err(|source| self.csv_error(source))?;
        let title_idx = self.column_index(headers, TITLE_COLUMN)?;
        let review_idx = self.column_index(headers, REVIEW_COLUMN)?;

        let mut docs = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|source| self.csv_error(source))?;
            let product_title = record.get(title_idx).unwrap_or_default().to_string();
            let review = record.get(review_idx).unwrap_or_default().to_string();
            docs.push(Document::from_review(row, product_title, review));
        }

        tracing::debug!(
            "Converted {} review rows from {}",
            docs.len(),
            self.file_path.display()
        );
        Ok(docs)
    }

    fn column_index(
        &self,
        headers: &csv::StringRecord,
        column: &'static str,
    ) -> Result<usize, ConvertError> {
        headers
            .iter()
            .position(|header| header.trim() == column)
            .ok_or_else(|| ConvertError::MissingColumn {
                path: self.file_path.clone(),
                column,
            })
    }

    fn csv_error(&self, source: csv::Error) -> ConvertError {
        ConvertError::Csv {
            path: self.file_path.clone(),
            source,
        }
    }
}

//! Context Builder.
//!
//! Turns retrieved reviews into the `CONTEXT` block of the answer prompt:
//! one numbered entry per review with its product name, in retrieval order,
//! capped at a maximum character budget.

use serde::{Deserialize, Serialize};

use super::store::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBuilderConfig {
    /// Maximum total context length in characters
    pub max_context_length: usize,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            max_context_length: 4000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: ContextBuilderConfig,
}

impl ContextBuilder {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    /// Format documents into a context string.
    ///
    /// Entries that would overflow the budget are dropped; the first entry is
    /// truncated rather than dropped so a relevant review is never lost entirely.
    pub fn build(&self, documents: &[Document]) -> String {
        let max_length = self.config.max_context_length;
        let mut context = String::new();
        let mut current_length = 0;

        for (i, document) in documents.iter().enumerate() {
            let entry = format!(
                "[{}] Product: {}\nReview: {}\n\n",
                i + 1,
                document.product_name(),
                document.content.trim()
            );
            let entry_length = entry.chars().count();

            if current_length + entry_length > max_length {
                if i == 0 {
                    context.extend(entry.chars().take(max_length));
                }
                break;
            }

            context.push_str(&entry);
            current_length += entry_length;
        }

        context.trim().to_string()
    }
}

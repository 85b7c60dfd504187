// Embeddings module
// Maps text to vectors through a remote embedding API

pub mod openai;

#[cfg(test)]
pub(crate) mod test_support;

pub use openai::OpenAiClient;

use crate::{QuoteSearchError, Result};

/// Anything that can turn text into vectors of one fixed embedding space.
///
/// Ingest and query must use the same provider, otherwise stored and query
/// vectors are not comparable. Nothing checks this at runtime.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed documents in order, one vector per input
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])?
            .pop()
            .ok_or_else(|| QuoteSearchError::Embedding("Provider returned no vector".to_string()))
    }
}

use crate::{QuoteSearchError, Result};

use super::EmbeddingProvider;

pub(crate) const TEST_DIMENSION: usize = 256;

/// Deterministic bag-of-words embedder for tests
pub(crate) struct KeywordEmbedder;

impl KeywordEmbedder {
    pub(crate) fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; TEST_DIMENSION];
        // Last slot keeps every vector non-zero
        vector[TEST_DIMENSION - 1] = 0.1;

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % (TEST_DIMENSION - 1)] += 1.0;
        }
        vector
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Provider that always fails, standing in for an unreachable API
pub(crate) struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(QuoteSearchError::Embedding(
            "Client error: HTTP 401".to_string(),
        ))
    }
}

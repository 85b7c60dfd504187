// LanceDB vector database module
// Stores quote vectors with their document text and metadata

#[cfg(test)]
mod tests;

pub mod vector_store;

pub use vector_store::{QuoteCollection, QuoteMatch};

use crate::dataset::{QuoteDocument, QuoteMetadata};

/// Row stored in the collection
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub id: String,
    pub vector: Vec<f32>,
    /// Display text of the quote
    pub document: String,
    pub metadata: QuoteMetadata,
}

impl QuoteRecord {
    #[inline]
    pub fn from_document(document: QuoteDocument, vector: Vec<f32>) -> Self {
        Self {
            id: document.id,
            vector,
            document: document.text,
            metadata: document.metadata,
        }
    }
}

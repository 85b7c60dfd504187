// Ingest module
// One-shot pipeline: dataset file -> documents -> embeddings -> collection snapshot

#[cfg(test)]
mod tests;

use std::path::Path;

use tracing::{info, warn};

use crate::Result;
use crate::database::{QuoteCollection, QuoteRecord};
use crate::dataset::{load_quotes, normalize_quotes};
use crate::embeddings::EmbeddingProvider;

/// Outcome of an ingest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub collection: String,
    pub ingested: usize,
    /// Records dropped because their quote was not a string
    pub skipped: usize,
}

/// Replace the contents of `collection` with the quotes in `dataset_path`.
///
/// Every document is embedded before the collection is touched, so a
/// provider failure leaves the previous snapshot in place.
#[inline]
pub async fn ingest<P, E>(
    dataset_path: P,
    provider: &E,
    collection: &mut QuoteCollection,
) -> Result<IngestReport>
where
    P: AsRef<Path>,
    E: EmbeddingProvider + ?Sized,
{
    let dataset_path = dataset_path.as_ref();
    info!("Ingesting quotes from {}", dataset_path.display());

    let records = load_quotes(dataset_path)?;
    let dataset = normalize_quotes(&records);
    if dataset.skipped > 0 {
        warn!(
            "Skipped {} of {} records without a string quote",
            dataset.skipped,
            records.len()
        );
    }

    let vectors = provider.embed_documents(&dataset.texts())?;
    if vectors.len() != dataset.documents.len() {
        return Err(crate::QuoteSearchError::Embedding(format!(
            "Expected {} vectors, provider returned {}",
            dataset.documents.len(),
            vectors.len()
        )));
    }

    let skipped = dataset.skipped;
    let quote_records: Vec<QuoteRecord> = dataset
        .documents
        .into_iter()
        .zip(vectors)
        .map(|(document, vector)| QuoteRecord::from_document(document, vector))
        .collect();

    collection.replace_all(&quote_records).await?;

    let report = IngestReport {
        collection: collection.name().to_string(),
        ingested: quote_records.len(),
        skipped,
    };
    info!(
        "Ingested {} quotes into collection '{}'",
        report.ingested, report.collection
    );
    Ok(report)
}

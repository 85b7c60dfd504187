// Dataset module
// Reads the quotations file and turns each record into an indexable document


use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::{QuoteSearchError, Result};

const QUOTE_FIELD: &str = "Quote";
const AUTHOR_FIELD: &str = "Author";
const CATEGORY_FIELD: &str = "Category";

/// Metadata passed through alongside each vector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMetadata {
    pub author: Option<String>,
    pub category: Option<String>,
}

/// A quote ready to be embedded and stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDocument {
    /// Positional identifier, `quote_<index>`
    pub id: String,
    /// Display text that gets embedded
    pub text: String,
    pub metadata: QuoteMetadata,
}

/// Result of the validation step over the raw records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedDataset {
    pub documents: Vec<QuoteDocument>,
    /// Records dropped because their `Quote` field was not a string
    pub skipped: usize,
}

impl NormalizedDataset {
    #[inline]
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }
}

/// Read the dataset file and return its records.
///
/// The file must hold a JSON array whose elements are all objects.
#[inline]
pub fn load_quotes<P: AsRef<Path>>(path: P) -> Result<Vec<Value>> {
    let path = path.as_ref();
    debug!("Loading quotes from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| {
        QuoteSearchError::Dataset(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_quotes(&content)
        .map_err(|e| QuoteSearchError::Dataset(format!("{}: {}", path.display(), e)))
}

/// Parse dataset contents already read into memory
#[inline]
pub fn parse_quotes(content: &str) -> std::result::Result<Vec<Value>, String> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| format!("malformed JSON: {}", e))?;

    let Value::Array(records) = value else {
        return Err("expected a JSON array of quote records".to_string());
    };

    if let Some(position) = records.iter().position(|r| !r.is_object()) {
        return Err(format!("record {} is not a JSON object", position));
    }

    Ok(records)
}

/// Keep the records whose `Quote` is a string and build their documents.
///
/// Identifiers come from the position in `records`, so a skipped record
/// leaves a gap rather than shifting later ids.
#[inline]
pub fn normalize_quotes(records: &[Value]) -> NormalizedDataset {
    let mut dataset = NormalizedDataset::default();

    for (index, record) in records.iter().enumerate() {
        let Some(quote) = record.get(QUOTE_FIELD).and_then(Value::as_str) else {
            debug!("Skipping record {}: quote is not a string", index);
            dataset.skipped += 1;
            continue;
        };

        let author = string_field(record, AUTHOR_FIELD);
        let category = string_field(record, CATEGORY_FIELD);

        dataset.documents.push(QuoteDocument {
            id: quote_id(index),
            text: display_text(quote, author.as_deref()),
            metadata: QuoteMetadata { author, category },
        });
    }

    info!(
        "Normalized {} quotes ({} skipped)",
        dataset.documents.len(),
        dataset.skipped
    );
    dataset
}

/// Text stored and embedded for a quote
#[inline]
pub fn display_text(quote: &str, author: Option<&str>) -> String {
    let text = match author {
        Some(author) => format!("\"{}\" \u{2014} {}", quote, author),
        None => quote.to_string(),
    };
    text.replace('\n', " ")
}

#[inline]
pub fn quote_id(index: usize) -> String {
    format!("quote_{}", index)
}

fn string_field(record: &Value, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_string)
}

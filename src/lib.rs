use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuoteSearchError>;

#[derive(Error, Debug)]
pub enum QuoteSearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Collection '{0}' not found, run `quote-search ingest` first")]
    CollectionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod dataset;
pub mod embeddings;
pub mod ingest;
pub mod server;

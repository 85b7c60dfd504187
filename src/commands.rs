use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::QuoteCollection;
use crate::embeddings::OpenAiClient;
use crate::ingest::{IngestReport, ingest};
use crate::server::{AppState, start_server};

/// Rebuild the collection from the configured dataset file
#[inline]
pub async fn run_ingest(config: &Config) -> Result<IngestReport> {
    let client =
        OpenAiClient::new(&config.embedding).context("Failed to initialize embedding client")?;

    let mut collection = QuoteCollection::open_or_create(config)
        .await
        .context("Failed to open vector collection")?;

    let report = ingest(&config.dataset.path, &client, &mut collection)
        .await
        .context("Ingest failed")?;

    println!(
        "Ingested {} quotes into collection '{}'",
        report.ingested, report.collection
    );
    if report.skipped > 0 {
        println!("Skipped {} records without a text quote", report.skipped);
    }

    Ok(report)
}

/// Start the HTTP query service; fails before binding when nothing was ingested
#[inline]
pub async fn serve_http(config: &Config) -> Result<()> {
    let collection = QuoteCollection::open_existing(config)
        .await
        .context("Failed to open vector collection")?;

    let client =
        OpenAiClient::new(&config.embedding).context("Failed to initialize embedding client")?;
    info!(
        "Serving collection '{}' with model {}",
        collection.name(),
        client.model()
    );

    let addr = config
        .server
        .bind_address()
        .context("Invalid server address")?;
    let state = AppState::new(client, collection, config.server.top_k);

    start_server(addr, state).await?;
    Ok(())
}

/// Print configuration, credential and collection status
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("Quote Search Status");
    println!("{}", "=".repeat(40));

    println!("Embedding provider:");
    println!("   Endpoint: {}", config.embedding.embeddings_url()?);
    println!("   Model: {}", config.embedding.model);
    if config.embedding.api_key().is_some() {
        println!("   API key: set ({})", config.embedding.api_key_env);
    } else {
        println!("   API key: missing, set {}", config.embedding.api_key_env);
    }

    println!("Vector store:");
    println!("   Path: {}", config.store.path.display());
    match QuoteCollection::open_existing(config).await {
        Ok(collection) => {
            let count = collection.count().await?;
            println!(
                "   Collection '{}': {} documents ({} dimensions)",
                collection.name(),
                count,
                collection.vector_dimension()
            );
        }
        Err(crate::QuoteSearchError::CollectionNotFound(name)) => {
            println!("   Collection '{}': not ingested yet", name);
        }
        Err(e) => {
            warn!("Failed to open collection: {}", e);
            println!("   Collection '{}': unavailable ({})", config.store.collection, e);
        }
    }

    println!("Dataset: {}", config.dataset.path.display());
    println!(
        "Server: http://{}:{} (top {} results)",
        config.server.host, config.server.port, config.server.top_k
    );

    Ok(())
}

/// Print the effective configuration as TOML
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Write a default configuration file, refusing to overwrite an existing one
#[inline]
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }

    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

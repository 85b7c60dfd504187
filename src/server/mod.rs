//! HTTP query service.
//!
//! Exposes `POST /search` over a collection built by the ingest pipeline,
//! plus a small `GET /health` probe. Handles are created once at startup
//! and shared through [`AppState`].

pub mod errors;
pub mod handlers;


use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use errors::ApiError;

use crate::database::QuoteCollection;
use crate::embeddings::EmbeddingProvider;
use crate::{QuoteSearchError, Result};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Must embed into the same space the collection was ingested with
    pub provider: Arc<dyn EmbeddingProvider>,
    pub collection: Arc<QuoteCollection>,
    /// Number of results returned per query
    pub top_k: usize,
}

impl AppState {
    #[inline]
    pub fn new<E>(provider: E, collection: QuoteCollection, top_k: usize) -> Self
    where
        E: EmbeddingProvider + 'static,
    {
        Self {
            provider: Arc::new(provider),
            collection: Arc::new(collection),
            top_k,
        }
    }
}

/// Build the router with permissive CORS and request tracing
#[inline]
pub fn create_router(state: AppState) -> Router {
    // Any origin, method and header: meant for a local browser frontend.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(handlers::search))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C
#[inline]
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        QuoteSearchError::Other(anyhow::anyhow!("Failed to bind {}: {}", addr, e))
    })?;

    info!("Query service listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Query service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

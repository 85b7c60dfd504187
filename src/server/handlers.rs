use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use super::errors::ApiError;
use crate::database::QuoteMatch;
use crate::dataset::QuoteMetadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub quote: String,
    pub metadata: QuoteMetadata,
    /// Cosine distance, lower is closer
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents: usize,
}

impl From<QuoteMatch> for SearchResult {
    fn from(hit: QuoteMatch) -> Self {
        Self {
            quote: hit.document,
            metadata: hit.metadata,
            score: hit.distance,
        }
    }
}

/// `POST /search`: the `top_k` stored quotes closest to the query text
#[inline]
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload?;
    debug!("Search query (length: {})", request.query.len());

    // The provider client blocks on HTTP.
    let provider = Arc::clone(&state.provider);
    let vector = tokio::task::spawn_blocking(move || provider.embed_query(&request.query))
        .await
        .map_err(|e| ApiError::Internal(format!("Embedding task failed: {}", e)))??;

    let hits = state.collection.query(&vector, state.top_k).await?;

    Ok(Json(SearchResponse {
        results: hits.into_iter().map(SearchResult::from).collect(),
    }))
}

/// `GET /health`
#[inline]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let documents = state.collection.count().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        documents,
    }))
}

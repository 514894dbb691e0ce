//! # Cache Admin Interface
//!
//! Admin endpoint for cache store health, consumed by the surrounding HTTP
//! layer and by deployment probes.

use crate::caching::context::CacheContext;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

/// Cache admin state
#[derive(Clone)]
pub struct CacheAdminState {
    pub cache: CacheContext,
}

/// Cache admin router
pub struct CacheAdminRouter;

impl CacheAdminRouter {
    /// Create the cache admin router
    pub fn create_router(state: CacheAdminState) -> Router {
        Router::new()
            .route("/cache/health", get(get_cache_health))
            .with_state(state)
    }
}

/// Cache health response
#[derive(Debug, Serialize)]
pub struct CacheHealthResponse {
    /// Result of an active liveness probe against the backend
    pub healthy: bool,

    /// Health flag as of the last completed command, before the probe
    pub last_known_healthy: bool,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Probe cache store health
pub async fn get_cache_health(State(state): State<CacheAdminState>) -> Json<CacheHealthResponse> {
    let last_known_healthy = state.cache.store.is_healthy();
    let healthy = state.cache.store.ping().await;

    Json(CacheHealthResponse {
        healthy,
        last_known_healthy,
        timestamp: chrono::Utc::now(),
    })
}

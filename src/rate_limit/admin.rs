//! # Rate Limit Admin Interface
//!
//! Admin endpoints layered on the rate limiter: per-client quota inspection
//! across all policies, and a bulk reset of every counter in the rate-limit
//! namespace.

use super::{RateLimiter, ALL_POLICIES, REMAINING_UNKNOWN};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Rate limit admin state
#[derive(Clone)]
pub struct RateLimitAdminState {
    pub limiter: Arc<RateLimiter>,
}

/// Rate limit admin router
pub struct RateLimitAdminRouter;

impl RateLimitAdminRouter {
    /// Create the rate limit admin router
    pub fn create_router(state: RateLimitAdminState) -> Router {
        Router::new()
            .route("/rate-limits/:client_ip", get(get_client_quota))
            .route("/rate-limits/clear", post(clear_rate_limits))
            .with_state(state)
    }
}

/// Quota standing for one policy
#[derive(Debug, Serialize)]
pub struct PolicyQuota {
    pub policy: &'static str,
    pub limit: u32,

    /// Requests left in the current window; -1 when no window exists yet,
    /// meaning the full quota is available
    pub remaining: i64,

    /// Seconds until the current window resets; absent when no window exists
    pub reset_in_seconds: Option<u64>,
}

/// Per-client quota response across all policies
#[derive(Debug, Serialize)]
pub struct ClientQuotaResponse {
    pub client_ip: String,
    pub policies: Vec<PolicyQuota>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Bulk reset response
#[derive(Debug, Serialize)]
pub struct ClearRateLimitsResponse {
    pub success: bool,
    pub cleared: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Get remaining quota for a client IP under every policy
pub async fn get_client_quota(
    State(state): State<RateLimitAdminState>,
    Path(client_ip): Path<String>,
) -> Json<ClientQuotaResponse> {
    let mut policies = Vec::with_capacity(ALL_POLICIES.len());

    for policy in &ALL_POLICIES {
        let remaining = state.limiter.remaining(policy, &client_ip).await;
        let reset_in_seconds = if remaining == REMAINING_UNKNOWN {
            None
        } else {
            state
                .limiter
                .reset_in(policy, &client_ip)
                .await
                .map(|d| d.as_secs())
        };

        policies.push(PolicyQuota {
            policy: policy.name,
            limit: policy.max_requests,
            remaining,
            reset_in_seconds,
        });
    }

    Json(ClientQuotaResponse {
        client_ip,
        policies,
        timestamp: chrono::Utc::now(),
    })
}

/// Clear every rate-limit counter
pub async fn clear_rate_limits(
    State(state): State<RateLimitAdminState>,
) -> Json<ClearRateLimitsResponse> {
    let cleared = state.limiter.clear_all().await;
    info!("Cleared {} rate-limit counters via admin API", cleared);

    Json(ClearRateLimitsResponse {
        success: true,
        cleared,
        timestamp: chrono::Utc::now(),
    })
}

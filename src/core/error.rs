//! # Error Handling Module
//!
//! This module provides the error taxonomy for the storefront core using the
//! `thiserror` crate. The split mirrors the propagation policy: cache-layer
//! errors (`crate::caching::CacheError`) are absorbed at the cache boundary
//! and never reach this type; `CoreError` covers the record-store flows and
//! the admin surface, with proper HTTP status code mappings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the commerce flows
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can surface from the commerce flows and admin surface
///
/// Cache-store unavailability is deliberately absent: every cache operation
/// degrades locally inside the caching layer and is never reported here.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    /// Configuration-related errors (invalid config, missing connection settings)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Record store failures (reads or writes that did not complete)
    #[error("Record store error: {message}")]
    Repository { message: String },

    /// A referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Stock decrement would drive a product's stock negative
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    /// Request denied by a rate-limit policy; the only error that changes
    /// the HTTP-level outcome for an otherwise valid request
    #[error("Rate limit exceeded for policy {policy}")]
    RateLimitExceeded { policy: String, retry_after_seconds: u64 },

    /// Request validation errors (malformed ids, bad quantities)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal errors for unexpected failures
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Convenience constructor for repository failures
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    /// Convenience constructor for configuration failures
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Convenience constructor for internal failures
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map error variants to HTTP status codes
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Repository { .. } => StatusCode::BAD_GATEWAY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InsufficientStock { .. } => StatusCode::CONFLICT,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

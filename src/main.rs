//! # Storefront Cache Core - Admin Server Entry Point
//!
//! Loads configuration, initializes logging, builds the cache context over
//! the Redis backend, and serves the admin surface (rate-limit quota
//! inspection and reset, cache health). The connection itself is lazy: the
//! process starts even when Redis is down, and every cache path degrades
//! until it recovers.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use storefront_cache::caching::backend::{RedisBackend, RedisBackendConfig};
use storefront_cache::caching::{CacheAdminRouter, CacheAdminState, CacheContext};
use storefront_cache::core::AppConfig;
use storefront_cache::rate_limit::{RateLimitAdminRouter, RateLimitAdminState, RateLimiter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().await?;
    init_logging(&config);

    info!("Starting storefront cache core v{}", env!("CARGO_PKG_VERSION"));

    let backend = RedisBackend::new(RedisBackendConfig {
        url: config.cache.redis_url.clone(),
        key_prefix: config.cache.key_prefix.clone(),
        connect_timeout: config.cache.connect_timeout,
    })
    .context("Failed to construct cache backend")?;

    let cache = CacheContext::with_timeout(Arc::new(backend), config.cache.command_timeout);
    let limiter = Arc::new(RateLimiter::new(cache.store.clone()));

    let admin_routes = RateLimitAdminRouter::create_router(RateLimitAdminState {
        limiter: limiter.clone(),
    })
    .merge(CacheAdminRouter::create_router(CacheAdminState {
        cache: cache.clone(),
    }));

    let admin_router = axum::Router::new()
        .nest("/admin", admin_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.admin.bind_address, config.admin.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind admin server to {}", addr))?;

    info!("Admin server listening on {}", addr);

    axum::serve(listener, admin_router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Admin server error")?;

    info!("Storefront cache core shutdown complete");
    Ok(())
}

/// Load configuration from the file named by STOREFRONT_CONFIG, or from
/// defaults plus environment overrides
async fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("STOREFRONT_CONFIG") {
        Ok(path) => AppConfig::load_from_file(&path)
            .await
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => AppConfig::from_env().context("Invalid configuration")?,
    };
    Ok(config)
}

/// Initialize structured logging
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level));

    if config.log.json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(filter)
            .init();
    }
}

/// Resolve on ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

mod analysis;
mod config;
mod errors;
mod llm_client;
mod rate_limit;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, CounterBackend};
use crate::llm_client::GeminiClient;
use crate::rate_limit::{CounterStore, MemoryCounterStore, RateLimiter, RedisCounterStore};
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing API key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting matchscore v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    // Initialize the usage counter store; an unreachable Redis aborts startup
    let store: Arc<dyn CounterStore> = match config.counter_backend {
        CounterBackend::Redis => Arc::new(
            RedisCounterStore::connect(&config.redis_url)
                .await
                .context("Could not connect to Redis")?,
        ),
        CounterBackend::Memory => {
            warn!("Using in-memory usage counters; limits are not shared between instances");
            Arc::new(MemoryCounterStore::new())
        }
    };
    let limiter = RateLimiter::new(store, config.rate_limit_max, config.rate_limit_window);
    info!(
        "Rate limit: {} requests per {}s",
        limiter.max_requests(),
        config.rate_limit_window.as_secs()
    );

    // Initialize completion client
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.upstream_timeout,
    )
    .context("Failed to create Gemini client")?;
    info!("Gemini client initialized (model: {})", llm.model());

    let state = AppState {
        limiter,
        llm: Arc::new(llm),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

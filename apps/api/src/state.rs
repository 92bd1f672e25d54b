use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every dependency is constructed in `main` and passed in here.
#[derive(Clone)]
pub struct AppState {
    pub limiter: RateLimiter,
    /// Pluggable completion backend. Default: `GeminiClient`.
    pub llm: Arc<dyn CompletionService>,
    pub config: Config,
}

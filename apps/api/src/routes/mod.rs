pub mod health;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/healthz", get(health::health_handler))
        .route(
            "/chat",
            post(handlers::handle_chat).fallback(handlers::handle_chat_method_not_allowed),
        )
        .fallback_service(static_files)
        .with_state(state)
}

/// Any origin, GET/POST/OPTIONS, `Content-Type` only.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /healthz
/// Returns availability, deployment environment, and service version.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "environment": state.config.environment,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

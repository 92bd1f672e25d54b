//! Axum route handlers for the analysis API.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::models::AnalysisRequest;
use crate::analysis::normalizer::normalize;
use crate::analysis::prompts::build_prompt;
use crate::errors::AppError;
use crate::llm_client::{Completion, LlmError};
use crate::state::AppState;

/// POST /chat
///
/// Rate check → body decode → prompt → completion → safety check →
/// normalization → JSON response. Every step is terminal on failure.
/// The body is taken as raw bytes so it is only decoded once the request
/// has been counted.
pub async fn handle_chat(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let client = crate::rate_limit::client_key(&headers, peer.map(|ConnectInfo(addr)| addr));
    let span = info_span!("chat", request_id = %Uuid::new_v4(), client = %client);

    async move {
        let result = analyze(&state, &client, &body).await;
        if let Err(e) = &result {
            if e.status().is_server_error() {
                error!("Chat request failed: {e}");
            }
        }
        result
    }
    .instrument(span)
    .await
}

/// Any method other than POST on /chat.
pub async fn handle_chat_method_not_allowed() -> AppError {
    AppError::InvalidMethod
}

async fn analyze(state: &AppState, client: &str, body: &[u8]) -> Result<Response, AppError> {
    let usage = state.limiter.check(client).await?;

    let request: AnalysisRequest =
        serde_json::from_slice(body).map_err(|e| AppError::InvalidBody(e.to_string()))?;
    info!(
        "Received request (usage: {}/{})",
        usage.count, usage.limit
    );

    let prompt = build_prompt(&request.resume, &request.job_description);
    let completion = request_completion(state, &prompt).await?;

    let analysis = normalize(&completion)?;
    info!(
        "Successfully received and parsed analysis. Match score: {}%",
        analysis.match_score
    );

    let body = serde_json::to_vec(&analysis)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn request_completion(state: &AppState, prompt: &str) -> Result<Completion, AppError> {
    let timeout = state.config.upstream_timeout;
    match tokio::time::timeout(timeout, state.llm.complete(prompt)).await {
        Ok(Ok(completion)) => Ok(completion),
        Ok(Err(LlmError::Timeout)) | Err(_) => Err(AppError::UpstreamTimeout(timeout)),
        Ok(Err(e)) => Err(AppError::UpstreamCallFailure(e.to_string())),
    }
}

use std::time::Duration;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::rate_limit::StoreError;

/// Terminal failure of a single `/chat` request.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Bodies are plain text; internal detail stays in the logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    InvalidMethod,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Rate limit of {limit} requests exceeded")]
    RateLimited { limit: i64 },

    #[error("Counter store error for client {key}: {source}")]
    StoreFailure {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Completion service call failed: {0}")]
    UpstreamCallFailure(String),

    #[error("Completion service did not answer within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Completion blocked by the safety filter")]
    SafetyBlocked,

    #[error("Completion service returned no content")]
    EmptyResponse,

    #[error("Completion text is not a valid analysis: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode response: {0}")]
    EncodeFailure(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidBody(_) | AppError::SafetyBlocked => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::StoreFailure { .. }
            | AppError::UpstreamCallFailure(_)
            | AppError::UpstreamTimeout(_)
            | AppError::EmptyResponse
            | AppError::MalformedResponse(_)
            | AppError::EncodeFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::InvalidMethod => "Only POST method is allowed".to_string(),
            AppError::InvalidBody(_) => "Invalid request body".to_string(),
            AppError::RateLimited { limit } => {
                format!("You have reached the limit of {limit} requests per day.")
            }
            AppError::StoreFailure { .. } => "Could not process request".to_string(),
            AppError::UpstreamCallFailure(_) | AppError::UpstreamTimeout(_) => {
                "Failed to get analysis from AI model".to_string()
            }
            AppError::SafetyBlocked => "The analysis was blocked by the content safety filter. \
                This can happen due to sensitive information. Please try again with different text."
                .to_string(),
            AppError::EmptyResponse => "Received an empty response from the AI model".to_string(),
            AppError::MalformedResponse(_) => "Failed to parse AI model response".to_string(),
            AppError::EncodeFailure(_) => "Failed to encode response".to_string(),
        };

        let status = self.status();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            return (status, [(header::ALLOW, "POST")], message).into_response();
        }
        (status, message).into_response()
    }
}

//! Turns a raw completion into an `AnalysisResponse`.
//!
//! Order matters: the safety verdict is read from candidate metadata before
//! any text is looked at, so a blocked completion is never parsed even when
//! its text happens to be valid JSON.

use tracing::{debug, warn};

use crate::analysis::models::{AnalysisResponse, RawAnalysis};
use crate::errors::AppError;
use crate::llm_client::Completion;

pub fn normalize(completion: &Completion) -> Result<AnalysisResponse, AppError> {
    if completion.is_safety_blocked() {
        warn!("Completion was blocked due to safety settings");
        return Err(AppError::SafetyBlocked);
    }

    let text = completion.text().ok_or(AppError::EmptyResponse)?;
    let cleaned = strip_json_fences(text);
    debug!("Cleaned JSON response from completion service: {cleaned}");

    parse_analysis(cleaned)
}

/// Decodes cleaned completion text into the three-field analysis.
pub fn parse_analysis(cleaned: &str) -> Result<AnalysisResponse, AppError> {
    serde_json::from_str::<RawAnalysis>(cleaned)
        .map(AnalysisResponse::from)
        .map_err(|e| {
            warn!("Error decoding analysis JSON: {e}; text: {cleaned}");
            AppError::MalformedResponse(e.to_string())
        })
}

/// Strips a leading ```json or ``` fence (first match only) and a trailing ```
/// fence from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

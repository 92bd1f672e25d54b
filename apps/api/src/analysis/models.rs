use serde::{Deserialize, Serialize};

/// Body of `POST /chat`. Missing fields decode as empty text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRequest {
    pub resume: String,
    pub job_description: String,
}

/// Normalized analysis returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub match_score: i64,
    pub improvements: Vec<String>,
    pub next_steps: Vec<String>,
}

/// A list-valued field the model sometimes emits as a single string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexibleField {
    Single(String),
    Many(Vec<String>),
}

impl From<FlexibleField> for Vec<String> {
    fn from(field: FlexibleField) -> Self {
        match field {
            FlexibleField::Single(text) => vec![text],
            FlexibleField::Many(items) => items,
        }
    }
}

/// Analysis exactly as the model wrote it, before list normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAnalysis {
    pub match_score: i64,
    pub improvements: FlexibleField,
    pub next_steps: FlexibleField,
}

impl From<RawAnalysis> for AnalysisResponse {
    fn from(raw: RawAnalysis) -> Self {
        AnalysisResponse {
            match_score: raw.match_score,
            improvements: raw.improvements.into(),
            next_steps: raw.next_steps.into(),
        }
    }
}

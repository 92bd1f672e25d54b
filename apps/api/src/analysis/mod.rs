// Resume / job-description analysis: prompt building, completion
// normalization, and the /chat handler.

pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod prompts;

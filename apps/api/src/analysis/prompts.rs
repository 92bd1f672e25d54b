// Prompt text for resume / job-description analysis.
//
// Inputs are interpolated verbatim. Nothing delimits or escapes them, so a
// resume can carry instructions of its own; the model's JSON is still
// schema-checked by the normalizer.

/// Builds the analysis instruction for one resume / job-description pair.
pub fn build_prompt(resume: &str, job_description: &str) -> String {
    format!(
        r#"Analyze the following resume against the job description.
Your response MUST be a valid JSON object. Do not include any text or markdown formatting before or after the JSON object.
The JSON object must have the following keys and value types:
- "matchScore": an integer between 0 and 100 representing the match percentage.
- "improvements": a JSON array of strings, where each string is a bullet point (using **word** for bolding) on how to improve the resume.
- "nextSteps": a JSON array of strings, where each string is a bullet point (using **word** for bolding) on actionable next steps.

Here is the data:

**Resume:**
---
{resume}
---

**Job Description:**
---
{job_description}
---
"#
    )
}

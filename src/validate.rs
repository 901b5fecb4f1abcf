//! The single trust boundary between raw model output and the data model.
//!
//! Providers hand back whatever text the model produced. Everything that
//! inspects that text lives here: known markdown fencing is stripped, the
//! JSON is parsed, a missing evidence array is coerced to empty, and a deep
//! payload missing any required field fails the whole pass.

use crate::error::{GeolensError, Result};
use crate::model::{AnalysisResult, DeepContext};

/// Strip markdown code fencing the model sometimes wraps JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a quick-analysis payload into an [`AnalysisResult`].
///
/// Missing string fields become empty, a missing `visualEvidence` array
/// becomes `[]`, and any `deepContext` the model volunteers is dropped: only
/// a successful deep pass may attach one.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(GeolensError::Validation(
            "analysis response was empty".to_string(),
        ));
    }

    let mut result: AnalysisResult = serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse analysis payload");
        GeolensError::Validation(format!("analysis response was not valid JSON: {e}"))
    })?;

    result.deep_context = None;
    Ok(result)
}

/// Parse a deep-analysis payload into a [`DeepContext`].
///
/// All five fields are required; a partial payload is a validation failure,
/// not a partial success.
pub fn parse_deep(raw: &str) -> Result<DeepContext> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(GeolensError::Validation(
            "deep analysis response was empty".to_string(),
        ));
    }

    serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse deep analysis payload");
        GeolensError::Validation(format!("deep analysis response was incomplete: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_json_fencing() {
        let fenced = "```json\n{\"locationName\": \"Shibuya\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"locationName\": \"Shibuya\"}");

        let bare = "{\"locationName\": \"Shibuya\"}";
        assert_eq!(strip_code_fences(bare), bare);
    }

    #[test]
    fn test_parses_fenced_analysis() {
        let raw = "```json\n{\"locationName\":\"Tokyo Tower area\",\"confidenceScore\":82}\n```";
        let result = parse_analysis(raw).unwrap();
        assert_eq!(result.location_name, "Tokyo Tower area");
        assert_eq!(result.confidence_score, 82);
    }

    #[test]
    fn test_missing_evidence_coerces_to_empty() {
        let raw = r#"{"locationName": "Tokyo Tower area", "confidenceScore": 82}"#;
        let result = parse_analysis(raw).unwrap();
        assert!(result.visual_evidence.is_empty());
    }

    #[test]
    fn test_non_json_fails_validation() {
        let err = parse_analysis("I could not identify the location.").unwrap_err();
        assert!(matches!(err, GeolensError::Validation(_)));

        let err = parse_analysis("").unwrap_err();
        assert!(matches!(err, GeolensError::Validation(_)));
    }

    #[test]
    fn test_quick_payload_cannot_attach_deep_context() {
        let raw = r#"{
            "locationName": "Somewhere",
            "deepContext": {
                "architecture": "a", "infrastructure": "b", "vegetation": "c",
                "signage": "d", "forensicConclusion": "e"
            }
        }"#;
        let result = parse_analysis(raw).unwrap();
        assert!(result.deep_context.is_none());
    }

    #[test]
    fn test_deep_requires_all_five_fields() {
        let partial = r#"{"architecture": "a", "infrastructure": "b"}"#;
        let err = parse_deep(partial).unwrap_err();
        assert!(matches!(err, GeolensError::Validation(_)));

        let full = r#"```json
        {
            "architecture": "1960s reinforced concrete",
            "infrastructure": "overhead lines, older pavement",
            "vegetation": "camphor trees",
            "signage": "ward office notice board",
            "forensicConclusion": "estimate confirmed"
        }
        ```"#;
        let ctx = parse_deep(full).unwrap();
        assert_eq!(ctx.architecture, "1960s reinforced concrete");
    }
}

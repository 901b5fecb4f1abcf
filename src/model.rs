//! Data model for analysis results, corroboration, and history entries.
//!
//! All wire-facing structs use camelCase serde names so they line up with the
//! payloads the model produces and with the persisted history format. Shape
//! defense (fence stripping, coercion, required-field checks) lives in
//! [`crate::validate`]; these types only carry the data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::ImagePayload;

/// One piece of visual evidence the model cites for its estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualClue {
    /// The clue element, e.g. "utility pole plate text"
    pub element: String,

    /// Human label for where in the image the clue sits
    pub area: String,

    /// Percentage coordinates (0-100) into the source image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    /// What was read or observed
    pub observation: String,

    /// Why it matters for the location estimate
    pub significance: String,
}

impl Default for VisualClue {
    fn default() -> Self {
        Self {
            element: String::new(),
            area: String::new(),
            x: None,
            y: None,
            observation: String::new(),
            significance: String::new(),
        }
    }
}

impl VisualClue {
    /// A clue without both percentage coordinates is not spatially anchored
    /// and must not be rendered as a marker.
    pub fn is_anchored(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// Deep-pass-only forensic notes. All five fields are required: a deep
/// payload missing any of them fails validation rather than landing as a
/// partial success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepContext {
    pub architecture: String,
    pub infrastructure: String,
    pub vegetation: String,
    pub signage: String,
    pub forensic_conclusion: String,
}

/// The model's location estimate for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub location_name: String,
    pub region: String,
    pub address_guess: String,

    /// Presence of both coordinates gates whether a map is shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Semantically 0-100, but the producer does not enforce it
    pub confidence_score: i64,

    /// Insertion order is the model's reported order and is preserved
    pub visual_evidence: Vec<VisualClue>,

    pub environment_context: String,
    pub description: String,

    /// Attached only by a successful deep pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_context: Option<DeepContext>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            location_name: String::new(),
            region: String::new(),
            address_guess: String::new(),
            latitude: None,
            longitude: None,
            confidence_score: 0,
            visual_evidence: Vec::new(),
            environment_context: String::new(),
            description: String::new(),
            deep_context: None,
        }
    }
}

impl AnalysisResult {
    /// Confidence clamped into 0-100 for display; the raw value is untrusted.
    pub fn clamped_confidence(&self) -> u8 {
        self.confidence_score.clamp(0, 100) as u8
    }

    /// Both coordinates present, i.e. the estimate can be pinned on a map.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// One web source backing the corroboration narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// Fallback narrative used when the corroborating search cannot be reached.
pub const CORROBORATION_FALLBACK: &str =
    "Corroborating search results could not be retrieved.";

/// Best-effort web corroboration of a quick estimate. Source order is the
/// provider's order; duplicates are not removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Corroboration {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

impl Default for Corroboration {
    fn default() -> Self {
        Self {
            text: String::new(),
            sources: Vec::new(),
        }
    }
}

impl Corroboration {
    /// The degraded value applied when the search stage fails.
    pub fn fallback() -> Self {
        Self {
            text: CORROBORATION_FALLBACK.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Immutable snapshot of one completed pipeline run. Fields are copied out of
/// the live session at insert time, never aliased, so later session mutation
/// cannot reach back into history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub image: ImagePayload,
    pub result: AnalysisResult,
    pub corroboration: Corroboration,
}

impl HistoryEntry {
    pub fn new(image: ImagePayload, result: AnalysisResult, corroboration: Corroboration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            image,
            result,
            corroboration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clue_anchoring_requires_both_coordinates() {
        let mut clue = VisualClue::default();
        assert!(!clue.is_anchored());

        clue.x = Some(40.0);
        assert!(!clue.is_anchored());

        clue.y = Some(62.5);
        assert!(clue.is_anchored());
    }

    #[test]
    fn test_confidence_clamping() {
        let mut result = AnalysisResult::default();
        result.confidence_score = 150;
        assert_eq!(result.clamped_confidence(), 100);

        result.confidence_score = -3;
        assert_eq!(result.clamped_confidence(), 0);

        result.confidence_score = 82;
        assert_eq!(result.clamped_confidence(), 82);
    }

    #[test]
    fn test_coordinates_require_both_axes() {
        let mut result = AnalysisResult::default();
        assert!(!result.has_coordinates());

        result.latitude = Some(35.6586);
        assert!(!result.has_coordinates());

        result.longitude = Some(139.7454);
        assert!(result.has_coordinates());
    }

    #[test]
    fn test_analysis_result_camel_case_wire_names() {
        let result = AnalysisResult {
            location_name: "Tokyo Tower area".into(),
            confidence_score: 82,
            ..Default::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"locationName\":\"Tokyo Tower area\""));
        assert!(json.contains("\"confidenceScore\":82"));
        assert!(json.contains("\"visualEvidence\":[]"));
        // Absent optionals are skipped, not null
        assert!(!json.contains("latitude"));
        assert!(!json.contains("deepContext"));
    }

    #[test]
    fn test_deep_context_rejects_missing_fields() {
        let partial = r#"{"architecture":"a","infrastructure":"b","vegetation":"c"}"#;
        assert!(serde_json::from_str::<DeepContext>(partial).is_err());

        let full = r#"{
            "architecture": "a", "infrastructure": "b", "vegetation": "c",
            "signage": "d", "forensicConclusion": "e"
        }"#;
        let ctx: DeepContext = serde_json::from_str(full).unwrap();
        assert_eq!(ctx.forensic_conclusion, "e");
    }

    #[test]
    fn test_corroboration_fallback() {
        let fallback = Corroboration::fallback();
        assert_eq!(fallback.text, CORROBORATION_FALLBACK);
        assert!(fallback.sources.is_empty());
    }
}

//! Gemini REST client for the quick and deep analysis passes.
//!
//! Calls the `generateContent` endpoint directly over `reqwest` with the
//! image inlined as base64. Responses come back as raw text; shape
//! validation is the caller's job via [`crate::validate`].

use async_trait::async_trait;

use crate::analysis::provider::AnalysisProvider;
use crate::error::{GeolensError, Result};
use crate::image::ImagePayload;
use crate::settings::GeolensSettings;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Token budget for the deep pass's extended thinking.
const DEEP_THINKING_BUDGET: u32 = 8000;

const QUICK_ANALYSIS_PROMPT: &str = r#"You are a high-precision OSINT analyst specializing in geographic, infrastructure, and textual analysis of photographs.
Pinpoint where the provided image was taken and report your evidence as JSON.

Narrow the location down in this order:

1. Textual evidence (highest priority):
   - Utility pole plates (place names, pole numbers, carrier markings)
   - Intersection names on traffic signals and signs, romanized place names
   - Address stickers on vending machines, hydrant signs
   - Shop signage: area phone codes, addresses, chain names
   - Foundation stones, construction notices, posters
   If any legible text appears in the image, treat it as the strongest evidence.

2. Region-specific infrastructure:
   - Manhole cover crests and municipal emblems
   - Guardrail color and profile, curve mirror posts, delineator styles
   - Traffic signal manufacturer and lamp type

3. Natural features and built environment:
   - Ridge-line matching against background mountains
   - Vegetation (subtropical vs. cold-climate species)
   - Architectural style, roof materials, snow-country fittings

Output rules:
- When the evidence is thin, stop at the level you can defend (city or district), and score confidenceScore strictly.
- In "description", lay out the chain of evidence that led to the estimate.

Output JSON:
{
  "locationName": "proper name of the place, as specific as the evidence allows",
  "region": "prefecture / city / district",
  "addressGuess": "best-guess detailed address",
  "latitude": number,
  "longitude": number,
  "confidenceScore": 0-100,
  "visualEvidence": [
    {
      "element": "the specific clue, e.g. utility pole plate text",
      "area": "where it sits in the image",
      "x": 0-100,
      "y": 0-100,
      "observation": "what was read or seen",
      "significance": "what it proves about the location"
    }
  ],
  "environmentContext": "summary of the surroundings",
  "description": "full reasoning chain"
}"#;

fn deep_analysis_prompt(location_name: &str) -> String {
    format!(
        r#"You are a forensic-grade OSINT image analyst.
The location is currently estimated as "{location_name}".
Re-examine the fine detail of the image to test that hypothesis and sharpen the estimate.

Focus areas:
1. Architecture & age: weathering, window frames, building materials dating the area.
2. Micro-infrastructure: pavement condition, gutter covers, wiring layout, maintenance stickers on poles.
3. Bio-geography: plant species, sun position and shadow angles for rough time and bearing.
4. Textual mapping: recover faded text, distant signage, poster content to constrain the area.
5. Final conclusion: weigh all evidence, state whether the initial estimate holds, and give the most precise location you can defend.

Output format (JSON, all fields required):
{{
  "architecture": "...",
  "infrastructure": "...",
  "vegetation": "...",
  "signage": "...",
  "forensicConclusion": "..."
}}"#
    )
}

/// Gemini client carrying the credential and the per-pass model names.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    quick_model: String,
    deep_model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        quick_model: impl Into<String>,
        deep_model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            quick_model: quick_model.into(),
            deep_model: deep_model.into(),
        }
    }

    /// Build a client from settings. A missing key is a configuration error;
    /// there is no degraded mode for the analysis passes.
    pub fn from_settings(settings: &GeolensSettings) -> Result<Self> {
        let api_key = settings.gemini_api_key().ok_or_else(|| {
            GeolensError::Config(
                "Gemini API key not configured. Set GEMINI_API_KEY or api_keys.gemini in settings."
                    .to_string(),
            )
        })?;

        Ok(Self::new(
            api_key,
            settings.analysis.quick_model.clone(),
            settings.analysis.deep_model.clone(),
        ))
    }

    async fn generate(&self, model: &str, body: serde_json::Value) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GeolensError::Transport(format!("Failed to reach Gemini: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeolensError::Transport(format!(
                "Gemini API error ({status}): {body}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeolensError::Transport(format!("Failed to read Gemini response: {e}")))?;

        extract_text(&response_body)
    }
}

/// Pull the concatenated text parts out of a `generateContent` envelope.
fn extract_text(body: &serde_json::Value) -> Result<String> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| {
            GeolensError::Validation("Gemini response had no candidate content".to_string())
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(GeolensError::Validation(
            "Gemini response contained no text".to_string(),
        ));
    }

    Ok(text)
}

#[async_trait]
impl AnalysisProvider for GeminiClient {
    async fn quick_estimate(&self, image: &ImagePayload) -> Result<String> {
        tracing::debug!(model = %self.quick_model, "running quick analysis");

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": image.mime,
                            "data": image.base64_data(),
                        }
                    },
                    { "text": QUICK_ANALYSIS_PROMPT },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                // Deterministic decoding keeps hallucinated addresses down
                "temperature": 0,
            }
        });

        self.generate(&self.quick_model, body).await
    }

    async fn deep_context(&self, image: &ImagePayload, location_name: &str) -> Result<String> {
        tracing::debug!(model = %self.deep_model, "running deep analysis");

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": image.mime,
                            "data": image.base64_data(),
                        }
                    },
                    { "text": deep_analysis_prompt(location_name) },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "thinkingConfig": { "thinkingBudget": DEEP_THINKING_BUDGET },
            }
        });

        self.generate(&self.deep_model, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_from_envelope() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "{\"locationName\":" },
                        { "text": "\"Shibuya\"}" }
                    ]
                }
            }]
        });
        assert_eq!(extract_text(&body).unwrap(), "{\"locationName\":\"Shibuya\"}");
    }

    #[test]
    fn test_extract_text_rejects_empty_envelope() {
        let err = extract_text(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, GeolensError::Validation(_)));

        let no_text = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": {} }] } }]
        });
        let err = extract_text(&no_text).unwrap_err();
        assert!(matches!(err, GeolensError::Validation(_)));
    }

    #[test]
    fn test_deep_prompt_carries_location() {
        let prompt = deep_analysis_prompt("Tokyo Tower area");
        assert!(prompt.contains("\"Tokyo Tower area\""));
        assert!(prompt.contains("forensicConclusion"));
    }

    #[test]
    fn test_missing_key_is_a_config_error() {
        let settings = GeolensSettings::default();
        // No key in settings; make sure the env var does not leak in
        std::env::remove_var("GEMINI_API_KEY");
        let err = GeminiClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, GeolensError::Config(_)));
    }
}

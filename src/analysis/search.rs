//! Tavily-backed corroboration of quick estimates.
//!
//! Searches the web for the estimated location and returns a short
//! corroborating narrative plus the sources it came from. Configuration via
//! settings file with environment variable fallback.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::analysis::provider::CorroborationProvider;
use crate::error::{GeolensError, Result};
use crate::model::{Corroboration, GroundingSource};
use crate::settings::GeolensSettings;

const MAX_SOURCES: i32 = 5;

/// Manages the Tavily API key state and performs corroborating searches.
pub struct TavilyCorroborator {
    /// The API key (None if not configured)
    api_key: RwLock<Option<String>>,
}

impl TavilyCorroborator {
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.is_empty());

        if api_key.is_some() {
            tracing::info!("Tavily API key found, search corroboration available");
        } else {
            tracing::debug!("Tavily API key not configured, corroboration will degrade");
        }

        Self {
            api_key: RwLock::new(api_key),
        }
    }

    pub fn from_settings(settings: &GeolensSettings) -> Self {
        Self::new(settings.tavily_api_key())
    }

    /// Check if corroboration is available (API key is set)
    pub fn is_available(&self) -> bool {
        self.api_key.read().is_some()
    }

    fn get_api_key(&self) -> Result<String> {
        self.api_key
            .read()
            .clone()
            .ok_or_else(|| GeolensError::Config("Tavily API key not configured".to_string()))
    }
}

#[async_trait]
impl CorroborationProvider for TavilyCorroborator {
    async fn corroborate(
        &self,
        location_name: &str,
        address_guess: &str,
    ) -> Result<Corroboration> {
        let api_key = self.get_api_key()?;

        let request = tavily::SearchRequest {
            api_key,
            query: format!("{} {}", location_name, address_guess),
            search_depth: Some("basic".to_string()),
            include_answer: Some(true),
            include_images: Some(false),
            include_raw_content: Some(false),
            max_results: Some(MAX_SOURCES),
            include_domains: None,
            exclude_domains: None,
        };

        let response = tavily::search(request)
            .await
            .map_err(|e| GeolensError::Transport(format!("Corroborating search failed: {e}")))?;

        Ok(Corroboration {
            text: response.answer.unwrap_or_default(),
            sources: response
                .results
                .into_iter()
                .map(|r| GroundingSource {
                    title: r.title,
                    uri: r.url,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_counts_as_unconfigured() {
        assert!(!TavilyCorroborator::new(None).is_available());
        assert!(!TavilyCorroborator::new(Some(String::new())).is_available());
        assert!(TavilyCorroborator::new(Some("tvly-key".to_string())).is_available());
    }

    #[tokio::test]
    async fn test_unconfigured_key_is_a_config_error() {
        let corroborator = TavilyCorroborator::new(None);
        let err = corroborator
            .corroborate("Tokyo Tower area", "4-2-8 Shibakoen")
            .await
            .unwrap_err();
        assert!(matches!(err, GeolensError::Config(_)));
    }
}

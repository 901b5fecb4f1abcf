//! Settings schema definitions.
//!
//! All settings structs use `#[serde(default)]` to allow partial
//! configuration files. Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use super::loader::get_with_env_fallback;

/// Root settings structure.
///
/// Loaded from `~/.geolens/settings.toml` with environment variable
/// interpolation support. Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolensSettings {
    /// Schema version for migrations
    pub version: u32,

    /// API keys for external services
    pub api_keys: ApiKeysSettings,

    /// Analysis pass configuration
    pub analysis: AnalysisSettings,

    /// History storage configuration
    pub history: HistorySettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// API keys for external services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApiKeysSettings {
    /// Gemini API key for the analysis passes (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,

    /// Tavily API key for search corroboration (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tavily: Option<String>,
}

/// Model selection for the two analysis passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Model for the quick estimate pass
    pub quick_model: String,

    /// Model for the deep forensic pass
    pub deep_model: String,

    /// Whether to run search corroboration after the quick pass
    pub corroboration: bool,
}

/// History storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistorySettings {
    /// Directory for the history file (default: `~/.geolens`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

impl GeolensSettings {
    /// Gemini credential with `GEMINI_API_KEY` env fallback.
    pub fn gemini_api_key(&self) -> Option<String> {
        get_with_env_fallback(&self.api_keys.gemini, &["GEMINI_API_KEY"], None)
    }

    /// Tavily credential with `TAVILY_API_KEY` env fallback.
    pub fn tavily_api_key(&self) -> Option<String> {
        get_with_env_fallback(&self.api_keys.tavily, &["TAVILY_API_KEY"], None)
    }
}

impl Default for GeolensSettings {
    fn default() -> Self {
        Self {
            version: 1,
            api_keys: ApiKeysSettings::default(),
            analysis: AnalysisSettings::default(),
            history: HistorySettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            quick_model: "gemini-3-flash-preview".to_string(),
            deep_model: "gemini-3-pro-preview".to_string(),
            corroboration: true,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GeolensSettings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.analysis.quick_model, "gemini-3-flash-preview");
        assert_eq!(settings.analysis.deep_model, "gemini-3-pro-preview");
        assert!(settings.analysis.corroboration);
        assert!(settings.api_keys.gemini.is_none());
        assert!(settings.history.dir.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
            version = 1
            [analysis]
            quick_model = "gemini-3-flash"
        "#;

        let settings: GeolensSettings = toml::from_str(toml).unwrap();
        assert_eq!(settings.analysis.quick_model, "gemini-3-flash");
        // Defaults should fill in missing fields
        assert_eq!(settings.analysis.deep_model, "gemini-3-pro-preview");
        assert_eq!(settings.advanced.log_level, "info");
    }

    #[test]
    fn test_serialize_settings() {
        let settings = GeolensSettings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("[analysis]"));
    }
}

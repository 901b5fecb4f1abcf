//! Settings loading, saving, and environment variable interpolation.
//!
//! Handles:
//! - Loading settings from `~/.geolens/settings.toml`
//! - Resolving `$VAR` and `${VAR}` environment variable references
//! - Atomic file writes with temp file + rename
//! - First-run template generation

use std::path::{Path, PathBuf};

use crate::error::{GeolensError, Result};

use super::schema::GeolensSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geolens")
        .join("settings.toml")
}

/// Load settings from a specific path. A missing file yields defaults; an
/// unreadable or malformed file is a configuration error, not a silent
/// fallback.
pub fn load_from_path(path: &Path) -> Result<GeolensSettings> {
    if !path.exists() {
        tracing::debug!("Settings file not found at {:?}, using defaults", path);
        return Ok(GeolensSettings::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| GeolensError::Config(format!("Failed to read settings file: {e}")))?;

    let mut settings: GeolensSettings = toml::from_str(&contents)
        .map_err(|e| GeolensError::Config(format!("Failed to deserialize settings: {e}")))?;

    resolve_env_vars(&mut settings);

    tracing::info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Load from the default location.
pub fn load() -> Result<GeolensSettings> {
    load_from_path(&settings_path())
}

/// Serialize and write settings. Atomic write: temp file, then rename.
pub fn save_to_path(path: &Path, settings: &GeolensSettings) -> Result<()> {
    let toml_string = toml::to_string_pretty(settings)
        .map_err(|e| GeolensError::Config(format!("Failed to serialize settings: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &toml_string)?;
    std::fs::rename(&temp_path, path)?;

    tracing::info!("Saved settings to {:?}", path);
    Ok(())
}

/// Ensure the settings file exists, creating from the template if needed.
///
/// Returns `true` if a new file was created.
pub fn ensure_settings_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, TEMPLATE)?;
    tracing::info!("Generated settings template at {:?}", path);
    Ok(true)
}

/// Resolve $ENV_VAR references in string fields.
fn resolve_env_vars(settings: &mut GeolensSettings) {
    fn resolve_opt(value: &mut Option<String>) {
        if let Some(v) = value {
            if let Some(resolved) = resolve_env_ref(v) {
                *v = resolved;
            }
        }
    }

    resolve_opt(&mut settings.api_keys.gemini);
    resolve_opt(&mut settings.api_keys.tavily);
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var
/// exists. Returns `None` if no env var reference or env var not set.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.starts_with('$') {
        let var_name = if trimmed.starts_with("${") && trimmed.ends_with('}') {
            &trimmed[2..trimmed.len() - 1]
        } else {
            &trimmed[1..]
        };

        return std::env::var(var_name).ok();
    }

    None
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    for env_var in env_vars {
        if let Ok(v) = std::env::var(env_var) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }

    default
}

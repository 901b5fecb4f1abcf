//! Centralized TOML-based settings.
//!
//! Settings are loaded from `~/.geolens/settings.toml` with environment
//! variable interpolation support. Environment variables remain a first-class
//! configuration path through the `get_with_env_fallback` helper, so a bare
//! `GEMINI_API_KEY=... geolens-cli photo.jpg` works without a settings file.

pub mod loader;
pub mod schema;

pub use loader::{ensure_settings_file, get_with_env_fallback, load, load_from_path, settings_path};
pub use schema::GeolensSettings;

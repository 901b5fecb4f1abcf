use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeolensError {
    /// Missing or invalid credential/configuration. Surfaced verbatim; not
    /// retryable without reconfiguration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or provider call failure. The user may retry the same stage.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider returned a payload whose shape could not be validated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisted history could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stage invocation arrived while another stage was already running.
    #[error("{0} is already running")]
    Busy(&'static str),

    /// A stage was started without an image in the session.
    #[error("No image has been submitted")]
    MissingImage,

    /// Deep analysis was started without a quick result to augment.
    #[error("No quick analysis result to augment")]
    MissingResult,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeolensError {
    /// Whether the user can retry the failed stage as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Validation(_))
    }
}

// Serialize as the display string for the presentation boundary
impl Serialize for GeolensError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeolensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GeolensError::Transport("timeout".into()).is_retryable());
        assert!(GeolensError::Validation("bad shape".into()).is_retryable());
        assert!(!GeolensError::Config("no key".into()).is_retryable());
        assert!(!GeolensError::Busy("quick analysis").is_retryable());
    }

    #[test]
    fn test_serializes_as_display_string() {
        let err = GeolensError::Config("GEMINI_API_KEY not set".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Configuration error: GEMINI_API_KEY not set\"");
    }
}

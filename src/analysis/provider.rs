//! Trait seams for the external inference and search calls.
//!
//! The coordinator treats both passes as opaque async calls returning raw
//! model text; only [`crate::validate`] inspects that text. Trait objects
//! keep the pipeline testable with scripted providers.

use async_trait::async_trait;

use crate::error::Result;
use crate::image::ImagePayload;
use crate::model::Corroboration;

/// The two escalating inference passes.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// First-pass estimate from the image alone. Returns the raw model text.
    async fn quick_estimate(&self, image: &ImagePayload) -> Result<String>;

    /// Higher-effort re-examination seeded with the current estimate's
    /// location name. Returns the raw model text.
    async fn deep_context(&self, image: &ImagePayload, location_name: &str) -> Result<String>;
}

/// Best-effort web corroboration of a quick estimate.
///
/// Implementations may fail; the coordinator catches the error and degrades
/// to [`Corroboration::fallback`], so a failure here never becomes a session
/// error.
#[async_trait]
pub trait CorroborationProvider: Send + Sync {
    async fn corroborate(&self, location_name: &str, address_guess: &str)
        -> Result<Corroboration>;
}

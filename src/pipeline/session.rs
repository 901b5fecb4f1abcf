//! Session state for one unit of analysis work.
//!
//! The stage is a single sum type rather than independent boolean flags, so
//! "quick and deep both running" is unrepresentable. The presentation layer
//! never reads the stage directly; it gets a [`SessionView`] with derived
//! flags.

use serde::{Deserialize, Serialize};

use crate::image::ImagePayload;
use crate::model::{AnalysisResult, Corroboration};

/// Where the session is in the pipeline. At most one stage is ever running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    QuickRunning,
    QuickDone,
    DeepRunning,
    Failed,
}

impl Stage {
    pub fn is_running(&self) -> bool {
        matches!(self, Stage::QuickRunning | Stage::DeepRunning)
    }

    /// User-facing name of the running stage, for single-flight rejections.
    pub(crate) fn running_label(&self) -> &'static str {
        match self {
            Stage::QuickRunning => "quick analysis",
            Stage::DeepRunning => "deep analysis",
            _ => "analysis",
        }
    }
}

/// The live unit of work. Created on image submission, discarded on reset or
/// on the next submission.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Owned exclusively by the session; replaced wholesale on new upload
    pub image: Option<ImagePayload>,

    pub stage: Stage,

    /// Absent until the quick pass settles successfully
    pub result: Option<AnalysisResult>,

    /// Attached after the search stage, independent of `result` presence
    pub corroboration: Option<Corroboration>,

    /// Last failure message; cleared on any new attempt
    pub error: Option<String>,

    /// Bumped on submit/reset/load. A completion whose captured generation
    /// no longer matches is stale and must be discarded.
    pub generation: u64,
}

impl Session {
    pub fn view(&self) -> SessionView {
        SessionView {
            stage: self.stage,
            quick_running: self.stage == Stage::QuickRunning,
            deep_running: self.stage == Stage::DeepRunning,
            has_error: self.error.is_some(),
            error: self.error.clone(),
            image: self.image.clone(),
            result: self.result.clone(),
            corroboration: self.corroboration.clone(),
        }
    }
}

/// Snapshot handed to the presentation layer: busy/error flags plus the data
/// to render, without exposing the state machine itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub stage: Stage,
    pub quick_running: bool,
    pub deep_running: bool,
    pub has_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corroboration: Option<Corroboration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stages() {
        assert!(Stage::QuickRunning.is_running());
        assert!(Stage::DeepRunning.is_running());
        assert!(!Stage::Idle.is_running());
        assert!(!Stage::QuickDone.is_running());
        assert!(!Stage::Failed.is_running());
    }

    #[test]
    fn test_view_derives_flags_from_stage() {
        let mut session = Session::default();
        let view = session.view();
        assert!(!view.quick_running && !view.deep_running && !view.has_error);

        session.stage = Stage::QuickRunning;
        assert!(session.view().quick_running);
        assert!(!session.view().deep_running);

        session.stage = Stage::DeepRunning;
        session.error = Some("boom".into());
        let view = session.view();
        assert!(view.deep_running && !view.quick_running && view.has_error);
    }
}

//! The pipeline coordinator: sequences image submission, quick analysis,
//! search corroboration, and deep analysis over a single mutable session.
//!
//! Concurrency model: the session sits behind a `parking_lot` mutex that is
//! never held across an await. Each submission bumps a generation counter;
//! every external call captures the generation it was started for and
//! re-checks it before applying its outcome, so a slow response for an
//! abandoned image can never overwrite the active session. There is no
//! cancellation of in-flight calls; a genuinely hung call leaves its stage
//! busy (known limitation).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::analysis::{AnalysisProvider, CorroborationProvider};
use crate::error::{GeolensError, Result};
use crate::history::HistoryCache;
use crate::image::ImagePayload;
use crate::model::{Corroboration, HistoryEntry};
use crate::pipeline::progress::{ProgressSimulator, StageKind};
use crate::pipeline::session::{Session, SessionView, Stage};
use crate::validate;

pub struct PipelineCoordinator {
    analysis: Arc<dyn AnalysisProvider>,
    corroboration: Arc<dyn CorroborationProvider>,
    history: Arc<HistoryCache>,
    session: Mutex<Session>,
    progress: ProgressSimulator,
}

impl PipelineCoordinator {
    pub fn new(
        analysis: Arc<dyn AnalysisProvider>,
        corroboration: Arc<dyn CorroborationProvider>,
        history: Arc<HistoryCache>,
    ) -> Self {
        Self {
            analysis,
            corroboration,
            history,
            session: Mutex::new(Session::default()),
            progress: ProgressSimulator::new(),
        }
    }

    /// The history cache this coordinator writes to. Read-only for callers.
    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    /// Cosmetic progress feed for the presentation layer.
    pub fn progress(&self) -> &ProgressSimulator {
        &self.progress
    }

    /// Snapshot of the session for rendering.
    pub fn view(&self) -> SessionView {
        self.session.lock().view()
    }

    /// Replace the session's image. Clears the prior result, corroboration,
    /// and error; does not start analysis. Submitting while a stage runs is
    /// allowed: the in-flight call keeps running but its completion will see
    /// a newer generation and be discarded.
    pub fn submit_image(&self, image: ImagePayload) {
        {
            let mut session = self.session.lock();
            if session.stage.is_running() {
                tracing::debug!("image replaced mid-stage, in-flight result will be discarded");
            }
            session.generation += 1;
            session.image = Some(image);
            session.stage = Stage::Idle;
            session.result = None;
            session.corroboration = None;
            session.error = None;
        }
        self.progress.stop();
    }

    /// Discard the session entirely and return to idle.
    pub fn reset(&self) {
        {
            let mut session = self.session.lock();
            let generation = session.generation + 1;
            *session = Session {
                generation,
                ..Session::default()
            };
        }
        self.progress.stop();
    }

    /// Restore a past entry as the live session. Returns false for an
    /// unknown id.
    pub fn load_history_entry(&self, id: &str) -> bool {
        let Some(entry) = self.history.get(id) else {
            return false;
        };
        {
            let mut session = self.session.lock();
            session.generation += 1;
            session.image = Some(entry.image);
            session.stage = Stage::QuickDone;
            session.result = Some(entry.result);
            session.corroboration = Some(entry.corroboration);
            session.error = None;
        }
        self.progress.stop();
        true
    }

    /// Run the quick pass, then the best-effort corroboration, then insert a
    /// history entry for the completed run.
    pub async fn start_quick_analysis(&self) -> Result<SessionView> {
        let (image, generation) = {
            let mut session = self.session.lock();
            if session.stage.is_running() {
                return Err(GeolensError::Busy(session.stage.running_label()));
            }
            let image = session.image.clone().ok_or(GeolensError::MissingImage)?;
            session.stage = Stage::QuickRunning;
            session.result = None;
            session.corroboration = None;
            session.error = None;
            (image, session.generation)
        };
        self.progress.start(StageKind::Quick);

        let outcome = self
            .analysis
            .quick_estimate(&image)
            .await
            .and_then(|raw| validate::parse_analysis(&raw));

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                let mut session = self.session.lock();
                if session.generation == generation {
                    session.stage = Stage::Failed;
                    session.error = Some(quick_failure_message(&e));
                    drop(session);
                    self.progress.stop();
                } else {
                    tracing::debug!("discarding stale quick analysis failure");
                }
                return Err(e);
            }
        };

        {
            let mut session = self.session.lock();
            if session.generation != generation {
                tracing::debug!("discarding stale quick analysis result");
                return Ok(session.view());
            }
            session.stage = Stage::QuickDone;
            session.result = Some(result.clone());
        }
        self.progress.complete();

        // Best-effort: a failure here degrades to the fallback text and is
        // never a session error.
        let corroboration = match self
            .corroboration
            .corroborate(&result.location_name, &result.address_guess)
            .await
        {
            Ok(corroboration) => corroboration,
            Err(e) => {
                tracing::warn!(error = %e, "corroboration unavailable, using fallback");
                Corroboration::fallback()
            }
        };

        let mut session = self.session.lock();
        if session.generation != generation {
            tracing::debug!("discarding stale corroboration");
            return Ok(session.view());
        }
        session.corroboration = Some(corroboration.clone());
        let view = session.view();
        drop(session);

        self.history
            .insert(HistoryEntry::new(image, result, corroboration));

        Ok(view)
    }

    /// Run the deep pass against the existing quick result, merging the
    /// forensic context into the session and the matching history entry.
    pub async fn start_deep_analysis(&self) -> Result<SessionView> {
        let (image, location_name, generation) = {
            let mut session = self.session.lock();
            if session.stage.is_running() {
                return Err(GeolensError::Busy(session.stage.running_label()));
            }
            let image = session.image.clone().ok_or(GeolensError::MissingImage)?;
            let result = session.result.as_ref().ok_or(GeolensError::MissingResult)?;
            let location_name = result.location_name.clone();
            session.stage = Stage::DeepRunning;
            session.error = None;
            (image, location_name, session.generation)
        };
        self.progress.start(StageKind::Deep);

        let outcome = self
            .analysis
            .deep_context(&image, &location_name)
            .await
            .and_then(|raw| validate::parse_deep(&raw));

        let deep = match outcome {
            Ok(deep) => deep,
            Err(e) => {
                let mut session = self.session.lock();
                if session.generation == generation {
                    // The quick result is preserved untouched; deep may be
                    // retried because the guard is result-present + idle.
                    session.stage = Stage::Failed;
                    session.error = Some(deep_failure_message(&e));
                    drop(session);
                    self.progress.stop();
                } else {
                    tracing::debug!("discarding stale deep analysis failure");
                }
                return Err(e);
            }
        };

        let view = {
            let mut session = self.session.lock();
            if session.generation != generation {
                tracing::debug!("discarding stale deep analysis result");
                return Ok(session.view());
            }
            session.stage = Stage::QuickDone;
            if let Some(result) = session.result.as_mut() {
                result.deep_context = Some(deep.clone());
            }
            session.view()
        };
        self.progress.complete();

        // Mutates the matching entry in place; no new entry is created, and
        // a session never persisted to history updates the session only.
        self.history
            .update_by_fingerprint(&image.fingerprint, |entry| {
                entry.result.deep_context = Some(deep);
            });

        Ok(view)
    }
}

/// Stage-specific user-facing failure text. Configuration problems are
/// surfaced verbatim; everything else gets the stage's message.
fn quick_failure_message(err: &GeolensError) -> String {
    match err {
        GeolensError::Config(_) => err.to_string(),
        GeolensError::Validation(_) => {
            "The analysis engine returned an unreadable response. Please try again.".to_string()
        }
        _ => "Communication with the analysis engine failed. Reduce the image size and try again."
            .to_string(),
    }
}

fn deep_failure_message(err: &GeolensError) -> String {
    match err {
        GeolensError::Config(_) => err.to_string(),
        GeolensError::Validation(_) => {
            "The forensic pass returned an incomplete report. Please try again.".to_string()
        }
        _ => "Detailed forensic analysis failed. The provider may be rate limited.".to_string(),
    }
}

//! Cosmetic progress feedback for running stages.
//!
//! A purely observational ticking task: it cycles through stage-specific
//! status phrases and advances a simulated percentage toward an asymptotic
//! cap. It never reaches 100 on its own; the coordinator sets 100 on actual
//! stage success and 0 whenever no stage is running. The task is cancelled
//! through a token on every exit path, and every snapshot write happens
//! under the `active` lock: a tick that lost the race to a cancel sees its
//! token cancelled before it can write, so the final 100/0 snapshot is
//! never clobbered by a stale tick.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Which phrase list a running stage uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Quick,
    Deep,
}

const QUICK_STATUS_PHRASES: [&str; 5] = [
    "Intelligence core starting...",
    "Extracting visual features...",
    "Cross-referencing infrastructure records...",
    "Running open-source intelligence checks...",
    "Computing candidate location...",
];

const DEEP_STATUS_PHRASES: [&str; 5] = [
    "Forensic engine starting...",
    "Verifying architectural details...",
    "Cross-referencing vegetation profile...",
    "Deep-scanning infrastructure...",
    "Finalizing coordinates...",
];

const TICK_INTERVAL: Duration = Duration::from_millis(900);
const START_PERCENT: u8 = 5;
const TICK_STEP: u8 = 4;
const SIMULATED_CAP: u8 = 98;

/// One observable progress state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub percent: u8,
    pub message: String,
}

pub struct ProgressSimulator {
    tx: watch::Sender<ProgressSnapshot>,
    interval: Duration,
    /// Serializes every snapshot write: the ticker re-checks its token under
    /// this lock before writing, and stop/complete cancel and write the
    /// final snapshot under it.
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl ProgressSimulator {
    pub fn new() -> Self {
        Self::with_interval(TICK_INTERVAL)
    }

    /// Interval override for tests.
    pub fn with_interval(interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self {
            tx,
            interval,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Observe progress snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Begin ticking for a stage, replacing any previous ticker.
    pub fn start(&self, kind: StageKind) {
        let phrases: &'static [&'static str] = match kind {
            StageKind::Quick => &QUICK_STATUS_PHRASES,
            StageKind::Deep => &DEEP_STATUS_PHRASES,
        };

        let token = CancellationToken::new();
        {
            let mut active = self.active.lock();
            if let Some(previous) = active.replace(token.clone()) {
                previous.cancel();
            }
            let _ = self.tx.send(ProgressSnapshot {
                percent: START_PERCENT,
                message: phrases[0].to_string(),
            });
        }

        let tx = self.tx.clone();
        let active = Arc::clone(&self.active);
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Consume the immediate first tick
            ticker.tick().await;
            let mut phrase_index = 0usize;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // A tick that raced a cancel must not write over the
                        // final snapshot; the token is re-checked under the
                        // same lock stop/complete write under.
                        let _guard = active.lock();
                        if token.is_cancelled() {
                            break;
                        }
                        phrase_index = (phrase_index + 1) % phrases.len();
                        tx.send_modify(|snapshot| {
                            snapshot.percent = (snapshot.percent + TICK_STEP).min(SIMULATED_CAP);
                            snapshot.message = phrases[phrase_index].to_string();
                        });
                    }
                }
            }
        });
    }

    /// Stop ticking and reset to zero. Called whenever no stage is running,
    /// including failure paths.
    pub fn stop(&self) {
        let mut active = self.active.lock();
        if let Some(token) = active.take() {
            token.cancel();
        }
        let _ = self.tx.send(ProgressSnapshot::default());
    }

    /// Stop ticking and mark the real completion the simulator never reaches
    /// on its own.
    pub fn complete(&self) {
        let mut active = self.active.lock();
        if let Some(token) = active.take() {
            token.cancel();
        }
        self.tx.send_modify(|snapshot| snapshot.percent = 100);
    }
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        if let Some(token) = self.active.lock().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_advances_toward_cap_but_never_completes() {
        let progress = ProgressSimulator::with_interval(Duration::from_millis(10));
        let rx = progress.subscribe();

        progress.start(StageKind::Quick);
        assert_eq!(rx.borrow().percent, START_PERCENT);
        assert_eq!(rx.borrow().message, QUICK_STATUS_PHRASES[0]);

        tokio::time::sleep(Duration::from_millis(35)).await;
        let mid = rx.borrow().percent;
        assert!(mid > START_PERCENT && mid < SIMULATED_CAP, "mid={mid}");

        // Run far past the point where the cap is hit
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(rx.borrow().percent, SIMULATED_CAP);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phrases_cycle_per_stage_kind() {
        let progress = ProgressSimulator::with_interval(Duration::from_millis(10));
        let rx = progress.subscribe();

        progress.start(StageKind::Deep);
        assert_eq!(rx.borrow().message, DEEP_STATUS_PHRASES[0]);

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(rx.borrow().message, DEEP_STATUS_PHRASES[1]);

        // Cycles back around after the full list
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(rx.borrow().message, DEEP_STATUS_PHRASES[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_to_zero_immediately() {
        let progress = ProgressSimulator::with_interval(Duration::from_millis(10));
        let rx = progress.subscribe();

        progress.start(StageKind::Quick);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.borrow().percent > 0);

        progress.stop();
        assert_eq!(*rx.borrow(), ProgressSnapshot::default());

        // A cancelled ticker must not keep mutating the snapshot
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rx.borrow().percent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_is_set_only_by_the_coordinator_path() {
        let progress = ProgressSimulator::with_interval(Duration::from_millis(10));
        let rx = progress.subscribe();

        progress.start(StageKind::Quick);
        tokio::time::sleep(Duration::from_millis(30)).await;
        progress.complete();
        assert_eq!(rx.borrow().percent, 100);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rx.borrow().percent, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_ticker() {
        let progress = ProgressSimulator::with_interval(Duration::from_millis(10));
        let rx = progress.subscribe();

        progress.start(StageKind::Quick);
        tokio::time::sleep(Duration::from_millis(30)).await;

        progress.start(StageKind::Deep);
        assert_eq!(rx.borrow().percent, START_PERCENT);
        assert_eq!(rx.borrow().message, DEEP_STATUS_PHRASES[0]);

        tokio::time::sleep(Duration::from_millis(15)).await;
        // Only the deep ticker advances now: one tick past the start
        assert_eq!(rx.borrow().percent, START_PERCENT + TICK_STEP);
    }
}

//! The analysis orchestration pipeline: session state machine, coordinator,
//! and the cosmetic progress simulator.

mod coordinator;
mod progress;
mod session;

pub use coordinator::PipelineCoordinator;
pub use progress::{ProgressSimulator, ProgressSnapshot, StageKind};
pub use session::{Session, SessionView, Stage};

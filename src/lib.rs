//! Geolens: photo geolocation analysis core.
//!
//! A two-pass pipeline over a single live session: a quick location
//! estimate from a vision model, best-effort web corroboration of that
//! estimate, and an optional deep forensic pass that augments the result in
//! place. Completed runs land in a bounded, persisted history.
//!
//! The [`pipeline::PipelineCoordinator`] is the public entry point; the
//! provider traits in [`analysis`] are the seams for swapping the model or
//! search backends.

pub mod analysis;
pub mod cli;
pub mod error;
pub mod history;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod settings;
pub mod validate;

pub use error::{GeolensError, Result};

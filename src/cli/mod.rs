//! Headless command-line surface.
//!
//! The CLI drives the same coordinator as any embedding would: it submits
//! the image file as a payload, runs the quick pass (and optionally the
//! deep pass), streams cosmetic progress to stderr, and prints the final
//! session view.

mod args;
mod runner;

pub use args::Args;
pub use runner::run;

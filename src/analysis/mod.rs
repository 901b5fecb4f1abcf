//! External analysis collaborators: the Gemini estimation passes and the
//! web-search corroboration step, behind trait seams the coordinator calls.

mod gemini;
mod provider;
mod search;

pub use gemini::GeminiClient;
pub use provider::{AnalysisProvider, CorroborationProvider};
pub use search::TavilyCorroborator;

mod engine;
mod timer;

// Public API of the assessment subsystem.
pub use engine::{AssessmentEngine, AssessmentSettings, EngineEvent};

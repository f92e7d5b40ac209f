mod engine;
pub mod rate_governor;

pub use engine::{ExportEngine, ExportOutcome};

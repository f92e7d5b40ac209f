mod lm_categorizer;
mod script_runner;
mod usefulness_scorer;

pub use lm_categorizer::LmCategorizer;
pub use script_runner::ScriptRunner;
pub use usefulness_scorer::{ScoringMethod, UsefulnessScorer};

mod engine;

pub use engine::AnalysisEngine;

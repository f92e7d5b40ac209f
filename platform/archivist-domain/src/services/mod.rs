pub mod analyzers;
pub mod categorize;
pub mod rate_governor;
pub mod scoring;

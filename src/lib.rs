//! Scores a web page for visibility in AI-generated answers (GEO) and for
//! classic content quality, and produces suggestions that can be applied
//! back onto the page's markup.

pub mod apply;
pub mod audit;
pub mod config;
pub mod filter;
pub mod metadata;
pub mod parsers;
pub mod results;
pub mod scoring;
pub mod suggestions;
pub mod utils;

// Re-export commonly used types for convenience
pub use apply::{ApplicationReport, apply_suggestions, apply_suggestions_with};
pub use audit::{AnalysisOptions, Audit, analyze};
pub use config::EngineConfig;
pub use results::{PageData, ScoreReport};
pub use suggestions::{GenerationError, Suggestion, TextGenerator};

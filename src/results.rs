use crate::metadata::Metadata;
use crate::scoring::ScoreBreakdown;
use crate::suggestions::Suggestion;
use serde::{Deserialize, Serialize};

/// A fetched page as handed over by the crawler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageData {
    /// URL of the page
    pub url: String,

    /// Markup exactly as fetched
    pub raw_markup: String,

    /// Visible text, if the crawler already extracted it (may be empty)
    #[serde(default)]
    pub plain_text: String,
}

impl PageData {
    /// Create a new page data instance
    pub fn new(url: impl Into<String>, raw_markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_markup: raw_markup.into(),
            plain_text: String::new(),
        }
    }

    /// Attach crawler-extracted visible text
    pub fn with_plain_text(mut self, plain_text: impl Into<String>) -> Self {
        self.plain_text = plain_text.into();
        self
    }
}

/// Everything the engine has to say about a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub geo_score_total: f64,
    pub geo_breakdown: ScoreBreakdown,
    pub content_quality_score_total: f64,
    pub content_quality_breakdown: ScoreBreakdown,
    pub metadata: Metadata,
    pub suggestions: Vec<Suggestion>,
}

use crate::apply::{self, ApplicationReport};
use crate::config::EngineConfig;
use crate::metadata::{self, Metadata};
use crate::parsers::{self, PageFeatures};
use crate::results::{PageData, ScoreReport};
use crate::scoring::{self, QualityInputs};
use crate::suggestions::{self, Suggestion, TextGenerator};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Inputs of one analysis besides the page itself
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub config: EngineConfig,
    /// Competitor text used to measure originality
    pub competitor_snippets: Vec<String>,
    /// Whether the tone suits the intended audience, if someone judged it
    pub audience_match: Option<bool>,
    /// Stands in for "today" in freshness scoring and missing dates
    pub now: DateTime<Utc>,
}

impl AnalysisOptions {
    /// Defaults evaluated at a fixed reference time
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            config: EngineConfig::default(),
            competitor_snippets: Vec::new(),
            audience_match: None,
            now,
        }
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

/// Scores a page and lists heuristic suggestions
///
/// Same page and options give the same report.
pub fn analyze(page: &PageData, options: &AnalysisOptions) -> ScoreReport {
    let features = parsers::extract(page);
    let metadata = metadata::derive(&features, &options.config, options.now);
    let suggestions = suggestions::generate(&features, &metadata, &options.config);
    build_report(&features, metadata, suggestions, options)
}

/// Like [`analyze`], with prose rewrites from `generator` where it delivers
pub async fn analyze_with_generation(
    page: &PageData,
    options: &AnalysisOptions,
    generator: &dyn TextGenerator,
) -> ScoreReport {
    let features = parsers::extract(page);
    let metadata = metadata::derive(&features, &options.config, options.now);
    let suggestions =
        suggestions::generate_with(&features, &metadata, &options.config, generator).await;
    build_report(&features, metadata, suggestions, options)
}

fn build_report(
    features: &PageFeatures,
    metadata: Metadata,
    suggestions: Vec<Suggestion>,
    options: &AnalysisOptions,
) -> ScoreReport {
    let geo = scoring::score_geo(features, &metadata, &options.config, options.now);
    let quality = scoring::score_quality(
        features,
        &metadata,
        &options.config,
        QualityInputs {
            competitor_snippets: &options.competitor_snippets,
            audience_match: options.audience_match,
        },
    );

    ::log::info!(
        "Audited {}: GEO {} / quality {} with {} suggestions",
        features.url,
        geo.total_score,
        quality.total_score,
        suggestions.len()
    );

    ScoreReport {
        geo_score_total: geo.total_score,
        geo_breakdown: geo,
        content_quality_score_total: quality.total_score,
        content_quality_breakdown: quality,
        metadata,
        suggestions,
    }
}

/// Builder for auditing a single page
pub struct Audit {
    page: PageData,
    options: AnalysisOptions,
    text_generator: Option<Arc<dyn TextGenerator>>,
}

impl Audit {
    /// Create a new Audit for the page with default configuration
    pub fn new(page: PageData) -> Self {
        Self {
            page,
            options: AnalysisOptions::default(),
            text_generator: None,
        }
    }

    /// Apply a configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.options.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file<P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = EngineConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Apply configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = EngineConfig::from_json(json)?;
        Ok(self.with_config(config))
    }

    pub fn with_competitor_snippets(mut self, snippets: Vec<String>) -> Self {
        self.options.competitor_snippets = snippets;
        self
    }

    pub fn with_audience_match(mut self, matches: bool) -> Self {
        self.options.audience_match = Some(matches);
        self
    }

    /// Use a text generator for paragraph and sentence rewrites
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    /// Pin the reference time instead of the current clock
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.options.now = now;
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Score the page with heuristic suggestions only
    pub fn run(&self) -> ScoreReport {
        analyze(&self.page, &self.options)
    }

    /// Score the page, asking the text generator for rewrites if one is set
    pub async fn run_with_generation(&self) -> ScoreReport {
        match &self.text_generator {
            Some(generator) => {
                analyze_with_generation(&self.page, &self.options, generator.as_ref()).await
            }
            None => self.run(),
        }
    }

    /// Apply a report's suggestions to this page's markup
    pub fn apply(&self, report: &ScoreReport) -> ApplicationReport {
        apply::apply_suggestions_with(
            &self.page.raw_markup,
            &report.suggestions,
            &self.options.config.matching,
        )
    }
}

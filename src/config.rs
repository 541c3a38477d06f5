use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Fallback fractions of a category ceiling used where nothing can be measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeutralDefaults {
    /// Originality when no competitor text is supplied
    #[serde(default = "default_originality")]
    pub originality: f64,

    /// Source use when the page makes no numeric claims
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,

    /// Recency when neither a publish nor a modified date is present
    #[serde(default = "default_freshness")]
    pub freshness: f64,
}

/// Keyword extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Maximum number of keywords kept
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Domain terms that boost a phrase; the built-in table when absent
    #[serde(default)]
    pub domain_terms: Option<Vec<String>>,
}

/// Thresholds for the suggestion matching cascade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum find length for the partial prefix step
    #[serde(default = "default_prefix_min_len")]
    pub prefix_min_len: usize,

    /// Share of the find text used as the prefix
    #[serde(default = "default_prefix_ratio")]
    pub prefix_ratio: f64,

    /// Similarity needed for body text suggestions
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Similarity needed for short heading and title suggestions
    #[serde(default = "default_short_similarity_threshold")]
    pub short_similarity_threshold: f64,
}

/// Limits applied to the optional text generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seconds to wait for one generation before falling back
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,

    /// Longest accepted improved text, in characters
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

/// Configuration for the scoring and suggestion engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub neutral: NeutralDefaults,

    #[serde(default)]
    pub keywords: KeywordConfig,

    #[serde(default)]
    pub matching: MatchConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    /// Reading speed used for the reading time estimate
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make scores or matching meaningless
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        let fractions = [
            ("neutral.originality", self.neutral.originality),
            ("neutral.accuracy", self.neutral.accuracy),
            ("neutral.freshness", self.neutral.freshness),
            ("matching.prefix_ratio", self.matching.prefix_ratio),
            ("matching.similarity_threshold", self.matching.similarity_threshold),
            (
                "matching.short_similarity_threshold",
                self.matching.short_similarity_threshold,
            ),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0 and 1, got {}", name, value).into());
            }
        }
        if self.words_per_minute == 0 {
            return Err("words_per_minute must be positive".into());
        }
        Ok(())
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NeutralDefaults {
    fn default() -> Self {
        Self {
            originality: default_originality(),
            accuracy: default_accuracy(),
            freshness: default_freshness(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            domain_terms: None,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            prefix_min_len: default_prefix_min_len(),
            prefix_ratio: default_prefix_ratio(),
            similarity_threshold: default_similarity_threshold(),
            short_similarity_threshold: default_short_similarity_threshold(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_generation_timeout_secs(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neutral: NeutralDefaults::default(),
            keywords: KeywordConfig::default(),
            matching: MatchConfig::default(),
            generation: GenerationConfig::default(),
            words_per_minute: default_words_per_minute(),
        }
    }
}

fn default_originality() -> f64 {
    0.6
}

fn default_accuracy() -> f64 {
    0.5
}

fn default_freshness() -> f64 {
    0.5
}

fn default_max_keywords() -> usize {
    15
}

fn default_prefix_min_len() -> usize {
    50
}

fn default_prefix_ratio() -> f64 {
    0.7
}

fn default_similarity_threshold() -> f64 {
    0.85
}

fn default_short_similarity_threshold() -> f64 {
    0.9
}

fn default_generation_timeout_secs() -> u64 {
    20
}

fn default_max_output_chars() -> usize {
    2000
}

fn default_words_per_minute() -> usize {
    200
}

//! Prioritized, machine-applicable improvement suggestions.

pub mod detectors;
pub mod generation;

use crate::config::EngineConfig;
use crate::metadata::Metadata;
use crate::parsers::PageFeatures;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use generation::{GenerationError, RewritePair, TextGenerator};

/// What part of the page a suggestion touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Heading,
    Title,
    Description,
    StructuredData,
    Canonical,
    Viewport,
    SocialTags,
    Paragraph,
    Lists,
    Subheadings,
    Clarity,
    Keywords,
}

impl SuggestionType {
    /// Kinds whose replacement is a node inserted into `<head>`
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            SuggestionType::Title
                | SuggestionType::Description
                | SuggestionType::StructuredData
                | SuggestionType::Canonical
                | SuggestionType::SocialTags
                | SuggestionType::Viewport
        )
    }

    /// Kinds whose find text is a short label rather than body prose
    pub fn is_short_text(&self) -> bool {
        matches!(
            self,
            SuggestionType::Heading | SuggestionType::Title | SuggestionType::Keywords
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Literal edit; an empty `find` on a metadata kind means "insert"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactReplacement {
    pub find: String,
    pub replace: String,
}

impl ExactReplacement {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// A pure insertion of a head node
    pub fn insertion(node: impl Into<String>) -> Self {
        Self::new(String::new(), node)
    }

    /// Nothing to apply; the suggestion is guidance only
    pub fn is_advisory(&self) -> bool {
        self.find.is_empty() && self.replace.is_empty()
    }
}

/// Who produced the replacement text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    #[default]
    Heuristic,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub priority: Priority,
    pub description: String,
    pub impact: String,
    pub current_content: String,
    pub enhanced_content: String,
    pub exact_replacement: ExactReplacement,
    #[serde(default)]
    pub source: SuggestionSource,
}

impl Suggestion {
    pub fn new(kind: SuggestionType, priority: Priority, description: &str, impact: &str) -> Self {
        Self {
            kind,
            priority,
            description: description.to_string(),
            impact: impact.to_string(),
            current_content: String::new(),
            enhanced_content: String::new(),
            exact_replacement: ExactReplacement::default(),
            source: SuggestionSource::Heuristic,
        }
    }

    pub fn with_content(mut self, current: impl Into<String>, enhanced: impl Into<String>) -> Self {
        self.current_content = current.into();
        self.enhanced_content = enhanced.into();
        self
    }

    pub fn with_replacement(mut self, replacement: ExactReplacement) -> Self {
        self.exact_replacement = replacement;
        self
    }
}

/// A detector could not build its suggestion
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("failed to serialize structured data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid page url '{0}'")]
    InvalidUrl(String),
}

/// Everything a detector may look at
pub struct DetectorContext<'a> {
    pub features: &'a PageFeatures,
    pub metadata: &'a Metadata,
    pub config: &'a EngineConfig,
}

/// Runs every detector and orders the results by priority
///
/// A failing detector is logged and contributes nothing.
pub fn generate(
    features: &PageFeatures,
    metadata: &Metadata,
    config: &EngineConfig,
) -> Vec<Suggestion> {
    let context = DetectorContext {
        features,
        metadata,
        config,
    };

    let mut suggestions: Vec<Suggestion> = detectors::CATALOGUE
        .iter()
        .filter_map(|(name, detect)| match detect(&context) {
            Ok(found) => found,
            Err(e) => {
                ::log::warn!("Detector {} failed for {}: {}", name, features.url, e);
                None
            }
        })
        .collect();

    suggestions.sort_by_key(|s| s.priority);
    ::log::debug!(
        "Generated {} suggestions for {}",
        suggestions.len(),
        features.url
    );
    suggestions
}

/// Like [`generate`], then asks `generator` to rewrite the prose suggestions
///
/// Any generation failure keeps the heuristic suggestion.
pub async fn generate_with(
    features: &PageFeatures,
    metadata: &Metadata,
    config: &EngineConfig,
    generator: &dyn TextGenerator,
) -> Vec<Suggestion> {
    let mut suggestions = generate(features, metadata, config);

    for suggestion in suggestions.iter_mut() {
        let task = match suggestion.kind {
            SuggestionType::Paragraph => generation::SPLIT_PARAGRAPH_TASK,
            SuggestionType::Clarity => generation::CLARIFY_SENTENCE_TASK,
            _ => continue,
        };
        if suggestion.current_content.is_empty() {
            continue;
        }

        let rewrite = generation::request_rewrite(
            generator,
            task,
            &suggestion.current_content,
            &config.generation,
        )
        .await;
        match rewrite {
            Ok(pair) => {
                suggestion.enhanced_content = pair.improved.clone();
                suggestion.exact_replacement = ExactReplacement::new(pair.original, pair.improved);
                suggestion.source = SuggestionSource::Generated;
            }
            Err(e) => {
                ::log::warn!(
                    "Keeping heuristic {:?} suggestion for {}: {}",
                    suggestion.kind,
                    features.url,
                    e
                );
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata;
    use crate::parsers;
    use crate::results::PageData;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn suggestions_for(markup: &str) -> Vec<Suggestion> {
        let (features, metadata, config) = prepare(markup);
        generate(&features, &metadata, &config)
    }

    fn prepare(markup: &str) -> (PageFeatures, Metadata, EngineConfig) {
        let config = EngineConfig::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let features = parsers::extract(&PageData::new("https://example.com/guide", markup));
        let metadata = metadata::derive(&features, &config, now);
        (features, metadata, config)
    }

    fn kinds(suggestions: &[Suggestion]) -> Vec<SuggestionType> {
        suggestions.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_bare_page_gets_high_priority_basics() {
        let body = "Cold brew coffee is easy to make at home with coarse grounds and water. ".repeat(4);
        let suggestions = suggestions_for(&format!("<html><body><p>{}</p></body></html>", body));
        let high: Vec<SuggestionType> = suggestions
            .iter()
            .filter(|s| s.priority == Priority::High)
            .map(|s| s.kind)
            .collect();

        for kind in [
            SuggestionType::Heading,
            SuggestionType::Title,
            SuggestionType::Description,
            SuggestionType::StructuredData,
        ] {
            assert!(high.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_sorted_by_priority() {
        let suggestions = suggestions_for("<p>Short page.</p>");
        for pair in suggestions.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
    }

    #[test]
    fn test_complete_page_has_no_metadata_suggestions() {
        let markup = r#"<html><head>
            <title>Cold Brew Guide</title>
            <meta name="description" content="How to make cold brew.">
            <meta name="viewport" content="width=device-width, initial-scale=1">
            <meta property="og:title" content="Cold Brew Guide">
            <link rel="canonical" href="https://example.com/guide">
            <script type="application/ld+json">{"@type":"Article","headline":"Cold Brew Guide"}</script>
            </head><body><h1>Cold Brew Guide</h1><p>Steep grounds overnight.</p></body></html>"#;
        let suggestions = suggestions_for(markup);
        assert!(suggestions.iter().all(|s| !s.kind.is_metadata()));
        assert!(!kinds(&suggestions).contains(&SuggestionType::Heading));
    }

    #[test]
    fn test_suggestion_serializes_kind_as_type() {
        let suggestion = Suggestion::new(SuggestionType::SocialTags, Priority::Low, "d", "i");
        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["type"], "social_tags");
        assert_eq!(json["priority"], "low");
        assert_eq!(json["source"], "heuristic");
    }

    struct ScriptedGenerator {
        replies: Mutex<Vec<Result<String, GenerationError>>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            let mut replies = self.replies.lock().expect("lock poisoned");
            if replies.is_empty() {
                Err(GenerationError::Provider("no scripted reply".to_string()))
            } else {
                replies.remove(0)
            }
        }
    }

    #[tokio::test]
    async fn test_generated_rewrite_replaces_heuristic_pair() {
        let markup = "<html><body><h1>Notes</h1><p>In order to brew, it is very important to note that water matters.</p></body></html>";
        let (features, metadata, config) = prepare(markup);
        let generator = ScriptedGenerator {
            replies: Mutex::new(vec![Ok(r#"```json
{"original": "In order to brew, it is very important to note that water matters.", "improved": "Water quality matters for brewing."}
```"#
                .to_string())]),
        };

        let suggestions = generate_with(&features, &metadata, &config, &generator).await;
        let clarity = suggestions
            .iter()
            .find(|s| s.kind == SuggestionType::Clarity)
            .unwrap();
        assert_eq!(clarity.source, SuggestionSource::Generated);
        assert_eq!(clarity.exact_replacement.replace, "Water quality matters for brewing.");
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_heuristic() {
        let markup = "<html><body><h1>Notes</h1><p>In order to brew, it is very important to note that water matters.</p></body></html>";
        let (features, metadata, config) = prepare(markup);
        let heuristic = generate(&features, &metadata, &config);
        let generator = ScriptedGenerator {
            replies: Mutex::new(vec![Ok("not json at all".to_string())]),
        };

        let suggestions = generate_with(&features, &metadata, &config, &generator).await;
        assert_eq!(suggestions, heuristic);
    }
}

//! Classic content quality: readability, structure, depth, originality,
//! source use, style and accessibility.

use crate::config::EngineConfig;
use crate::metadata::Metadata;
use crate::metadata::keywords::STOP_WORDS;
use crate::parsers::PageFeatures;
use crate::scoring::{CategoryScore, ScoreBreakdown};
use crate::utils::{self, ramp};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const READABILITY: &str = "readability_clarity";
pub const STRUCTURE: &str = "structure_coherence";
pub const DEPTH: &str = "depth_coverage";
pub const ORIGINALITY: &str = "originality";
pub const ACCURACY: &str = "accuracy_source_use";
pub const STYLE: &str = "style_tone";
pub const ACCESSIBILITY: &str = "accessibility_presentation";

const PARAGRAPH_BAND: std::ops::RangeInclusive<usize> = 60..=160;
const TRANSITION_CAP: f64 = 8.0;
const SUBTOPIC_CAP: f64 = 8.0;
const EXAMPLE_CAP: f64 = 6.0;
const LONG_WORD_CHARS: usize = 13;

const TRANSITIONS: &[&str] = &[
    "however",
    "therefore",
    "for example",
    "in addition",
    "moreover",
    "furthermore",
    "as a result",
    "consequently",
    "meanwhile",
    "finally",
    "first",
    "second",
    "in contrast",
    "similarly",
    "on the other hand",
    "because of this",
];

const EXAMPLE_CUES: &[&str] = &["for example", "e.g.", "for instance", "such as"];

static PASSIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:is|are|was|were|be|been|being)\s+(?:\w+ly\s+)?\w+(?:ed|en)\b")
        .expect("Failed to compile passive voice regex - this is a bug")
});

static NUMERIC_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d[\d,.]*\s*(?:%|percent\b|million\b|billion\b|x\b)|\b\d{2,}[\d,.]*\b")
        .expect("Failed to compile numeric claim regex - this is a bug")
});

/// Caller-supplied signals the page itself cannot provide
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityInputs<'a> {
    /// Competitor text to measure originality against
    pub competitor_snippets: &'a [String],
    /// Whether the tone matches the intended audience, if known
    pub audience_match: Option<bool>,
}

/// Scores classic content quality
pub fn score_quality(
    features: &PageFeatures,
    metadata: &Metadata,
    config: &EngineConfig,
    inputs: QualityInputs<'_>,
) -> ScoreBreakdown {
    let breakdown = ScoreBreakdown::combine(vec![
        readability(features),
        structure(features),
        depth(features),
        originality(features, config, inputs.competitor_snippets),
        accuracy(features, config),
        style(features, inputs.audience_match),
        accessibility(features),
    ]);

    ::log::debug!(
        "Content quality score for {} ({} words): {}",
        features.url,
        metadata.word_count,
        breakdown.total_score
    );
    breakdown
}

fn readability(features: &PageFeatures) -> CategoryScore {
    let text = &features.plain_text;
    let sentences = utils::sentences(text);

    let ease_points = if sentences.is_empty() {
        0.0
    } else {
        ramp(utils::flesch_reading_ease(text), 0.0, 60.0) * 10.0
    };

    let length_points = if sentences.is_empty() {
        0.0
    } else {
        let average = utils::word_count(text) as f64 / sentences.len() as f64;
        match average {
            a if (12.0..=20.0).contains(&a) => 6.0,
            a if (8.0..12.0).contains(&a) || (20.0..=25.0).contains(&a) => 4.0,
            _ => 2.0,
        }
    };

    let passive_points = if sentences.is_empty() {
        0.0
    } else {
        let passive = sentences.iter().filter(|s| PASSIVE_RE.is_match(s)).count();
        let ratio = passive as f64 / sentences.len() as f64;
        (1.0 - ramp(ratio, 0.1, 0.4)) * 4.0
    };

    CategoryScore::new(
        READABILITY,
        "Readability & Clarity",
        20.0,
        0.20,
        [
            ("reading_ease", ease_points),
            ("sentence_length", length_points),
            ("passive_voice", passive_points),
        ],
    )
}

/// No heading jumps more than one level deeper than the one before it
fn heading_levels_are_nested(features: &PageFeatures) -> bool {
    features
        .headings
        .windows(2)
        .all(|pair| pair[1].level <= pair[0].level + 1)
}

fn count_phrases(text: &str, phrases: &[&str]) -> usize {
    let padded = format!(" {} ", text.to_lowercase());
    phrases
        .iter()
        .map(|phrase| {
            padded
                .match_indices(phrase)
                .filter(|(i, _)| {
                    let before = padded[..*i].chars().next_back();
                    let after = padded[i + phrase.len()..].chars().next();
                    !before.is_some_and(char::is_alphanumeric)
                        && !after.is_some_and(char::is_alphanumeric)
                })
                .count()
        })
        .sum()
}

fn structure(features: &PageFeatures) -> CategoryScore {
    let h1_points = match features.h1_count() {
        1 => 3.0,
        0 => 0.0,
        _ => 1.0,
    };
    let nesting_points = if !features.headings.is_empty() && heading_levels_are_nested(features) {
        3.0
    } else {
        0.0
    };

    let in_band = features
        .paragraphs
        .iter()
        .filter(|p| PARAGRAPH_BAND.contains(&utils::word_count(p)))
        .count();
    let distribution_points = in_band as f64 / features.paragraphs.len().max(1) as f64 * 5.0;

    let transitions = (count_phrases(&features.plain_text, TRANSITIONS) as f64).min(TRANSITION_CAP);

    CategoryScore::new(
        STRUCTURE,
        "Structure & Coherence",
        15.0,
        0.15,
        [
            ("single_h1", h1_points),
            ("heading_hierarchy", nesting_points),
            ("paragraph_distribution", distribution_points),
            ("transitions", transitions / TRANSITION_CAP * 4.0),
        ],
    )
}

fn depth(features: &PageFeatures) -> CategoryScore {
    let subtopics = (features.subheading_count() as f64).min(SUBTOPIC_CAP);
    let examples = features.lists.len()
        + features.table_count
        + features.code_block_count
        + count_phrases(&features.plain_text, EXAMPLE_CUES);
    let examples = (examples as f64).min(EXAMPLE_CAP);

    CategoryScore::new(
        DEPTH,
        "Depth & Coverage",
        20.0,
        0.20,
        [
            ("subtopics", subtopics / SUBTOPIC_CAP * 10.0),
            ("examples", examples / EXAMPLE_CAP * 10.0),
        ],
    )
}

/// Lowercased content words of a text
fn vocabulary(text: &str) -> HashSet<String> {
    utils::words(text)
        .into_iter()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= 3 && !STOP_WORDS.contains(w.as_str()))
        .collect()
}

/// Jaccard overlap of two vocabularies; 0.0 when both are empty
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn originality(
    features: &PageFeatures,
    config: &EngineConfig,
    competitor_snippets: &[String],
) -> CategoryScore {
    let snippets: Vec<&String> = competitor_snippets
        .iter()
        .filter(|s| !s.trim().is_empty())
        .collect();

    let points = if snippets.is_empty() {
        config.neutral.originality * 15.0
    } else {
        let page = vocabulary(&features.plain_text);
        let max_overlap = snippets
            .iter()
            .map(|s| jaccard(&page, &vocabulary(s)))
            .fold(0.0, f64::max);
        (1.0 - max_overlap) * 15.0
    };

    CategoryScore::new(
        ORIGINALITY,
        "Originality",
        15.0,
        0.15,
        [("distinctiveness", points)],
    )
}

fn accuracy(features: &PageFeatures, config: &EngineConfig) -> CategoryScore {
    let blockquote_points = if features.blockquote_count > 0 { 3.0 } else { 0.0 };

    let claims: Vec<usize> = features
        .paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| NUMERIC_CLAIM_RE.is_match(p))
        .map(|(i, _)| i)
        .collect();
    let sourced_points = if claims.is_empty() {
        config.neutral.accuracy * 7.0
    } else {
        let supported = claims
            .iter()
            .filter(|i| features.paragraph_citations.get(**i).is_some_and(|c| *c > 0))
            .count();
        supported as f64 / claims.len() as f64 * 7.0
    };

    CategoryScore::new(
        ACCURACY,
        "Accuracy & Source Use",
        10.0,
        0.10,
        [
            ("blockquotes", blockquote_points),
            ("sourced_claims", sourced_points),
        ],
    )
}

fn style(features: &PageFeatures, audience_match: Option<bool>) -> CategoryScore {
    let words = utils::words(&features.plain_text);
    let jargon_points = if words.is_empty() {
        0.0
    } else {
        let long = words
            .iter()
            .filter(|w| w.chars().count() >= LONG_WORD_CHARS)
            .count();
        let ratio = long as f64 / words.len() as f64;
        (1.0 - ramp(ratio, 0.05, 0.25)) * 7.0
    };

    let audience_points = match audience_match {
        Some(true) => 3.0,
        Some(false) => 0.0,
        None => 1.5,
    };

    CategoryScore::new(
        STYLE,
        "Style & Tone",
        10.0,
        0.10,
        [("plain_language", jargon_points), ("audience_match", audience_points)],
    )
}

fn accessibility(features: &PageFeatures) -> CategoryScore {
    let alt_points = features.alt_coverage() * 5.0;
    let formatting_points = [features.table_count > 0, features.code_block_count > 0]
        .iter()
        .filter(|present| **present)
        .count() as f64;

    let markup_len = features.raw_markup.len();
    let ratio_points = if markup_len == 0 {
        0.0
    } else {
        ramp(features.plain_text.len() as f64 / markup_len as f64, 0.0, 0.25) * 3.0
    };

    CategoryScore::new(
        ACCESSIBILITY,
        "Accessibility & Presentation",
        10.0,
        0.10,
        [
            ("alt_coverage", alt_points),
            ("formatting", formatting_points),
            ("text_to_markup", ratio_points),
        ],
    )
}

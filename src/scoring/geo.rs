//! Visibility in AI-generated answers.
//!
//! Six categories, each scored in points up to its ceiling:
//!
//! | Category | Ceiling | Weight |
//! |---|---|---|
//! | Evidence & Attribution | 30 | 30% |
//! | Answerability & Snippetability | 25 | 25% |
//! | Structured Understanding | 20 | 20% |
//! | Freshness & Stability | 10 | 10% |
//! | Entity & Topic Coverage | 10 | 10% |
//! | Retrieval & Copyability | 5 | 5% |

use crate::config::EngineConfig;
use crate::filter::host_reputation;
use crate::metadata::Metadata;
use crate::parsers::{PageFeatures, faq_questions, schema_type_matches};
use crate::scoring::{CategoryScore, ScoreBreakdown};
use crate::utils::{self, ramp};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const EVIDENCE: &str = "evidence_attribution";
pub const ANSWERABILITY: &str = "answerability_snippetability";
pub const STRUCTURED: &str = "structured_understanding";
pub const FRESHNESS: &str = "freshness_stability";
pub const ENTITY: &str = "entity_topic_coverage";
pub const RETRIEVAL: &str = "retrieval_copyability";

/// Structured Understanding points at which the basics count as present
pub const STRUCTURED_BASICS_TIER: f64 = 8.0;

/// External links per 1,000 words earning full density credit
const DENSITY_TARGET: f64 = 5.0;
/// Density past which links look like link farming
const DENSITY_PENALTY_THRESHOLD: f64 = 20.0;
const COVERAGE_CAP: f64 = 0.5;

const SNIPPET_MIN_WORDS: usize = 15;
const SNIPPET_MAX_WORDS: usize = 90;
const FAQ_SATURATION: f64 = 10.0;

const FRESH_DAYS: f64 = 30.0;
const STALE_DAYS: f64 = 365.0;

const ENTITY_CAP: f64 = 12.0;
const TOPIC_CAP: f64 = 6.0;

const SUMMARY_CUES: &[&str] = &[
    "tl;dr",
    "tldr",
    "summary",
    "in short",
    "key takeaways",
    "at a glance",
    "overview",
    "bottom line",
    "in brief",
    "quick answer",
];

const ARTICLE_TYPES: &[&str] = &[
    "Article",
    "NewsArticle",
    "BlogPosting",
    "TechArticle",
    "ScholarlyArticle",
    "Report",
];

const ARTICLE_FIELDS: &[&str] = &[
    "headline",
    "author",
    "datePublished",
    "dateModified",
    "image",
    "publisher",
];

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][\w&'\-]*(?:[ \t]+[A-Z][\w&'\-]*)+")
        .expect("Failed to compile entity regex - this is a bug")
});

/// Scores how likely AI answer engines are to retrieve and cite the page
pub fn score_geo(
    features: &PageFeatures,
    metadata: &Metadata,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let breakdown = ScoreBreakdown::combine(vec![
        evidence(features, metadata),
        answerability(features),
        structured_understanding(features),
        freshness(metadata, config, now),
        entity_topic(features),
        retrieval(features, metadata),
    ]);

    ::log::debug!("GEO score for {}: {}", features.url, breakdown.total_score);
    breakdown
}

fn evidence(features: &PageFeatures, metadata: &Metadata) -> CategoryScore {
    let external: Vec<_> = features.external_links().collect();
    let count = external.len() as f64;

    let density = count / metadata.word_count.max(1) as f64 * 1000.0;
    let density_points = if density <= DENSITY_PENALTY_THRESHOLD {
        ramp(density, 0.0, DENSITY_TARGET) * 12.0
    } else {
        (12.0 - (density - DENSITY_PENALTY_THRESHOLD) * 0.5).max(0.0)
    };

    let sentence_count = utils::sentences(&features.plain_text).len().max(1) as f64;
    let coverage_points = (count / sentence_count).min(COVERAGE_CAP) / COVERAGE_CAP * 8.0;

    let quality_points = if external.is_empty() {
        0.0
    } else {
        let reputation = external.iter().map(|l| host_reputation(&l.host)).sum::<f64>() / count;
        let https_share = external.iter().filter(|l| l.is_https).count() as f64 / count;
        let distinct_hosts = external.iter().map(|l| l.host.as_str()).collect::<HashSet<_>>();
        let diversity = distinct_hosts.len() as f64 / count;
        reputation * 6.0 + https_share * 2.0 + diversity * 2.0
    };

    CategoryScore::new(
        EVIDENCE,
        "Evidence & Attribution",
        30.0,
        0.30,
        [
            ("citation_density", density_points),
            ("citation_coverage", coverage_points),
            ("citation_quality", quality_points),
        ],
    )
}

fn has_summary_cue(features: &PageFeatures) -> bool {
    features
        .headings
        .iter()
        .take(2)
        .map(|h| h.text.as_str())
        .chain(features.paragraphs.iter().take(2).map(|p| p.as_str()))
        .map(|text| text.to_lowercase())
        .any(|text| SUMMARY_CUES.iter().any(|cue| text.contains(cue)))
}

fn answerability(features: &PageFeatures) -> CategoryScore {
    let summary_points = if has_summary_cue(features) { 8.0 } else { 0.0 };

    let snippet_points = if features.paragraphs.iter().any(|p| {
        let words = utils::word_count(p);
        (SNIPPET_MIN_WORDS..=SNIPPET_MAX_WORDS).contains(&words)
    }) {
        9.0
    } else {
        0.0
    };

    let faq_count = features.faq_question_count() as f64;
    let faq_points = ((1.0 + faq_count).ln() / (1.0 + FAQ_SATURATION).ln()).min(1.0) * 8.0;

    CategoryScore::new(
        ANSWERABILITY,
        "Answerability & Snippetability",
        25.0,
        0.25,
        [
            ("summary_cue", summary_points),
            ("snippet_paragraph", snippet_points),
            ("faq_items", faq_points),
        ],
    )
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Best share of Article fields filled in across Article-like blocks
fn article_completeness(features: &PageFeatures) -> f64 {
    features
        .structured_data_of_type(ARTICLE_TYPES)
        .map(|block| {
            let filled = ARTICLE_FIELDS
                .iter()
                .filter(|field| block.get(**field).is_some_and(is_filled))
                .count();
            filled as f64 / ARTICLE_FIELDS.len() as f64
        })
        .fold(0.0, f64::max)
}

fn has_answered_faq(features: &PageFeatures) -> bool {
    features
        .structured_data_blocks
        .iter()
        .filter(|block| schema_type_matches(block, &["FAQPage"]))
        .flat_map(faq_questions)
        .any(|question| question.get("acceptedAnswer").is_some_and(is_filled))
}

/// Count of machine-readable signals present on the page
pub fn signal_marker_count(features: &PageFeatures) -> usize {
    [
        !features.structured_data_blocks.is_empty(),
        features.meta_tags.keys().any(|k| k.starts_with("og:")),
        features.meta_tags.keys().any(|k| k.starts_with("twitter:")),
        features.canonical_url.is_some(),
        features.has_meta("description"),
        features.html_lang.is_some(),
        features.has_microdata,
    ]
    .iter()
    .filter(|present| **present)
    .count()
}

fn structured_understanding(features: &PageFeatures) -> CategoryScore {
    let faq_points = if has_answered_faq(features) { 4.0 } else { 0.0 };
    let completeness_points = article_completeness(features) * 6.0 + faq_points;
    let marker_points = (signal_marker_count(features) as f64).min(6.0);
    let discovery_points = (features.discovery.count() as f64 * 4.0 / 3.0).min(4.0);

    CategoryScore::new(
        STRUCTURED,
        "Structured Understanding",
        20.0,
        0.20,
        [
            ("schema_completeness", completeness_points),
            ("signal_markers", marker_points),
            ("discovery_hints", discovery_points),
        ],
    )
}

fn freshness(metadata: &Metadata, config: &EngineConfig, now: DateTime<Utc>) -> CategoryScore {
    let recency_points = if metadata.publish_date_estimated && metadata.last_modified_estimated {
        config.neutral.freshness * 8.0
    } else {
        let days = (now - metadata.last_modified).num_days().max(0) as f64;
        (1.0 - ramp(days, FRESH_DAYS, STALE_DAYS)) * 8.0
    };
    let update_points = if metadata.has_distinct_update() { 2.0 } else { 0.0 };

    CategoryScore::new(
        FRESHNESS,
        "Freshness & Stability",
        10.0,
        0.10,
        [("recency", recency_points), ("update_signal", update_points)],
    )
}

/// Distinct capitalized multi-word runs, a proxy for named entities
pub fn entity_count(text: &str) -> usize {
    ENTITY_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn entity_topic(features: &PageFeatures) -> CategoryScore {
    let entities = (entity_count(&features.plain_text) as f64).min(ENTITY_CAP);
    let topics = (features.subheading_count() as f64).min(TOPIC_CAP);

    CategoryScore::new(
        ENTITY,
        "Entity & Topic Coverage",
        10.0,
        0.10,
        [
            ("entities", entities / ENTITY_CAP * 6.0),
            ("topic_recall", topics / TOPIC_CAP * 4.0),
        ],
    )
}

fn retrieval(features: &PageFeatures, metadata: &Metadata) -> CategoryScore {
    let length_points = match metadata.word_count {
        n if n >= 300 => 2.0,
        n if n >= 150 => 1.0,
        _ => 0.0,
    };
    let structures = [
        !features.lists.is_empty(),
        features.table_count > 0,
        features.code_block_count > 0,
    ]
    .iter()
    .filter(|present| **present)
    .count() as f64;

    CategoryScore::new(
        RETRIEVAL,
        "Retrieval & Copyability",
        5.0,
        0.05,
        [("length", length_points), ("copy_structures", structures)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata;
    use crate::parsers;
    use crate::results::PageData;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn score(markup: &str) -> ScoreBreakdown {
        let config = EngineConfig::default();
        let features = parsers::extract(&PageData::new("https://shop.example.com/guide", markup));
        let metadata = metadata::derive(&features, &config, now());
        score_geo(&features, &metadata, &config, now())
    }

    fn faq_block(questions: usize) -> String {
        let entities: Vec<String> = (0..questions)
            .map(|i| {
                format!(
                    r#"{{"@type":"Question","name":"Question {i}?","acceptedAnswer":{{"@type":"Answer","text":"Answer {i}."}}}}"#
                )
            })
            .collect();
        format!(
            r#"<script type="application/ld+json">{{"@context":"https://schema.org","@type":"FAQPage","mainEntity":[{}]}}</script>"#,
            entities.join(",")
        )
    }

    #[test]
    fn test_empty_page_is_within_bounds() {
        let breakdown = score("");
        assert!((0.0..=100.0).contains(&breakdown.total_score));
        assert_eq!(breakdown.categories.len(), 6);
        let weights: f64 = breakdown.categories.iter().map(|c| c.weight).sum();
        assert!((weights - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reputable_citations_score_higher() {
        let body = "Solar output rose sharply last year. ".repeat(30);
        let weak = score(&format!(
            r#"<body><p>{} <a href="http://someblog.com/a">source</a></p></body>"#,
            body
        ));
        let strong = score(&format!(
            r#"<body><p>{} <a href="https://www.nrel.gov/a">source</a> <a href="https://iea.org/b">data</a></p></body>"#,
            body
        ));
        let weak_evidence = weak.category(EVIDENCE).unwrap();
        let strong_evidence = strong.category(EVIDENCE).unwrap();
        assert!(strong_evidence.score > weak_evidence.score);
    }

    #[test]
    fn test_internal_links_are_not_citations() {
        let breakdown = score(
            r#"<body><p>See <a href="/pricing">pricing</a> and <a href="https://www.shop.example.com/faq">faq</a>.</p></body>"#,
        );
        assert_eq!(breakdown.category(EVIDENCE).unwrap().score, 0.0);
    }

    #[test]
    fn test_faq_and_lead_paragraph_make_page_answerable() {
        let lead = "Cold brew is coffee steeped in cold water for twelve to twenty four hours, \
                    producing a smooth and less acidic drink that keeps well in the fridge \
                    for about a week and works well over ice or diluted with milk for a \
                    mellow morning cup.";
        let markup = format!(
            "<html><head>{}</head><body><p>{}</p></body></html>",
            faq_block(6),
            lead
        );
        let breakdown = score(&markup);
        let answerability = breakdown.category(ANSWERABILITY).unwrap();
        assert!(answerability.score > answerability.ceiling / 2.0);
    }

    #[test]
    fn test_faq_never_lowers_structure_or_answerability() {
        let base = "<html><head><title>T</title></head><body><h1>Guide</h1><p>Some text here.</p></body></html>";
        let with_faq = base.replace("</head>", &format!("{}</head>", faq_block(3)));

        let without = score(base);
        let with = score(&with_faq);
        for key in [STRUCTURED, ANSWERABILITY] {
            assert!(with.category(key).unwrap().score >= without.category(key).unwrap().score);
        }
    }

    #[test]
    fn test_structured_basics_tier() {
        let bare = score("<html><body><p>Just some words on a page.</p></body></html>");
        assert!(bare.category(STRUCTURED).unwrap().score < STRUCTURED_BASICS_TIER);

        let rich = score(
            r#"<html lang="en"><head>
            <meta name="description" content="d">
            <meta property="og:title" content="t">
            <link rel="canonical" href="https://shop.example.com/guide">
            <script type="application/ld+json">{"@type":"Article","headline":"h","author":"a","datePublished":"2026-01-01","dateModified":"2026-02-01","image":"i.png","publisher":{"name":"p"}}</script>
            </head><body><p>x</p></body></html>"#,
        );
        assert!(rich.category(STRUCTURED).unwrap().score >= STRUCTURED_BASICS_TIER);
    }

    #[test]
    fn test_freshness_decay() {
        let fresh = score(r#"<head><meta property="article:modified_time" content="2026-02-20"></head><body><p>x</p></body>"#);
        let stale = score(r#"<head><meta property="article:modified_time" content="2024-01-01"></head><body><p>x</p></body>"#);
        let neutral = score("<body><p>x</p></body>");

        assert_eq!(fresh.category(FRESHNESS).unwrap().sub_metrics["recency"], 8.0);
        assert_eq!(stale.category(FRESHNESS).unwrap().sub_metrics["recency"], 0.0);
        assert_eq!(neutral.category(FRESHNESS).unwrap().sub_metrics["recency"], 4.0);
    }

    #[test]
    fn test_entity_count() {
        assert_eq!(
            entity_count("Visit New York City with Acme Corp. Then New York City again."),
            3
        );
        assert_eq!(entity_count("nothing capitalized here"), 0);
    }
}

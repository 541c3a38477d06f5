pub mod keywords;

use crate::config::EngineConfig;
use crate::parsers::PageFeatures;
use crate::utils;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

pub use keywords::{KeywordScore, score_keywords};

const DESCRIPTION_MAX_CHARS: usize = 160;
const UNKNOWN_AUTHOR: &str = "Unknown";
pub const UNTITLED: &str = "Untitled";

static BYLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[Bb]y:?\s+([A-Z][\w'.\-]*(?:\s+[A-Z][\w'.\-]*){0,2})")
        .expect("Failed to compile byline regex - this is a bug")
});

/// Descriptive metadata derived once from the page features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub publish_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// The publish date is the reference time, not something the page declared
    pub publish_date_estimated: bool,
    /// The modification date is the reference time, not something the page declared
    pub last_modified_estimated: bool,
    pub reading_time_minutes: usize,
    pub word_count: usize,
}

impl Metadata {
    /// Both dates were declared by the page and differ
    pub fn has_distinct_update(&self) -> bool {
        !self.publish_date_estimated
            && !self.last_modified_estimated
            && self.publish_date != self.last_modified
    }
}

type AuthorStrategy = fn(&PageFeatures) -> Option<String>;

/// Author lookups in priority order; the first non-empty answer wins
const AUTHOR_STRATEGIES: &[(&str, AuthorStrategy)] = &[
    ("meta", author_from_meta),
    ("structured-data", author_from_structured_data),
    ("byline", author_from_byline),
];

/// Derives the page metadata
///
/// `now` stands in for any date the page does not declare.
pub fn derive(features: &PageFeatures, config: &EngineConfig, now: DateTime<Utc>) -> Metadata {
    let title = derive_title(features);
    let description = derive_description(features);
    let author = derive_author(features);

    let declared_publish = derive_publish_date(features);
    let declared_modified = derive_modified_date(features).or(declared_publish);

    let word_count = utils::word_count(&features.plain_text);
    let reading_time_minutes = if word_count == 0 {
        0
    } else {
        word_count.div_ceil(config.words_per_minute).max(1)
    };

    let mut emphasis: Vec<&str> = vec![title.as_str()];
    emphasis.extend(features.headings.iter().map(|h| h.text.as_str()));
    let keywords = score_keywords(&features.plain_text, &emphasis, &config.keywords)
        .into_iter()
        .map(|k| k.phrase)
        .collect();

    Metadata {
        title,
        description,
        keywords,
        author,
        publish_date: declared_publish.unwrap_or(now),
        last_modified: declared_modified.unwrap_or(now),
        publish_date_estimated: declared_publish.is_none(),
        last_modified_estimated: declared_modified.is_none(),
        reading_time_minutes,
        word_count,
    }
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(utils::normalize_whitespace)
        .find(|c| !c.is_empty())
}

fn derive_title(features: &PageFeatures) -> String {
    first_non_empty([
        features.document_title.as_deref(),
        features.meta("og:title"),
        features.meta("twitter:title"),
        features
            .headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.as_str()),
        features.headings.first().map(|h| h.text.as_str()),
    ])
    .unwrap_or_else(|| UNTITLED.to_string())
}

fn derive_description(features: &PageFeatures) -> String {
    first_non_empty([
        features.meta("description"),
        features.meta("og:description"),
        features.meta("twitter:description"),
    ])
    .or_else(|| {
        features
            .paragraphs
            .first()
            .map(|p| utils::truncate_words(p, DESCRIPTION_MAX_CHARS))
    })
    .unwrap_or_default()
}

fn derive_author(features: &PageFeatures) -> String {
    for (name, strategy) in AUTHOR_STRATEGIES {
        if let Some(author) = strategy(features) {
            ::log::debug!("Author '{}' resolved from {}", author, name);
            return author;
        }
    }
    UNKNOWN_AUTHOR.to_string()
}

fn author_from_meta(features: &PageFeatures) -> Option<String> {
    first_non_empty([
        features.meta("author"),
        features.meta("article:author"),
        features.meta("dc.creator"),
    ])
}

fn author_from_structured_data(features: &PageFeatures) -> Option<String> {
    features
        .structured_data_blocks
        .iter()
        .filter_map(|block| block.get("author").or_else(|| block.get("creator")))
        .find_map(person_name)
}

/// Name of a schema.org person given as string, object or list
fn person_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => first_non_empty([Some(name.as_str())]),
        Value::Object(map) => map.get("name").and_then(person_name),
        Value::Array(items) => items.iter().find_map(person_name),
        _ => None,
    }
}

fn author_from_byline(features: &PageFeatures) -> Option<String> {
    BYLINE_RE
        .captures(&features.plain_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', '-']).to_string())
        .filter(|name| !name.is_empty())
}

fn structured_data_string<'a>(features: &'a PageFeatures, key: &str) -> Option<&'a str> {
    features
        .structured_data_blocks
        .iter()
        .find_map(|block| block.get(key).and_then(Value::as_str))
}

fn derive_publish_date(features: &PageFeatures) -> Option<DateTime<Utc>> {
    [
        features.meta("article:published_time"),
        structured_data_string(features, "datePublished"),
        features.meta("date"),
        features.meta("pubdate"),
        features.time_datetimes.first().map(|d| d.as_str()),
    ]
    .into_iter()
    .flatten()
    .find_map(parse_date)
}

fn derive_modified_date(features: &PageFeatures) -> Option<DateTime<Utc>> {
    [
        features.meta("article:modified_time"),
        features.meta("og:updated_time"),
        structured_data_string(features, "dateModified"),
    ]
    .into_iter()
    .flatten()
    .find_map(parse_date)
}

/// Parses RFC 3339 timestamps, naive timestamps and plain dates as UTC
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    // Anything starting with a calendar date, e.g. "2024-03-01T10:00:00.000+0000"
    let date_part = value.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers;
    use crate::results::PageData;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn derive_from(markup: &str) -> Metadata {
        let features = parsers::extract(&PageData::new("https://example.com/post", markup));
        derive(&features, &EngineConfig::default(), now())
    }

    #[test]
    fn test_title_fallbacks() {
        assert_eq!(
            derive_from("<html><head><title>Doc Title</title></head><body><h1>H</h1></body></html>")
                .title,
            "Doc Title"
        );
        assert_eq!(
            derive_from(r#"<html><head><meta property="og:title" content="OG"></head><body><h1>H</h1></body></html>"#)
                .title,
            "OG"
        );
        assert_eq!(derive_from("<body><h2>Sub</h2><h1>Main</h1></body>").title, "Main");
        assert_eq!(derive_from("<body><p>text</p></body>").title, UNTITLED);
    }

    #[test]
    fn test_description_falls_back_to_first_paragraph() {
        let long = "word ".repeat(100);
        let metadata = derive_from(&format!("<body><p>{}</p></body>", long));
        assert!(metadata.description.chars().count() <= DESCRIPTION_MAX_CHARS);
        assert!(metadata.description.starts_with("word word"));

        let metadata = derive_from(
            r#"<head><meta name="description" content="  Declared   summary "></head><body><p>x</p></body>"#,
        );
        assert_eq!(metadata.description, "Declared summary");
    }

    #[test]
    fn test_author_strategies_in_order() {
        let meta = derive_from(
            r#"<head><meta name="author" content="Ada Lovelace"></head><body><p>By Someone Else</p></body>"#,
        );
        assert_eq!(meta.author, "Ada Lovelace");

        let structured = derive_from(
            r#"<head><script type="application/ld+json">{"@type":"Article","author":[{"@type":"Person","name":"Grace Hopper"}]}</script></head><body><p>By Someone Else</p></body>"#,
        );
        assert_eq!(structured.author, "Grace Hopper");

        let byline = derive_from("<body><p>Posted by Alan Turing on Monday.</p></body>");
        assert_eq!(byline.author, "Alan Turing");

        assert_eq!(derive_from("<body><p>no author</p></body>").author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_dates_and_estimation_flags() {
        let metadata = derive_from(
            r#"<head><meta property="article:published_time" content="2025-06-01T08:00:00Z"><meta property="article:modified_time" content="2025-12-20"></head><body><p>x</p></body>"#,
        );
        assert_eq!(
            metadata.publish_date,
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(
            metadata.last_modified,
            Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap()
        );
        assert!(metadata.has_distinct_update());

        let missing = derive_from("<body><p>x</p></body>");
        assert_eq!(missing.publish_date, now());
        assert_eq!(missing.last_modified, now());
        assert!(missing.publish_date_estimated);
        assert!(missing.last_modified_estimated);
        assert!(!missing.has_distinct_update());
    }

    #[test]
    fn test_modified_defaults_to_publish_date() {
        let metadata =
            derive_from(r#"<body><time datetime="2024-02-29">Feb 29</time><p>x</p></body>"#);
        assert!(!metadata.last_modified_estimated);
        assert_eq!(metadata.publish_date, metadata.last_modified);
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2024-03-01T10:00:00+02:00").is_some());
        assert!(parse_date("2024-03-01T10:00:00").is_some());
        assert!(parse_date("2024-03-01T10:00:00.000+0000").is_some());
        assert!(parse_date("2024-03-01").is_some());
        assert!(parse_date("March 1st").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_word_count_and_reading_time() {
        let metadata = derive_from(&format!("<body><p>{}</p></body>", "word ".repeat(450)));
        assert_eq!(metadata.word_count, 450);
        assert_eq!(metadata.reading_time_minutes, 3);
        assert_eq!(derive_from("<body></body>").reading_time_minutes, 0);
    }
}

pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::filter::{Link, LinkClassifier};
use crate::results::PageData;
use crate::utils;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Enum to represent the kind of content a page carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserType {
    /// HTML markup
    Html,
    /// Plain text without any tags
    Text,
}

impl ParserType {
    /// Sniffs the content: anything containing a tag is parsed as HTML
    pub fn detect(content: &str) -> Self {
        if utils::contains_markup(content) {
            ParserType::Html
        } else {
            ::log::debug!("No markup found, classifying content as Text");
            ParserType::Text
        }
    }
}

/// A heading with its level (1 for `h1` through 6)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// An `ol`/`ul` block and the text of its direct items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub kind: ListKind,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub has_alt: bool,
}

/// References that help crawlers discover the site's content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryHints {
    pub sitemap: bool,
    pub robots: bool,
    pub feed: bool,
}

impl DiscoveryHints {
    pub fn count(&self) -> usize {
        [self.sitemap, self.robots, self.feed]
            .iter()
            .filter(|present| **present)
            .count()
    }
}

/// Neutral feature bag derived once from a page's markup
///
/// Every collection is empty rather than missing when the markup lacks
/// the corresponding elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFeatures {
    pub url: String,
    #[serde(skip_serializing, default)]
    pub raw_markup: String,
    /// Visible text, never containing markup
    pub plain_text: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    /// Links inside each paragraph, aligned with `paragraphs`
    pub paragraph_citations: Vec<usize>,
    pub lists: Vec<ListBlock>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub structured_data_blocks: Vec<Value>,
    /// Meta tag content keyed by lowercased name, property or http-equiv
    pub meta_tags: BTreeMap<String, String>,
    pub document_title: Option<String>,
    pub canonical_url: Option<String>,
    pub html_lang: Option<String>,
    pub discovery: DiscoveryHints,
    pub table_count: usize,
    pub code_block_count: usize,
    pub blockquote_count: usize,
    pub has_microdata: bool,
    /// `datetime` attributes of `<time>` elements in document order
    pub time_datetimes: Vec<String>,
}

impl PageFeatures {
    /// Content of a meta tag, if present and non-empty
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta_tags
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn has_meta(&self, key: &str) -> bool {
        self.meta(key).is_some()
    }

    pub fn has_viewport(&self) -> bool {
        self.has_meta("viewport")
    }

    /// Any Open Graph tag is declared
    pub fn has_social_tags(&self) -> bool {
        self.meta_tags.keys().any(|k| k.starts_with("og:"))
    }

    pub fn external_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.is_external)
    }

    pub fn h1_count(&self) -> usize {
        self.headings.iter().filter(|h| h.level == 1).count()
    }

    /// Headings below the top level that introduce sub-topics (h2-h4)
    pub fn subheading_count(&self) -> usize {
        self.headings
            .iter()
            .filter(|h| (2..=4).contains(&h.level))
            .count()
    }

    /// Share of images with non-empty alt text; 1.0 when there are no images
    pub fn alt_coverage(&self) -> f64 {
        if self.images.is_empty() {
            return 1.0;
        }
        let with_alt = self.images.iter().filter(|i| i.has_alt).count();
        with_alt as f64 / self.images.len() as f64
    }

    /// Structured-data blocks whose `@type` matches one of `types`
    pub fn structured_data_of_type<'a>(
        &'a self,
        types: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.structured_data_blocks
            .iter()
            .filter(move |block| schema_type_matches(block, types))
    }

    /// Number of FAQ questions declared in FAQPage structured data
    pub fn faq_question_count(&self) -> usize {
        self.structured_data_of_type(&["FAQPage"])
            .map(|block| faq_questions(block).len())
            .sum()
    }
}

/// Whether a JSON-LD node's `@type` (string or array) is one of `types`
pub fn schema_type_matches(block: &Value, types: &[&str]) -> bool {
    match block.get("@type") {
        Some(Value::String(t)) => types.iter().any(|wanted| t.as_str() == *wanted),
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_str)
            .any(|t| types.contains(&t)),
        _ => false,
    }
}

/// Question entries of a FAQPage node
pub fn faq_questions(block: &Value) -> Vec<&Value> {
    match block.get("mainEntity") {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| schema_type_matches(item, &["Question"]))
            .collect(),
        Some(item) if schema_type_matches(item, &["Question"]) => vec![item],
        _ => Vec::new(),
    }
}

/// Extracts the feature bag for a page
///
/// Never fails: malformed or absent markup yields well-formed, empty
/// collections.
pub fn extract(page: &PageData) -> PageFeatures {
    let classifier = LinkClassifier::new(&page.url);

    let mut features = match ParserType::detect(&page.raw_markup) {
        ParserType::Html => html::parse(&page.raw_markup, &classifier),
        ParserType::Text => PageFeatures {
            plain_text: text::parse(&page.raw_markup),
            ..PageFeatures::default()
        },
    };

    features.url = page.url.clone();
    features.raw_markup = page.raw_markup.clone();

    // A caller-supplied text wins over what we derived, once sanitized
    if !page.plain_text.trim().is_empty() {
        features.plain_text = text::parse(&utils::strip_markup(&page.plain_text));
    }

    if features.paragraphs.is_empty() {
        features.paragraphs = text::paragraph_blocks(&features.plain_text);
        features.paragraph_citations = vec![0; features.paragraphs.len()];
    }

    ::log::debug!(
        "Extracted {} headings, {} paragraphs, {} links, {} structured-data blocks from {}",
        features.headings.len(),
        features.paragraphs.len(),
        features.links.len(),
        features.structured_data_blocks.len(),
        page.url
    );

    features
}

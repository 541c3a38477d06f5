use crate::filter::LinkClassifier;
use crate::parsers::{DiscoveryHints, Heading, Image, ListBlock, ListKind, PageFeatures, text};
use crate::utils::{normalize_whitespace, strip_markup};
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| {
            Selector::parse($css).expect(concat!("Failed to parse selector ", $css, " - this is a bug"))
        });
    };
}

selector!(BODY_SELECTOR, "body");
selector!(HTML_SELECTOR, "html");
selector!(TITLE_SELECTOR, "title");
selector!(HEADING_SELECTOR, "h1, h2, h3, h4, h5, h6");
selector!(PARAGRAPH_SELECTOR, "p");
selector!(LIST_SELECTOR, "ul, ol");
selector!(ANCHOR_SELECTOR, "a[href]");
selector!(IMAGE_SELECTOR, "img");
selector!(JSON_LD_SELECTOR, r#"script[type="application/ld+json"]"#);
selector!(META_SELECTOR, "meta");
selector!(LINK_REL_SELECTOR, "link[rel]");
selector!(TABLE_SELECTOR, "table");
selector!(PRE_SELECTOR, "pre");
selector!(CODE_SELECTOR, "code");
selector!(BLOCKQUOTE_SELECTOR, "blockquote");
selector!(MICRODATA_SELECTOR, "[itemscope]");
selector!(TIME_SELECTOR, "time[datetime]");

/// Elements whose text is never visible
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of visible text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Parses HTML into a feature bag
///
/// `url` and `raw_markup` are left empty for the caller to fill in.
/// `paragraphs` only holds semantic `<p>` blocks here.
pub fn parse(markup: &str, classifier: &LinkClassifier) -> PageFeatures {
    let doc = Html::parse_document(markup);

    let (paragraphs, paragraph_citations) = extract_paragraphs(&doc, classifier);
    let features = PageFeatures {
        plain_text: extract_visible_text(&doc),
        headings: extract_headings(&doc),
        paragraphs,
        paragraph_citations,
        lists: extract_lists(&doc),
        links: doc
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| classifier.classify(href))
            .collect(),
        images: doc
            .select(&IMAGE_SELECTOR)
            .map(|img| Image {
                has_alt: img
                    .value()
                    .attr("alt")
                    .is_some_and(|alt| !alt.trim().is_empty()),
            })
            .collect(),
        structured_data_blocks: extract_structured_data(&doc),
        meta_tags: extract_meta_tags(&doc),
        document_title: doc
            .select(&TITLE_SELECTOR)
            .next()
            .map(|t| normalize_whitespace(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty()),
        canonical_url: link_rel_hrefs(&doc, "canonical").into_iter().next(),
        html_lang: doc
            .select(&HTML_SELECTOR)
            .next()
            .and_then(|h| h.value().attr("lang"))
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty()),
        discovery: extract_discovery_hints(&doc),
        table_count: doc.select(&TABLE_SELECTOR).count(),
        code_block_count: count_code_blocks(&doc),
        blockquote_count: doc.select(&BLOCKQUOTE_SELECTOR).count(),
        has_microdata: doc.select(&MICRODATA_SELECTOR).next().is_some(),
        time_datetimes: doc
            .select(&TIME_SELECTOR)
            .filter_map(|t| t.value().attr("datetime"))
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect(),
        ..PageFeatures::default()
    };

    ::log::debug!(
        "HTML parser found {} headings, {} lists, {} images",
        features.headings.len(),
        features.lists.len(),
        features.images.len()
    );

    features
}

/// Collects visible body text, one line per block element
///
/// Escaped tags in the source (`&lt;div&gt;`) decode to markup and are dropped.
pub fn extract_visible_text(doc: &Html) -> String {
    let mut out = String::new();
    match doc.select(&BODY_SELECTOR).next() {
        Some(body) => collect_text(body, &mut out),
        None => collect_text(doc.root_element(), &mut out),
    }
    text::parse(&strip_markup(&out))
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN_TAGS.contains(&name) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn element_text(element: &ElementRef) -> String {
    let mut out = String::new();
    collect_text(*element, &mut out);
    normalize_whitespace(&out)
}

fn extract_headings(doc: &Html) -> Vec<Heading> {
    doc.select(&HEADING_SELECTOR)
        .filter_map(|h| {
            let level = h.value().name()[1..].parse::<u8>().ok()?;
            let text = element_text(&h);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn extract_paragraphs(doc: &Html, classifier: &LinkClassifier) -> (Vec<String>, Vec<usize>) {
    let mut paragraphs = Vec::new();
    let mut citations = Vec::new();

    for p in doc.select(&PARAGRAPH_SELECTOR) {
        let text = element_text(&p);
        if text.is_empty() {
            continue;
        }
        let links = p
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| classifier.classify(href).is_some())
            .count();
        paragraphs.push(text);
        citations.push(links);
    }

    (paragraphs, citations)
}

fn extract_lists(doc: &Html) -> Vec<ListBlock> {
    doc.select(&LIST_SELECTOR)
        .filter_map(|list| {
            let kind = if list.value().name() == "ol" {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            };
            let items: Vec<String> = list
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "li")
                .map(|li| element_text(&li))
                .filter(|item| !item.is_empty())
                .collect();
            (!items.is_empty()).then_some(ListBlock { kind, items })
        })
        .collect()
}

/// Parses every JSON-LD block, flattening arrays and `@graph` containers
fn extract_structured_data(doc: &Html) -> Vec<Value> {
    let mut blocks = Vec::new();

    for script in doc.select(&JSON_LD_SELECTOR) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => flatten_json_ld(value, &mut blocks),
            Err(e) => ::log::debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    blocks
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        Value::Object(mut map) => match map.remove("@graph") {
            Some(graph) => {
                if map.contains_key("@type") {
                    out.push(Value::Object(map));
                }
                flatten_json_ld(graph, out);
            }
            None => out.push(Value::Object(map)),
        },
        _ => {}
    }
}

/// Meta tags keyed by lowercased name, property or http-equiv; first one wins
fn extract_meta_tags(doc: &Html) -> std::collections::BTreeMap<String, String> {
    let mut tags = std::collections::BTreeMap::new();

    for meta in doc.select(&META_SELECTOR) {
        let el = meta.value();
        let key = el
            .attr("name")
            .or_else(|| el.attr("property"))
            .or_else(|| el.attr("http-equiv"));
        let (Some(key), Some(content)) = (key, el.attr("content")) else {
            continue;
        };
        tags.entry(key.trim().to_ascii_lowercase())
            .or_insert_with(|| content.trim().to_string());
    }

    tags
}

/// Hrefs of `<link>` elements whose rel list contains `rel`
fn link_rel_hrefs(doc: &Html, rel: &str) -> Vec<String> {
    doc.select(&LINK_REL_SELECTOR)
        .filter(|link| has_rel(link, rel))
        .filter_map(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

fn has_rel(link: &ElementRef, rel: &str) -> bool {
    link.value()
        .attr("rel")
        .is_some_and(|value| value.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
}

fn extract_discovery_hints(doc: &Html) -> DiscoveryHints {
    let mut hints = DiscoveryHints::default();

    for link in doc.select(&LINK_REL_SELECTOR) {
        let mime = link.value().attr("type").unwrap_or_default().to_ascii_lowercase();
        if has_rel(&link, "alternate") && (mime.contains("rss") || mime.contains("atom")) {
            hints.feed = true;
        }
        if has_rel(&link, "sitemap") {
            hints.sitemap = true;
        }
    }

    let hrefs = doc
        .select(&ANCHOR_SELECTOR)
        .chain(doc.select(&LINK_REL_SELECTOR))
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.to_ascii_lowercase());
    for href in hrefs {
        if href.contains("sitemap") && href.ends_with(".xml") {
            hints.sitemap = true;
        }
        if href.ends_with("robots.txt") {
            hints.robots = true;
        }
        if href.ends_with("/feed") || href.ends_with(".rss") || href.ends_with("/rss.xml") {
            hints.feed = true;
        }
    }

    if doc
        .select(&META_SELECTOR)
        .any(|m| m.value().attr("name").is_some_and(|n| n.eq_ignore_ascii_case("robots")))
    {
        hints.robots = true;
    }

    hints
}

/// `pre` blocks plus `code` elements outside of them
fn count_code_blocks(doc: &Html) -> usize {
    let pre = doc.select(&PRE_SELECTOR).count();
    let inline = doc
        .select(&CODE_SELECTOR)
        .filter(|code| {
            !code
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "pre")
        })
        .count();
    pre + inline
}

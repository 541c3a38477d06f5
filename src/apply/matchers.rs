//! The ordered matching cascade used to locate a suggestion's find text.
//!
//! Every matcher works on one visible text region at a time, with character
//! references decoded, and returns a byte range relative to that decoded text.

use super::MatchStrategy;
use crate::config::MatchConfig;
use crate::suggestions::SuggestionType;
use crate::utils;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Elements whose content is never visible text
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static TAG_SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<[a-zA-Z/!?][^>]*>")
        .expect("Failed to compile tag scan regex - this is a bug")
});

static OPEN_TAG_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([a-zA-Z][a-zA-Z0-9-]*)")
        .expect("Failed to compile tag name regex - this is a bug")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("Failed to compile entity regex - this is a bug")
});

static SENTENCE_TERMINATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?]+").expect("Failed to compile terminator regex - this is a bug")
});

/// Byte ranges of the markup's visible text, between tags
///
/// Comments and the content of script-like elements are excluded, as are
/// whitespace-only gaps.
pub fn text_regions(markup: &str) -> Vec<Range<usize>> {
    let lower = markup.to_ascii_lowercase();
    let mut regions = Vec::new();
    let mut push = |range: Range<usize>| {
        if !markup[range.clone()].trim().is_empty() {
            regions.push(range);
        }
    };

    let mut pos = 0;
    while pos < markup.len() {
        let Some(tag) = TAG_SCAN_RE.find_at(markup, pos) else {
            push(pos..markup.len());
            break;
        };
        push(pos..tag.start());
        pos = tag.end();

        if let Some(name) = raw_text_element(tag.as_str()) {
            let close = format!("</{}", name);
            pos = lower[pos..]
                .find(&close)
                .map_or(markup.len(), |offset| pos + offset);
        }
    }

    regions
}

/// Region text as a reader sees it, mapped back to the raw bytes
struct DecodedRegion {
    text: String,
    /// Raw offset for every byte of `text`, plus one past the end
    raw_offsets: Vec<usize>,
}

impl DecodedRegion {
    fn new(raw: &str) -> Self {
        let mut region = Self {
            text: String::with_capacity(raw.len()),
            raw_offsets: Vec::with_capacity(raw.len() + 1),
        };

        let mut pos = 0;
        for entity in ENTITY_RE.find_iter(raw) {
            region.push_verbatim(&raw[pos..entity.start()], pos);
            let decoded = html_escape::decode_html_entities(entity.as_str());
            if decoded == entity.as_str() {
                region.push_verbatim(entity.as_str(), entity.start());
            } else {
                region.push_reference(&decoded, entity.start());
            }
            pos = entity.end();
        }
        region.push_verbatim(&raw[pos..], pos);
        region.raw_offsets.push(raw.len());
        region
    }

    fn push_verbatim(&mut self, piece: &str, raw_start: usize) {
        self.raw_offsets.extend(raw_start..raw_start + piece.len());
        self.text.push_str(piece);
    }

    /// Every decoded byte maps to the `&` that starts the reference
    fn push_reference(&mut self, decoded: &str, raw_start: usize) {
        self.raw_offsets.extend(std::iter::repeat_n(raw_start, decoded.len()));
        self.text.push_str(decoded);
    }

    fn raw_range(&self, span: Range<usize>) -> Range<usize> {
        self.raw_offsets[span.start]..self.raw_offsets[span.end]
    }
}

/// Name of the raw-text element an opening tag starts, if any
fn raw_text_element(tag: &str) -> Option<String> {
    let name = OPEN_TAG_NAME_RE.captures(tag)?.get(1)?.as_str().to_ascii_lowercase();
    let self_closing = tag.trim_end_matches('>').trim_end().ends_with('/');
    (RAW_TEXT_TAGS.contains(&name.as_str()) && !self_closing).then_some(name)
}

pub trait Matcher {
    fn strategy(&self) -> MatchStrategy;

    /// Range of `needle` inside `region`, if this matcher recognizes it
    fn find(&self, region: &str, needle: &str) -> Option<Range<usize>>;
}

pub struct Exact;

impl Matcher for Exact {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Exact
    }

    fn find(&self, region: &str, needle: &str) -> Option<Range<usize>> {
        region.find(needle).map(|start| start..start + needle.len())
    }
}

pub struct CaseInsensitive;

impl Matcher for CaseInsensitive {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::CaseInsensitive
    }

    fn find(&self, region: &str, needle: &str) -> Option<Range<usize>> {
        let re = Regex::new(&format!("(?i){}", regex::escape(needle))).ok()?;
        re.find(region).map(|m| m.range())
    }
}

/// Pattern matching `tokens` separated by any run of whitespace
fn flexible_whitespace_regex<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Option<Regex> {
    let escaped: Vec<String> = tokens.into_iter().map(regex::escape).collect();
    if escaped.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i){}", escaped.join(r"\s+"))).ok()
}

/// Tolerates differing whitespace; the span runs from the first matched
/// token to the last
pub struct WhitespaceNormalized;

impl Matcher for WhitespaceNormalized {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::WhitespaceNormalized
    }

    fn find(&self, region: &str, needle: &str) -> Option<Range<usize>> {
        flexible_whitespace_regex(needle.split_whitespace())?
            .find(region)
            .map(|m| m.range())
    }
}

/// Matches long find texts on their leading part
///
/// The match is extended to the next sentence terminator, or the end of the
/// region, and rejected if it grows past twice the find length.
pub struct PartialPrefix {
    pub min_len: usize,
    pub ratio: f64,
}

impl PartialPrefix {
    fn prefix<'a>(&self, needle: &'a str) -> Option<&'a str> {
        let chars = needle.chars().count();
        if chars < self.min_len {
            return None;
        }
        let keep = (chars as f64 * self.ratio).floor() as usize;
        let end = needle
            .char_indices()
            .nth(keep)
            .map_or(needle.len(), |(i, _)| i);
        let prefix = &needle[..end];

        // Never cut a word in half
        let cut = if needle[end..].starts_with(char::is_whitespace) || end == needle.len() {
            prefix
        } else {
            prefix.rfind(char::is_whitespace).map(|i| &prefix[..i])?
        };
        let cut = cut.trim();
        (!cut.is_empty()).then_some(cut)
    }
}

impl Matcher for PartialPrefix {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::PartialPrefix
    }

    fn find(&self, region: &str, needle: &str) -> Option<Range<usize>> {
        let prefix = self.prefix(needle)?;
        let start_match = flexible_whitespace_regex(prefix.split_whitespace())?.find(region)?;

        let end = SENTENCE_TERMINATOR_RE
            .find_at(region, start_match.end())
            .map_or(region.len(), |m| m.end());

        let span = start_match.start()..end;
        (span.len() <= needle.len() * 2).then_some(span)
    }
}

/// Fuzzy match over windows of as many sentences as the find text has
pub struct Similarity {
    pub threshold: f64,
}

fn comparable(text: &str) -> String {
    utils::normalize_whitespace(&text.to_lowercase())
}

impl Matcher for Similarity {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Similarity
    }

    fn find(&self, region: &str, needle: &str) -> Option<Range<usize>> {
        let target = comparable(needle);
        if target.is_empty() {
            return None;
        }

        let spans = utils::sentence_spans(region);
        if spans.is_empty() {
            return None;
        }
        let size = utils::sentences(needle).len().clamp(1, spans.len());

        spans
            .windows(size)
            .map(|window| window[0].start..window[size - 1].end)
            .map(|span| {
                let score = strsim::normalized_levenshtein(&comparable(&region[span.clone()]), &target);
                (span, score)
            })
            .filter(|(_, score)| *score >= self.threshold)
            // First of the best-scoring windows
            .fold(None, |best: Option<(Range<usize>, f64)>, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            })
            .map(|(span, _)| span)
    }
}

/// The matchers to try for a suggestion kind, in order
pub fn cascade(kind: SuggestionType, config: &MatchConfig) -> Vec<Box<dyn Matcher>> {
    let threshold = if kind.is_short_text() {
        config.short_similarity_threshold
    } else {
        config.similarity_threshold
    };

    vec![
        Box::new(Exact),
        Box::new(CaseInsensitive),
        Box::new(WhitespaceNormalized),
        Box::new(PartialPrefix {
            min_len: config.prefix_min_len,
            ratio: config.prefix_ratio,
        }),
        Box::new(Similarity { threshold }),
    ]
}

/// Locates `needle` in the markup's visible text
///
/// Each matcher is tried against every region before the next, looser one
/// gets a turn. `needle` is plain text; the returned absolute byte range
/// into `markup` covers the encoded form of what matched.
pub fn locate(
    markup: &str,
    needle: &str,
    kind: SuggestionType,
    config: &MatchConfig,
) -> Option<(Range<usize>, MatchStrategy)> {
    if needle.trim().is_empty() {
        return None;
    }
    let regions: Vec<(usize, DecodedRegion)> = text_regions(markup)
        .into_iter()
        .map(|range| (range.start, DecodedRegion::new(&markup[range])))
        .collect();

    for matcher in cascade(kind, config) {
        for (start, region) in &regions {
            if let Some(span) = matcher.find(&region.text, needle) {
                ::log::debug!("Matched find text with {:?}", matcher.strategy());
                let raw = region.raw_range(span);
                return Some((start + raw.start..start + raw.end, matcher.strategy()));
            }
        }
    }

    None
}

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?]+(?:\s+|$)").expect("Failed to compile sentence regex - this is a bug")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[a-zA-Z!][^<>]*>")
        .expect("Failed to compile tag regex - this is a bug")
});

/// Splits text into words, trimming surrounding punctuation
///
/// Tokens without any alphanumeric character (dashes, bullets) are dropped.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Number of words in the text
pub fn word_count(text: &str) -> usize {
    words(text).len()
}

/// Splits text into sentences on terminal punctuation
///
/// Text without terminal punctuation is returned as a single sentence.
pub fn sentences(text: &str) -> Vec<&str> {
    sentence_spans(text).into_iter().map(|r| &text[r]).collect()
}

/// Byte ranges of the sentences in `text`, trimmed of surrounding whitespace
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END_RE.find_iter(text) {
        let span = trimmed(text, start..m.end());
        if word_count(&text[span.clone()]) > 0 {
            result.push(span);
        }
        start = m.end();
    }

    let tail = trimmed(text, start..text.len());
    if word_count(&text[tail.clone()]) > 0 {
        result.push(tail);
    }

    result
}

fn trimmed(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let start = range.start + (slice.len() - slice.trim_start().len());
    let end = range.end - (slice.len() - slice.trim_end().len());
    start..end.max(start)
}

/// Estimates the syllable count of a word by counting vowel groups
pub fn syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let mut count = 0;
    let mut prev_vowel = false;

    for c in lower.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    // silent trailing e ("make", "note") but not "-le" endings ("table")
    if count > 1 && lower.ends_with('e') && !lower.ends_with("le") {
        count -= 1;
    }

    count.max(1)
}

/// Flesch reading ease, denominators floored at 1
pub fn flesch_reading_ease(text: &str) -> f64 {
    let word_list = words(text);
    let word_total = word_list.len().max(1) as f64;
    let sentence_total = sentences(text).len().max(1) as f64;
    let syllable_total: usize = word_list.iter().map(|w| syllables(w)).sum();

    206.835 - 1.015 * (word_total / sentence_total) - 84.6 * (syllable_total as f64 / word_total)
}

/// Removes anything that looks like markup and normalizes whitespace per line
pub fn strip_markup(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    stripped
        .lines()
        .map(normalize_whitespace)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Returns true if the text contains tag-like markup
pub fn contains_markup(text: &str) -> bool {
    TAG_RE.is_match(text)
}

/// Collapses runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates text to at most `max_chars` characters on a word boundary
pub fn truncate_words(text: &str, max_chars: usize) -> String {
    let normalized = normalize_whitespace(text);
    if normalized.chars().count() <= max_chars {
        return normalized;
    }

    let mut result = String::new();
    for word in normalized.split(' ') {
        let extra = if result.is_empty() { 0 } else { 1 };
        if result.chars().count() + extra + word.chars().count() > max_chars {
            break;
        }
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(word);
    }

    if result.is_empty() {
        normalized.chars().take(max_chars).collect()
    } else {
        result
    }
}

/// Rounds to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Linear interpolation of `value` onto `[0, 1]` between `low` and `high`
///
/// `high` may be smaller than `low` for a decreasing ramp.
pub fn ramp(value: f64, low: f64, high: f64) -> f64 {
    if (high - low).abs() < f64::EPSILON {
        return if value >= high { 1.0 } else { 0.0 };
    }
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// Escapes text for use inside a double-quoted HTML attribute
pub fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes text for use as HTML element content
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

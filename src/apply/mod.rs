//! Applies suggestions to markup and reports what happened to each one.

pub mod matchers;

use crate::config::MatchConfig;
use crate::suggestions::Suggestion;
use crate::utils;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static HEAD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("Failed to compile head regex - this is a bug")
});

static HEAD_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</head\s*>").expect("Failed to compile head regex - this is a bug")
});

/// How a suggestion's find text was located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    CaseInsensitive,
    WhitespaceNormalized,
    PartialPrefix,
    Similarity,
    /// A head node inserted without any find text
    HeadInsertion,
}

/// Why a suggestion was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoReplacementText,
    NoFindText,
    MarkupInTextReplacement,
    NoHeadAnchor,
    AlreadyPresent,
    NotFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoReplacementText => "no replacement text",
            SkipReason::NoFindText => "text suggestion has no find text",
            SkipReason::MarkupInTextReplacement => "replacement for find text contains markup",
            SkipReason::NoHeadAnchor => "markup has no <head> to insert into",
            SkipReason::AlreadyPresent => "node is already present",
            SkipReason::NotFound => "find text not found by any matching strategy",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedSuggestion {
    pub suggestion: Suggestion,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSuggestion {
    pub suggestion: Suggestion,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub final_markup: String,
    pub applied_count: usize,
    pub applied_suggestions: Vec<AppliedSuggestion>,
    pub skipped_suggestions: Vec<SkippedSuggestion>,
}

/// Applies suggestions with the default matching thresholds
pub fn apply_suggestions(markup: &str, suggestions: &[Suggestion]) -> ApplicationReport {
    apply_suggestions_with(markup, suggestions, &MatchConfig::default())
}

/// Applies each suggestion in turn to the evolving output
///
/// Find and replace texts are plain text; replacements are escaped on the
/// way in. A suggestion that cannot be applied is recorded as skipped and
/// never aborts the batch.
pub fn apply_suggestions_with(
    markup: &str,
    suggestions: &[Suggestion],
    config: &MatchConfig,
) -> ApplicationReport {
    let mut output = markup.to_string();
    let mut applied_suggestions = Vec::new();
    let mut skipped_suggestions = Vec::new();

    for suggestion in suggestions {
        match apply_one(&output, suggestion, config) {
            Ok((next, strategy)) => {
                output = next;
                applied_suggestions.push(AppliedSuggestion {
                    suggestion: suggestion.clone(),
                    strategy,
                });
            }
            Err(reason) => {
                ::log::debug!("Skipping {:?} suggestion: {}", suggestion.kind, reason);
                skipped_suggestions.push(SkippedSuggestion {
                    suggestion: suggestion.clone(),
                    reason,
                });
            }
        }
    }

    ::log::info!(
        "Applied {} of {} suggestions",
        applied_suggestions.len(),
        suggestions.len()
    );

    ApplicationReport {
        final_markup: output,
        applied_count: applied_suggestions.len(),
        applied_suggestions,
        skipped_suggestions,
    }
}

fn apply_one(
    markup: &str,
    suggestion: &Suggestion,
    config: &MatchConfig,
) -> Result<(String, MatchStrategy), SkipReason> {
    let find = suggestion.exact_replacement.find.as_str();
    let replace = suggestion.exact_replacement.replace.as_str();
    let is_metadata = suggestion.kind.is_metadata();

    if replace.trim().is_empty() {
        return Err(SkipReason::NoReplacementText);
    }
    if find.trim().is_empty() {
        if !is_metadata {
            return Err(SkipReason::NoFindText);
        }
        return insert_into_head(markup, replace).map(|out| (out, MatchStrategy::HeadInsertion));
    }
    // Only head insertions may carry markup
    if utils::contains_markup(replace) {
        return Err(SkipReason::MarkupInTextReplacement);
    }

    let (range, strategy) =
        matchers::locate(markup, find, suggestion.kind, config).ok_or(SkipReason::NotFound)?;

    let replace = utils::escape_text(replace);
    let mut out = String::with_capacity(markup.len() + replace.len());
    out.push_str(&markup[..range.start]);
    out.push_str(&replace);
    out.push_str(&markup[range.end..]);
    Ok((out, strategy))
}

/// Inserts `node` right before `</head>`, or right after `<head>`
fn insert_into_head(markup: &str, node: &str) -> Result<String, SkipReason> {
    let lower = markup.to_ascii_lowercase();
    if lower.contains(&node.to_ascii_lowercase()) {
        return Err(SkipReason::AlreadyPresent);
    }

    let at = HEAD_CLOSE_RE
        .find(markup)
        .map(|m| m.start())
        .or_else(|| HEAD_OPEN_RE.find(markup).map(|m| m.end()))
        .ok_or(SkipReason::NoHeadAnchor)?;

    let mut out = String::with_capacity(markup.len() + node.len());
    out.push_str(&markup[..at]);
    out.push_str(node);
    out.push_str(&markup[at..]);
    Ok(out)
}

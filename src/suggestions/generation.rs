//! Optional text generation for prose rewrites.
//!
//! The engine only builds the prompt and validates what comes back; picking
//! a provider and retrying belong to whoever implements [`TextGenerator`].

use crate::config::GenerationConfig;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const SPLIT_PARAGRAPH_TASK: &str =
    "Rewrite this paragraph as shorter, self-contained sentences without changing its facts.";
pub const CLARIFY_SENTENCE_TASK: &str =
    "Rewrite this sentence to remove filler words while keeping its meaning.";

const MIN_ORIGINAL_CHARS: usize = 10;
const GROWTH_FACTOR: usize = 3;
const GROWTH_ALLOWANCE: usize = 200;
const MIN_ORIGINAL_SIMILARITY: f64 = 0.9;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("text generator failed: {0}")]
    Provider(String),

    #[error("malformed generator output: {0}")]
    Malformed(String),
}

/// Produces text for a prompt (allows plugging in any model provider)
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// The only shape of generator output the engine accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewritePair {
    pub original: String,
    pub improved: String,
}

/// Prompt asking for a JSON `{"original", "improved"}` pair
pub fn rewrite_prompt(task: &str, text: &str) -> String {
    format!(
        "{}\n\
         Respond with a single JSON object and nothing else, of the form \
         {{\"original\": \"<the exact text below>\", \"improved\": \"<your rewrite>\"}}. \
         Do not add HTML.\n\n\
         Text:\n{}",
        task, text
    )
}

/// Removes a surrounding Markdown code fence, with or without a language tag
fn strip_code_fences(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parses and validates generator output
pub fn parse_rewrite(output: &str, config: &GenerationConfig) -> Result<RewritePair, GenerationError> {
    let body = strip_code_fences(output);
    let pair: RewritePair =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let original = pair.original.trim();
    let improved = pair.improved.trim();
    let original_len = original.chars().count();
    let improved_len = improved.chars().count();

    if original.is_empty() || improved.is_empty() {
        return Err(GenerationError::Malformed("empty field".to_string()));
    }
    if original_len < MIN_ORIGINAL_CHARS {
        return Err(GenerationError::Malformed(format!(
            "original shorter than {} characters",
            MIN_ORIGINAL_CHARS
        )));
    }
    if improved_len > config.max_output_chars {
        return Err(GenerationError::Malformed(format!(
            "improved text has {} characters, limit is {}",
            improved_len, config.max_output_chars
        )));
    }
    if improved_len > original_len * GROWTH_FACTOR + GROWTH_ALLOWANCE {
        return Err(GenerationError::Malformed(
            "improved text grew out of proportion".to_string(),
        ));
    }

    Ok(RewritePair {
        original: original.to_string(),
        improved: improved.to_string(),
    })
}

/// Asks the generator for a rewrite of `text`, bounded by the configured timeout
///
/// The returned pair always echoes `text` as its original; a reply that
/// rewrites some other passage is rejected as malformed.
pub async fn request_rewrite(
    generator: &dyn TextGenerator,
    task: &str,
    text: &str,
    config: &GenerationConfig,
) -> Result<RewritePair, GenerationError> {
    let prompt = rewrite_prompt(task, text);
    let timeout = config.timeout();

    let output = tokio::time::timeout(timeout, generator.generate(&prompt))
        .await
        .map_err(|_| GenerationError::Timeout(timeout))??;

    let pair = parse_rewrite(&output, config)?;

    let sent = utils::normalize_whitespace(text);
    let echoed = utils::normalize_whitespace(&pair.original);
    if sent != echoed && strsim::normalized_levenshtein(&sent, &echoed) < MIN_ORIGINAL_SIMILARITY {
        return Err(GenerationError::Malformed(
            "original does not match the requested text".to_string(),
        ));
    }

    Ok(RewritePair {
        original: text.to_string(),
        improved: pair.improved,
    })
}

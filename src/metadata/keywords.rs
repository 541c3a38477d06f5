use crate::config::KeywordConfig;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

const BASE_WEIGHT: f64 = 1.0;
const TITLE_OR_HEADING_BONUS: f64 = 2.0;
const DOMAIN_TERM_BONUS: f64 = 3.0;
const PHRASE_BONUS: f64 = 1.5;
const MAX_NGRAM: usize = 3;

/// English stop words; a stop word breaks an n-gram run
pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing",
        "don't", "down", "during", "each", "even", "every", "few", "for", "from", "further", "get",
        "gets", "got", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
        "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is", "isn't", "it",
        "it's", "its", "itself", "just", "let", "let's", "like", "made", "make", "makes", "many",
        "may", "me", "might", "more", "most", "much", "must", "my", "myself", "need", "new", "no",
        "nor", "not", "now", "of", "off", "often", "on", "once", "one", "only", "or", "other",
        "our", "ours", "ourselves", "out", "over", "own", "really", "same", "see", "she", "should",
        "so", "some", "such", "than", "that", "that's", "the", "their", "theirs", "them",
        "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
        "under", "until", "up", "use", "used", "using", "very", "was", "we", "well", "were",
        "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
        "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// General business and technology vocabulary used when no table is configured
pub static DOMAIN_TERMS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "analytics", "api", "automation", "b2b", "backend", "benchmark", "blockchain", "brand",
        "budget", "cloud", "compliance", "conversion", "crm", "customer", "customers",
        "cybersecurity", "dashboard", "data", "database", "deployment", "devops", "ecommerce",
        "encryption", "engagement", "enterprise", "framework", "frontend", "growth",
        "infrastructure", "integration", "inventory", "kubernetes", "latency", "marketing",
        "metrics", "microservices", "mobile", "optimization", "performance", "platform",
        "pricing", "privacy", "product", "productivity", "revenue", "roi", "saas", "scalability",
        "security", "seo", "server", "software", "startup", "strategy", "subscription",
        "supply", "workflow", "machine learning", "artificial intelligence", "search engine",
        "content marketing", "user experience", "open source", "supply chain", "social media",
        "generative engine", "structured data",
    ]
    .into_iter()
    .collect()
});

/// A keyword phrase and the score it earned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub phrase: String,
    pub score: f64,
}

/// Domain vocabulary, either the built-in table or one injected per vertical
enum DomainTerms {
    Builtin,
    Custom(HashSet<String>),
}

impl DomainTerms {
    fn from_config(config: &KeywordConfig) -> Self {
        match &config.domain_terms {
            Some(terms) => DomainTerms::Custom(
                terms
                    .iter()
                    .map(|t| utils::normalize_whitespace(&t.to_lowercase()))
                    .filter(|t| !t.is_empty())
                    .collect(),
            ),
            None => DomainTerms::Builtin,
        }
    }

    fn contains(&self, term: &str) -> bool {
        match self {
            DomainTerms::Builtin => DOMAIN_TERMS.contains(term),
            DomainTerms::Custom(terms) => terms.contains(term),
        }
    }

    /// The phrase itself or any of its words is a domain term
    fn boosts(&self, phrase: &str) -> bool {
        self.contains(phrase) || phrase.split(' ').any(|w| self.contains(w))
    }
}

#[derive(Default)]
struct Candidate {
    occurrences: usize,
    words: usize,
}

/// Splits a sentence into runs of lowercased content words
///
/// Stop words, short or numeric tokens and clause punctuation end a run.
fn content_runs(sentence: &str) -> Vec<Vec<String>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for raw in sentence.split_whitespace() {
        let token = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        let is_content = token.chars().count() >= 3
            && !token.chars().all(|c| c.is_ascii_digit())
            && !STOP_WORDS.contains(token.as_str());

        if is_content {
            current.push(token);
        } else {
            runs.push(std::mem::take(&mut current));
        }
        if raw.ends_with([',', ';', ':']) {
            runs.push(std::mem::take(&mut current));
        }
    }

    runs.push(current);
    runs.retain(|r| !r.is_empty());
    runs
}

/// Pads a token sequence so phrase lookups respect word boundaries
fn padded_words(text: &str) -> String {
    let words: Vec<String> = utils::words(text).iter().map(|w| w.to_lowercase()).collect();
    format!(" {} ", words.join(" "))
}

/// Scores 1-3 word phrases from the page text
///
/// `emphasis` holds the title and headings; phrases found there earn a bonus.
pub fn score_keywords(text: &str, emphasis: &[&str], config: &KeywordConfig) -> Vec<KeywordScore> {
    let domain = DomainTerms::from_config(config);
    let emphasis: Vec<String> = emphasis.iter().map(|e| padded_words(e)).collect();

    let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();
    for sentence in utils::sentences(text) {
        for run in content_runs(sentence) {
            for n in 1..=MAX_NGRAM {
                for window in run.windows(n) {
                    let entry = candidates.entry(window.join(" ")).or_default();
                    entry.occurrences += 1;
                    entry.words = n;
                }
            }
        }
    }

    let mut scored: Vec<KeywordScore> = candidates
        .into_iter()
        .filter_map(|(phrase, candidate)| {
            let domain_boosted = domain.boosts(&phrase);
            let emphasized = emphasis
                .iter()
                .any(|e| e.contains(&format!(" {} ", phrase)));

            let keep = if candidate.words == 1 {
                domain_boosted
            } else {
                candidate.occurrences >= 2 || emphasized || domain_boosted
            };
            if !keep {
                return None;
            }

            let mut score = BASE_WEIGHT * candidate.occurrences as f64;
            if emphasized {
                score += TITLE_OR_HEADING_BONUS;
            }
            if domain_boosted {
                score += DOMAIN_TERM_BONUS;
            }
            if candidate.words >= 2 {
                score += PHRASE_BONUS;
            }
            Some(KeywordScore { phrase, score })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.phrase.cmp(&b.phrase))
    });
    scored.truncate(config.max_keywords);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_unigrams_are_dropped() {
        let text = "Coffee beans taste great. Coffee beans need roasting.";
        let keywords = score_keywords(text, &[], &KeywordConfig::default());
        let phrases: Vec<&str> = keywords.iter().map(|k| k.phrase.as_str()).collect();
        assert!(phrases.contains(&"coffee beans"));
        assert!(!phrases.contains(&"coffee"));
    }

    #[test]
    fn test_domain_terms_boost_unigrams() {
        let text = "Our analytics dashboard tracks revenue. Analytics matter.";
        let keywords = score_keywords(text, &[], &KeywordConfig::default());
        let analytics = keywords.iter().find(|k| k.phrase == "analytics").unwrap();
        assert_eq!(analytics.score, 2.0 * BASE_WEIGHT + DOMAIN_TERM_BONUS);
        assert!(keywords.iter().any(|k| k.phrase == "revenue"));
    }

    #[test]
    fn test_title_bonus_and_ordering() {
        let text = "Cold brew recipes are simple. Cold brew needs time. Iced tea too.";
        let keywords = score_keywords(text, &["Cold Brew Guide"], &KeywordConfig::default());
        assert_eq!(keywords[0].phrase, "cold brew");
        assert_eq!(
            keywords[0].score,
            2.0 * BASE_WEIGHT + TITLE_OR_HEADING_BONUS + PHRASE_BONUS
        );
        for pair in keywords.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_injected_domain_terms() {
        let config = KeywordConfig {
            domain_terms: Some(vec!["Espresso".to_string()]),
            ..KeywordConfig::default()
        };
        let text = "Espresso shots and analytics.";
        let keywords = score_keywords(text, &[], &config);
        let phrases: Vec<&str> = keywords.iter().map(|k| k.phrase.as_str()).collect();
        assert!(phrases.contains(&"espresso"));
        assert!(!phrases.contains(&"analytics"));
    }

    #[test]
    fn test_cap() {
        let mut text = String::new();
        for i in 0..40 {
            text.push_str(&format!("Topic{} widget{} matters. Topic{} widget{} again. ", i, i, i, i));
        }
        let keywords = score_keywords(&text, &[], &KeywordConfig::default());
        assert_eq!(keywords.len(), 15);
    }

    #[test]
    fn test_stop_words_break_phrases() {
        let text = "Search rankings and search rankings matter for the search rankings team.";
        let keywords = score_keywords(text, &[], &KeywordConfig::default());
        assert!(keywords.iter().any(|k| k.phrase == "search rankings"));
        assert!(!keywords.iter().any(|k| k.phrase.contains("and")));
    }
}

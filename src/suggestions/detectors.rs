use super::{DetectorContext, ExactReplacement, Priority, Suggestion, SuggestionError, SuggestionType};
use crate::metadata::UNTITLED;
use crate::utils::{self, escape_attribute, escape_text};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use url::Url;

pub type DetectorResult = Result<Option<Suggestion>, SuggestionError>;
pub type Detector = fn(&DetectorContext<'_>) -> DetectorResult;

const OVERLONG_PARAGRAPH_WORDS: usize = 160;
const LIST_MIN_WORDS: usize = 150;
const SUBHEADING_MIN_WORDS: usize = 300;
const MIN_SUBHEADINGS: usize = 2;
const TITLE_FALLBACK_CHARS: usize = 60;
const FILLER_PASSES: usize = 3;

/// Detectors in the order their suggestions are reported within a priority
pub const CATALOGUE: &[(&str, Detector)] = &[
    ("missing-h1", missing_h1),
    ("missing-title", missing_title),
    ("missing-description", missing_description),
    ("missing-structured-data", missing_structured_data),
    ("missing-canonical", missing_canonical),
    ("missing-viewport", missing_viewport),
    ("missing-social-tags", missing_social_tags),
    ("overlong-paragraph", overlong_paragraph),
    ("missing-lists", missing_lists),
    ("missing-subheadings", missing_subheadings),
    ("low-information-sentences", low_information_sentence),
    ("keyword-gap", keyword_gap),
];

/// Wordy phrases and what they collapse to
static FILLERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("it is important to note that", ""),
        ("it should be noted that", ""),
        ("needless to say", ""),
        ("at the end of the day", "ultimately"),
        ("in order to", "to"),
        ("due to the fact that", "because"),
        ("at this point in time", "now"),
        ("for all intents and purposes", ""),
        ("basically", ""),
        ("actually", ""),
        ("very", ""),
        ("really", ""),
    ]
    .into_iter()
    .map(|(phrase, replacement)| {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
        let re = Regex::new(&pattern).expect("Failed to compile filler regex - this is a bug");
        (re, replacement)
    })
    .collect()
});

static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+([,.;:!?])").expect("Failed to compile punctuation regex - this is a bug")
});

static LEADING_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s,;:]+").expect("Failed to compile punctuation regex - this is a bug")
});

fn missing_h1(ctx: &DetectorContext<'_>) -> DetectorResult {
    if ctx.features.h1_count() > 0 {
        return Ok(None);
    }

    Ok(Some(
        Suggestion::new(
            SuggestionType::Heading,
            Priority::High,
            "Add a single top-level heading (h1) that names the page topic",
            "Engines use the main heading to decide what question the page answers",
        )
        .with_content("", format!("Suggested heading: {}", proposed_title(ctx))),
    ))
}

/// Best available wording for a title: derived title, else the opening words
fn proposed_title(ctx: &DetectorContext<'_>) -> String {
    if ctx.metadata.title != UNTITLED {
        return ctx.metadata.title.clone();
    }
    utils::truncate_words(&ctx.features.plain_text, TITLE_FALLBACK_CHARS)
}

fn missing_title(ctx: &DetectorContext<'_>) -> DetectorResult {
    let declared = ctx
        .features
        .document_title
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if declared {
        return Ok(None);
    }

    let title = proposed_title(ctx);
    let replacement = if title.is_empty() {
        ExactReplacement::default()
    } else {
        ExactReplacement::insertion(format!("<title>{}</title>", escape_text(&title)))
    };

    Ok(Some(
        Suggestion::new(
            SuggestionType::Title,
            Priority::High,
            "Add a descriptive <title> element",
            "The title is the label engines show when citing the page",
        )
        .with_content("", title)
        .with_replacement(replacement),
    ))
}

fn missing_description(ctx: &DetectorContext<'_>) -> DetectorResult {
    if ctx.features.has_meta("description") {
        return Ok(None);
    }

    let description = &ctx.metadata.description;
    let replacement = if description.is_empty() {
        ExactReplacement::default()
    } else {
        ExactReplacement::insertion(format!(
            r#"<meta name="description" content="{}">"#,
            escape_attribute(description)
        ))
    };

    Ok(Some(
        Suggestion::new(
            SuggestionType::Description,
            Priority::High,
            "Add a meta description summarizing the page in one or two sentences",
            "A declared summary is quoted verbatim far more often than body text",
        )
        .with_content("", description.clone())
        .with_replacement(replacement),
    ))
}

fn missing_structured_data(ctx: &DetectorContext<'_>) -> DetectorResult {
    if !ctx.features.structured_data_blocks.is_empty() {
        return Ok(None);
    }

    let metadata = ctx.metadata;
    let mut article = Map::new();
    article.insert("@context".into(), json!("https://schema.org"));
    article.insert("@type".into(), json!("Article"));
    article.insert("headline".into(), json!(proposed_title(ctx)));
    if !metadata.description.is_empty() {
        article.insert("description".into(), json!(metadata.description));
    }
    article.insert(
        "author".into(),
        json!({ "@type": "Person", "name": metadata.author }),
    );
    if !metadata.publish_date_estimated {
        article.insert(
            "datePublished".into(),
            json!(metadata.publish_date.to_rfc3339()),
        );
    }
    if !metadata.last_modified_estimated {
        article.insert(
            "dateModified".into(),
            json!(metadata.last_modified.to_rfc3339()),
        );
    }
    if !ctx.features.url.is_empty() {
        article.insert("mainEntityOfPage".into(), json!(ctx.features.url));
    }

    // "</" inside a script body would close it early
    let body = serde_json::to_string(&Value::Object(article))?.replace("</", "<\\/");
    let node = format!(r#"<script type="application/ld+json">{}</script>"#, body);

    Ok(Some(
        Suggestion::new(
            SuggestionType::StructuredData,
            Priority::High,
            "Add Article structured data (JSON-LD)",
            "Structured data lets engines read the headline, author and dates without guessing",
        )
        .with_content("", body)
        .with_replacement(ExactReplacement::insertion(node)),
    ))
}

fn missing_canonical(ctx: &DetectorContext<'_>) -> DetectorResult {
    if ctx.features.canonical_url.is_some() || ctx.features.url.is_empty() {
        return Ok(None);
    }

    let mut url = Url::parse(&ctx.features.url)
        .map_err(|_| SuggestionError::InvalidUrl(ctx.features.url.clone()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Ok(None);
    }
    url.set_fragment(None);

    let node = format!(
        r#"<link rel="canonical" href="{}">"#,
        escape_attribute(url.as_str())
    );
    Ok(Some(
        Suggestion::new(
            SuggestionType::Canonical,
            Priority::Medium,
            "Declare the canonical URL",
            "Duplicate URLs split citations unless one address is declared authoritative",
        )
        .with_content("", url.to_string())
        .with_replacement(ExactReplacement::insertion(node)),
    ))
}

fn missing_viewport(ctx: &DetectorContext<'_>) -> DetectorResult {
    if ctx.features.has_viewport() {
        return Ok(None);
    }

    Ok(Some(
        Suggestion::new(
            SuggestionType::Viewport,
            Priority::Medium,
            "Add a responsive viewport meta tag",
            "Pages that are not mobile friendly rank and render worse",
        )
        .with_replacement(ExactReplacement::insertion(
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
        )),
    ))
}

fn missing_social_tags(ctx: &DetectorContext<'_>) -> DetectorResult {
    if ctx.features.has_social_tags() {
        return Ok(None);
    }

    let title = proposed_title(ctx);
    if title.is_empty() {
        return Ok(None);
    }
    let mut node = format!(
        r#"<meta property="og:title" content="{}">"#,
        escape_attribute(&title)
    );
    if !ctx.metadata.description.is_empty() {
        node.push_str(&format!(
            r#"<meta property="og:description" content="{}">"#,
            escape_attribute(&ctx.metadata.description)
        ));
    }

    Ok(Some(
        Suggestion::new(
            SuggestionType::SocialTags,
            Priority::Low,
            "Add Open Graph tags for title and description",
            "Social and preview surfaces fall back to guesses without them",
        )
        .with_replacement(ExactReplacement::insertion(node)),
    ))
}

fn overlong_paragraph(ctx: &DetectorContext<'_>) -> DetectorResult {
    let Some(paragraph) = ctx
        .features
        .paragraphs
        .iter()
        .find(|p| utils::word_count(p) > OVERLONG_PARAGRAPH_WORDS)
    else {
        return Ok(None);
    };

    Ok(Some(
        Suggestion::new(
            SuggestionType::Paragraph,
            Priority::Medium,
            "Split this paragraph into shorter, single-idea paragraphs",
            "Short paragraphs are easier to lift as self-contained answers",
        )
        .with_content(
            paragraph.clone(),
            format!(
                "Break the {} words into paragraphs of at most {} words each",
                utils::word_count(paragraph),
                OVERLONG_PARAGRAPH_WORDS
            ),
        ),
    ))
}

fn missing_lists(ctx: &DetectorContext<'_>) -> DetectorResult {
    if !ctx.features.lists.is_empty() || ctx.metadata.word_count < LIST_MIN_WORDS {
        return Ok(None);
    }

    Ok(Some(
        Suggestion::new(
            SuggestionType::Lists,
            Priority::Medium,
            "Present steps, options or key facts as a bulleted or numbered list",
            "Lists are extracted and quoted as ready-made answers",
        )
        .with_content("", "Convert enumerations in the body text into an <ul> or <ol>"),
    ))
}

fn missing_subheadings(ctx: &DetectorContext<'_>) -> DetectorResult {
    if ctx.features.subheading_count() >= MIN_SUBHEADINGS
        || ctx.metadata.word_count < SUBHEADING_MIN_WORDS
    {
        return Ok(None);
    }

    Ok(Some(
        Suggestion::new(
            SuggestionType::Subheadings,
            Priority::Medium,
            "Break the content into sections with descriptive sub-headings",
            "Sub-headings mark the passages engines retrieve for specific questions",
        )
        .with_content(
            "",
            format!("Add at least {} h2/h3 sub-headings", MIN_SUBHEADINGS),
        ),
    ))
}

/// Removes filler phrases and tidies the spacing they leave behind
///
/// Text without fillers comes back unchanged.
pub fn strip_fillers(sentence: &str) -> String {
    if !FILLERS.iter().any(|(re, _)| re.is_match(sentence)) {
        return sentence.to_string();
    }

    let mut text = sentence.to_string();
    for _ in 0..FILLER_PASSES {
        let before = text.clone();
        for (re, replacement) in FILLERS.iter() {
            text = re.replace_all(&text, *replacement).into_owned();
        }
        text = utils::normalize_whitespace(&text);
        if text == before {
            break;
        }
    }

    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1");
    let text = LEADING_PUNCT_RE.replace(&text, "");
    if sentence.starts_with(char::is_uppercase) {
        capitalize_first(&text)
    } else {
        text.into_owned()
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn low_information_sentence(ctx: &DetectorContext<'_>) -> DetectorResult {
    let found = ctx
        .features
        .paragraphs
        .iter()
        .flat_map(|p| utils::sentences(p))
        .find_map(|sentence| {
            let cleaned = strip_fillers(sentence);
            let changed = cleaned != sentence && utils::word_count(&cleaned) > 0;
            changed.then(|| (sentence.to_string(), cleaned))
        });

    let Some((sentence, cleaned)) = found else {
        return Ok(None);
    };

    Ok(Some(
        Suggestion::new(
            SuggestionType::Clarity,
            Priority::Medium,
            "Cut filler words from this sentence",
            "Dense, direct sentences are more likely to be quoted",
        )
        .with_content(sentence.clone(), cleaned.clone())
        .with_replacement(ExactReplacement::new(sentence, cleaned)),
    ))
}

fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn keyword_gap(ctx: &DetectorContext<'_>) -> DetectorResult {
    let Some(keyword) = ctx.metadata.keywords.first() else {
        return Ok(None);
    };
    let Some(title) = ctx.features.document_title.as_deref() else {
        return Ok(None);
    };
    let title = utils::normalize_whitespace(title);
    if title.is_empty() || title.to_lowercase().contains(keyword.as_str()) {
        return Ok(None);
    }

    let improved = format!("{} | {}", title, title_case(keyword));
    Ok(Some(
        Suggestion::new(
            SuggestionType::Keywords,
            Priority::Low,
            "Work the page's main keyword into the title",
            "Titles that carry the topic phrase match more queries",
        )
        .with_content(title.clone(), improved.clone())
        .with_replacement(ExactReplacement::new(title, improved)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::metadata::{self, Metadata};
    use crate::parsers::{self, PageFeatures};
    use crate::results::PageData;
    use chrono::{TimeZone, Utc};

    fn run(detector: Detector, url: &str, markup: &str) -> DetectorResult {
        let config = EngineConfig::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let features: PageFeatures = parsers::extract(&PageData::new(url, markup));
        let metadata: Metadata = metadata::derive(&features, &config, now);
        let ctx = DetectorContext {
            features: &features,
            metadata: &metadata,
            config: &config,
        };
        detector(&ctx)
    }

    fn detect(detector: Detector, markup: &str) -> Option<Suggestion> {
        run(detector, "https://example.com/guide#intro", markup).unwrap()
    }

    #[test]
    fn test_missing_h1_is_advisory() {
        let suggestion = detect(missing_h1, "<body><h2>Sub</h2><p>x</p></body>").unwrap();
        assert!(suggestion.exact_replacement.is_advisory());
        assert!(detect(missing_h1, "<body><h1>Main</h1></body>").is_none());
    }

    #[test]
    fn test_title_insertion_escapes_text() {
        let suggestion = detect(missing_title, "<body><h1>Salt & Pepper</h1></body>").unwrap();
        assert_eq!(suggestion.exact_replacement.find, "");
        assert_eq!(
            suggestion.exact_replacement.replace,
            "<title>Salt &amp; Pepper</title>"
        );
    }

    #[test]
    fn test_description_insertion_from_first_paragraph() {
        let suggestion = detect(
            missing_description,
            r#"<body><p>Brew with "cold" water.</p></body>"#,
        )
        .unwrap();
        assert_eq!(
            suggestion.exact_replacement.replace,
            r#"<meta name="description" content="Brew with &quot;cold&quot; water.">"#
        );
    }

    #[test]
    fn test_structured_data_is_valid_json_ld() {
        let suggestion = detect(
            missing_structured_data,
            r#"<head><meta name="author" content="Ada"></head><body><h1>Guide</h1><p>Body text</script> here.</p></body>"#,
        )
        .unwrap();
        let replace = &suggestion.exact_replacement.replace;
        assert!(replace.starts_with(r#"<script type="application/ld+json">"#));
        assert_eq!(replace.matches("</script>").count(), 1);

        let value: Value = serde_json::from_str(&suggestion.current_content).unwrap();
        assert_eq!(value["@type"], "Article");
        assert_eq!(value["headline"], "Guide");
        assert_eq!(value["author"]["name"], "Ada");
        assert!(value.get("datePublished").is_none());
    }

    #[test]
    fn test_canonical_drops_fragment_and_rejects_bad_urls() {
        let suggestion = detect(missing_canonical, "<p>x</p>").unwrap();
        assert_eq!(
            suggestion.exact_replacement.replace,
            r#"<link rel="canonical" href="https://example.com/guide">"#
        );

        let err = run(missing_canonical, "not a url", "<p>x</p>");
        assert!(matches!(err, Err(SuggestionError::InvalidUrl(_))));
    }

    #[test]
    fn test_length_gated_detectors() {
        let short = format!("<body><p>{}</p></body>", "word ".repeat(100));
        assert!(detect(missing_lists, &short).is_none());
        assert!(detect(missing_subheadings, &short).is_none());

        let long = format!("<body><p>{}</p></body>", "word ".repeat(320));
        assert!(detect(missing_lists, &long).is_some());
        assert!(detect(missing_subheadings, &long).is_some());
        let paragraph = detect(overlong_paragraph, &long).unwrap();
        assert!(paragraph.exact_replacement.is_advisory());
    }

    #[test]
    fn test_strip_fillers() {
        assert_eq!(
            strip_fillers("In order to brew, it is very important to note that water matters."),
            "To brew, water matters."
        );
        assert_eq!(
            strip_fillers("Basically, the grind is really coarse."),
            "The grind is coarse."
        );
        assert_eq!(strip_fillers("Nothing to cut here."), "Nothing to cut here.");
    }

    #[test]
    fn test_strip_fillers_keeps_lowercase_openings() {
        assert_eq!(
            strip_fillers("iPhone sales grew fast in spring."),
            "iPhone sales grew fast in spring."
        );
        assert_eq!(strip_fillers("iPhone sales really grew."), "iPhone sales grew.");
        assert!(
            detect(
                low_information_sentence,
                "<body><p>Phones sold well. iPhone sales grew fast in spring.</p></body>",
            )
            .is_none()
        );
    }

    #[test]
    fn test_low_information_sentence_uses_real_text() {
        let suggestion = detect(
            low_information_sentence,
            "<body><p>Grind coarsely. We really need cold water.</p></body>",
        )
        .unwrap();
        assert_eq!(suggestion.exact_replacement.find, "We really need cold water.");
        assert_eq!(suggestion.exact_replacement.replace, "We need cold water.");
    }

    #[test]
    fn test_keyword_gap_extends_existing_title() {
        let markup = "<head><title>Weekend Notes</title></head><body><p>Cold brew takes time. Cold brew is smooth.</p></body>";
        let suggestion = detect(keyword_gap, markup).unwrap();
        assert_eq!(suggestion.exact_replacement.find, "Weekend Notes");
        assert_eq!(
            suggestion.exact_replacement.replace,
            "Weekend Notes | Cold Brew"
        );

        let covered = "<head><title>Cold Brew Notes</title></head><body><p>Cold brew takes time. Cold brew is smooth.</p></body>";
        assert!(detect(keyword_gap, covered).is_none());
    }
}

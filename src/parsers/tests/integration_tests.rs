use crate::parsers::{ParserType, extract};
use crate::results::PageData;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_parser_type() {
        let types = [
            ("<html><body><p>Hi</p></body></html>", ParserType::Html),
            ("Plain <b>bold</b> fragment", ParserType::Html),
            ("<!-- just a comment -->", ParserType::Html),
            ("Line 1\nLine 2", ParserType::Text),
            ("a < b and c > d", ParserType::Text),
            ("", ParserType::Text),
        ];

        for (content, expected_type) in types {
            assert_eq!(
                ParserType::detect(content),
                expected_type,
                "Content '{}' should be parsed as {:?}",
                content,
                expected_type
            );
        }
    }

    #[test]
    fn test_extract_html_page() {
        let page = PageData::new(
            "https://example.com/page",
            "<html><body><h1>Title</h1><p>Hello, world!</p><a href=\"https://other.org/\">Link</a></body></html>",
        );
        let features = extract(&page);
        assert_eq!(features.url, "https://example.com/page");
        assert_eq!(features.raw_markup, page.raw_markup);
        assert_eq!(features.plain_text, "Title\n\nHello, world!\nLink");
        assert_eq!(features.paragraphs, vec!["Hello, world!"]);
        assert_eq!(features.external_links().count(), 1);
    }

    #[test]
    fn test_extract_plain_text_page_falls_back_to_blocks() {
        let page = PageData::new("https://example.org/file.txt", "Paragraph 1.\n\n\n\nParagraph 2.");
        let features = extract(&page);
        assert_eq!(features.plain_text, "Paragraph 1.\n\nParagraph 2.");
        assert_eq!(features.paragraphs, vec!["Paragraph 1.", "Paragraph 2."]);
        assert_eq!(features.paragraph_citations, vec![0, 0]);
        assert!(features.headings.is_empty());
        assert!(features.links.is_empty());
    }

    #[test]
    fn test_div_only_markup_uses_text_blocks() {
        let page = PageData::new(
            "https://example.com/",
            "<div>First block of text.</div><div>Second block of text.</div>",
        );
        let features = extract(&page);
        assert_eq!(
            features.paragraphs,
            vec!["First block of text.", "Second block of text."]
        );
    }

    #[test]
    fn test_supplied_plain_text_is_sanitized_and_wins() {
        let page = PageData::new("https://example.com/", "<p>From markup.</p>")
            .with_plain_text("From <b>the</b>   crawler.");
        let features = extract(&page);
        assert_eq!(features.plain_text, "From the crawler.");
        assert!(!crate::utils::contains_markup(&features.plain_text));
        assert_eq!(features.paragraphs, vec!["From markup."]);
    }

    #[test]
    fn test_malformed_markup_never_fails() {
        for markup in ["<", "<html><body><p>unclosed", "<<<>>>", "<div><span></div></p>"] {
            let features = extract(&PageData::new("not a url", markup));
            assert!(!crate::utils::contains_markup(&features.plain_text));
            assert_eq!(features.paragraphs.len(), features.paragraph_citations.len());
        }
    }

    #[test]
    fn test_features_serialize_without_raw_markup() {
        let features = extract(&PageData::new("https://example.com/", "<p>Hi</p>"));
        let json = serde_json::to_value(&features).unwrap();
        assert!(json.get("raw_markup").is_none());
        assert_eq!(json["plain_text"], "Hi");
    }
}

use crate::parsers::text;

#[cfg(test)]
mod basic_tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(text::parse(""), "");
        assert!(text::paragraph_blocks("").is_empty());
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(text::parse("   \n   \t   \r\n   "), "");
        assert!(text::paragraph_blocks("  \n\t ").is_empty());
    }

    #[test]
    fn test_single_line() {
        assert_eq!(text::parse("Hello, world!"), "Hello, world!");
    }

    #[test]
    fn test_lines_are_kept() {
        assert_eq!(text::parse("Line 1\nLine 2\nLine 3"), "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn test_mixed_whitespace() {
        let input = "  Line 1  \n\n  Line 2  \t\r\n  Line 3  ";
        assert_eq!(text::parse(input), "Line 1\n\nLine 2\nLine 3");
    }

    #[test]
    fn test_multiple_spaces_between_words() {
        assert_eq!(text::parse("Word1    Word2\t\tWord3"), "Word1 Word2 Word3");
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        let input = "\n\nParagraph 1.\n\n\n\nParagraph 2.\n\n\n";
        assert_eq!(text::parse(input), "Paragraph 1.\n\nParagraph 2.");
    }
}

#[cfg(test)]
mod paragraph_tests {
    use super::*;

    #[test]
    fn test_blank_line_blocks_preferred() {
        let input = "First line\ncontinues here.\n\nSecond block.";
        assert_eq!(
            text::paragraph_blocks(input),
            vec!["First line continues here.", "Second block."]
        );
    }

    #[test]
    fn test_falls_back_to_lines() {
        let input = "One.\nTwo.\nThree.";
        assert_eq!(text::paragraph_blocks(input), vec!["One.", "Two.", "Three."]);
    }

    #[test]
    fn test_falls_back_to_whole_text() {
        assert_eq!(
            text::paragraph_blocks("  a single   block of text "),
            vec!["a single block of text"]
        );
    }

    #[test]
    fn test_line_blocks_skip_empty_lines() {
        assert_eq!(text::line_blocks("a\n\n  \nb"), vec!["a", "b"]);
    }

    #[test]
    fn test_long_text() {
        let block = "Lorem ipsum dolor sit amet. ".repeat(50);
        let input = format!("{}\n\n{}", block, block);
        let paragraphs = text::paragraph_blocks(&input);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0], block.trim());
    }
}

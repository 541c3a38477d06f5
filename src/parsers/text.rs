use crate::utils::normalize_whitespace;

/// Normalizes plain text while keeping its block structure
///
/// - Collapses whitespace within each line
/// - Collapses runs of blank lines into a single blank line
/// - Trims leading and trailing blank lines
pub fn parse(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in text.lines() {
        let normalized = normalize_whitespace(line);
        if normalized.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(normalized);
            previous_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Splits text into paragraphs, falling back through coarser strategies
///
/// Blank-line blocks are preferred, then individual lines, then the whole
/// text as one block. Non-empty text always yields at least one paragraph.
pub fn paragraph_blocks(text: &str) -> Vec<String> {
    let blocks = blank_line_blocks(text);
    if blocks.len() > 1 {
        return blocks;
    }

    let lines = line_blocks(text);
    if lines.len() > 1 {
        return lines;
    }

    let whole = normalize_whitespace(text);
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole]
    }
}

/// Splits text into blocks separated by empty lines
pub fn blank_line_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                blocks.push(normalize_whitespace(&current.join(" ")));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        blocks.push(normalize_whitespace(&current.join(" ")));
    }

    blocks
}

/// Splits text into one block per non-empty line
pub fn line_blocks(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_whitespace)
        .filter(|l| !l.is_empty())
        .collect()
}

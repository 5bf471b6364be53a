//! Pure splitter functions for the chunking cascade
//!
//! Each splitter partitions its input into `(offset, part)` units; offsets
//! are byte positions relative to the input. Units cover all non-whitespace
//! content, so concatenating them in order loses only separator whitespace.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+\S").expect("heading regex"));

static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-{3,}|={3,}|\*{3,})\s*$").expect("rule regex"));

/// Whether a line is a markdown-style heading
pub fn is_heading_line(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

/// Whether a line is a horizontal rule separator
pub fn is_rule_line(line: &str) -> bool {
    RULE_RE.is_match(line)
}

/// Whether the text carries structural separators (headings or rule lines)
pub fn has_structural_separators(text: &str) -> bool {
    text.lines().any(|l| is_heading_line(l) || is_rule_line(l))
}

/// Whether the text carries blank-line paragraph breaks
pub fn has_paragraph_breaks(text: &str) -> bool {
    static BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("blank regex"));
    BLANK_RE.is_match(text)
}

/// Iterate lines with their byte offsets, newline included in the slice
fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let end = text[start..]
            .find('\n')
            .map(|p| start + p + 1)
            .unwrap_or(text.len());
        lines.push((start, &text[start..end]));
        start = end;
    }
    lines
}

/// Split on structural separators: heading lines, rule lines, and runs of
/// three or more newlines, in that priority order
pub fn split_sections(text: &str) -> Vec<(usize, &str)> {
    let lines = lines_with_offsets(text);
    let mut sections: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut blank_run = 0usize;

    for (off, line) in lines {
        let end = off + line.len();
        let is_blank = line.trim().is_empty();
        // A heading or rule line opens a new section; so does a gap of
        // two or more blank lines (three or more newlines).
        let opens = is_heading_line(line) || is_rule_line(line) || (blank_run >= 2 && !is_blank);
        blank_run = if is_blank { blank_run + 1 } else { 0 };

        match current {
            Some((start, _)) if opens => {
                sections.push((start, off));
                current = Some((off, end));
            }
            Some((start, _)) => current = Some((start, end)),
            None => current = Some((off, end)),
        }
    }
    if let Some(span) = current {
        sections.push(span);
    }

    sections
        .into_iter()
        .map(|(s, e)| (s, &text[s..e]))
        .filter(|(_, part)| !part.trim().is_empty())
        .collect()
}

/// Split on blank-line paragraph boundaries
pub fn split_paragraphs(text: &str) -> Vec<(usize, &str)> {
    let mut paragraphs: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (off, line) in lines_with_offsets(text) {
        let end = off + line.len();
        if line.trim().is_empty() {
            if let Some(span) = current.take() {
                paragraphs.push(span);
            }
        } else {
            current = match current {
                Some((start, _)) => Some((start, end)),
                None => Some((off, end)),
            };
        }
    }
    if let Some(span) = current {
        paragraphs.push(span);
    }

    paragraphs
        .into_iter()
        .map(|(s, e)| (s, &text[s..e]))
        .collect()
}

/// Split on sentence boundaries
pub fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    text.split_sentence_bound_indices().collect()
}

/// Split after clause punctuation (`,`, `;`, `:`) followed by whitespace
pub fn split_phrases(text: &str) -> Vec<(usize, &str)> {
    let mut phrases = Vec::new();
    let mut start = 0usize;
    let mut prev_delim = false;

    for (idx, ch) in text.char_indices() {
        if prev_delim && ch.is_whitespace() {
            phrases.push((start, &text[start..idx]));
            start = idx;
        }
        prev_delim = matches!(ch, ',' | ';' | ':');
    }
    if start < text.len() {
        phrases.push((start, &text[start..]));
    }
    phrases
}

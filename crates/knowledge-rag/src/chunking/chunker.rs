//! Chunking engine: single-document shortcut, fallback cascade, fixed
//! windows, and the small-fragment merge pass

use std::collections::HashMap;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkStrategy, FormatHint};

use super::splitters::{
    has_paragraph_breaks, has_structural_separators, split_paragraphs, split_phrases,
    split_sections, split_sentences,
};

/// Ordered fallback chain: each splitter handles units the previous one
/// could not reduce below the target size
const CASCADE: [(ChunkStrategy, fn(&str) -> Vec<(usize, &str)>); 4] = [
    (ChunkStrategy::Semantic, split_sections),
    (ChunkStrategy::Paragraph, split_paragraphs),
    (ChunkStrategy::Sentence, split_sentences),
    (ChunkStrategy::Phrase, split_phrases),
];

/// Chunking options
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    /// Strategy; None auto-detects from the text
    pub strategy: Option<ChunkStrategy>,
    /// Target chunk size in characters
    pub target_size: usize,
    /// Window overlap (fixed strategy only)
    pub overlap: usize,
    /// Minimum chunk size; smaller fragments merge into neighbors
    pub min_size: usize,
    /// Maximum chunk size; also the single-chunk shortcut threshold
    pub max_size: usize,
    /// Format hint for auto-detection
    pub format_hint: Option<FormatHint>,
    /// Category stamped onto every chunk
    pub category: String,
    /// Source id stamped onto every chunk
    pub source_id: String,
    /// Digest of the source document
    pub document_hash: String,
    /// Extra metadata stamped onto every chunk
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChunkOptions {
    /// Options from a chunking config, with no stamping context yet
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            strategy: None,
            target_size: config.target_size,
            overlap: config.overlap,
            min_size: config.min_chunk_size,
            max_size: config.max_chunk_size,
            format_hint: None,
            category: String::new(),
            source_id: String::new(),
            document_hash: String::new(),
            metadata: HashMap::new(),
        }
    }

    /// Set the strategy
    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the source id
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Set the document digest
    pub fn with_document_hash(mut self, hash: impl Into<String>) -> Self {
        self.document_hash = hash.into();
        self
    }

    /// Set the format hint
    pub fn with_format_hint(mut self, hint: FormatHint) -> Self {
        self.format_hint = Some(hint);
        self
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

/// Pick a strategy for the given text
///
/// Shorter than the target size means a single chunk; structural separators
/// select semantic splitting; blank-line breaks select paragraph splitting;
/// structured data gets fixed windows; anything else falls back to sentences.
pub fn detect_strategy(
    text: &str,
    hint: Option<FormatHint>,
    target_size: usize,
) -> ChunkStrategy {
    let trimmed = text.trim();
    if trimmed.len() < target_size {
        return ChunkStrategy::Single;
    }
    if has_structural_separators(trimmed) {
        return ChunkStrategy::Semantic;
    }
    if has_paragraph_breaks(trimmed) {
        return ChunkStrategy::Paragraph;
    }
    if hint == Some(FormatHint::StructuredData) {
        return ChunkStrategy::Fixed;
    }
    ChunkStrategy::Sentence
}

/// Segment text into a bounded sequence of chunks
///
/// Empty or whitespace-only input yields an empty sequence; this function
/// never fails. A document no longer than `max_size` yields exactly one
/// chunk tagged `single`. Chunks from a cascade run stay within
/// `[min_size, target_size]` except last-resort atomic units with no
/// remaining split points.
pub fn chunk(text: &str, opts: &ChunkOptions) -> Vec<Chunk> {
    let Some((doc_start, doc_end)) = trimmed_span(text, 0, text.len()) else {
        return Vec::new();
    };

    // Single-document shortcut
    if doc_end - doc_start <= opts.max_size {
        return emit(text, vec![(doc_start, doc_end)], ChunkStrategy::Single, opts);
    }

    let strategy = opts
        .strategy
        .unwrap_or_else(|| detect_strategy(text, opts.format_hint, opts.target_size));

    let body = &text[doc_start..doc_end];
    let mut spans = Vec::new();
    match strategy {
        ChunkStrategy::Fixed => {
            fixed_spans(body, doc_start, opts.target_size, opts.overlap, &mut spans)
        }
        ChunkStrategy::Semantic => cascade_spans(body, doc_start, 0, opts.target_size, &mut spans),
        ChunkStrategy::Paragraph => cascade_spans(body, doc_start, 1, opts.target_size, &mut spans),
        ChunkStrategy::Sentence => cascade_spans(body, doc_start, 2, opts.target_size, &mut spans),
        ChunkStrategy::Phrase => cascade_spans(body, doc_start, 3, opts.target_size, &mut spans),
        // Requested explicitly on an oversized document: honor it as one
        // chunk, the caller asked for no segmentation.
        ChunkStrategy::Single | ChunkStrategy::Ai => spans.push((doc_start, doc_end)),
    }

    let spans = merge_small_spans(spans, opts.min_size, opts.target_size, opts.max_size);
    emit(text, spans, strategy, opts)
}

/// Apply the splitter cascade to one unit of text
///
/// `base` is the unit's byte offset in the source document. Recursion depth
/// is bounded by the cascade length; an unreducible unit at the last level
/// is emitted as-is.
fn cascade_spans(
    text: &str,
    base: usize,
    level: usize,
    target: usize,
    out: &mut Vec<(usize, usize)>,
) {
    let (_, splitter) = CASCADE[level];
    let mut buffer: Option<(usize, usize)> = None;

    for (off, part) in splitter(text) {
        if part.trim().is_empty() {
            continue;
        }
        let start = base + off;
        let end = start + part.len();

        if part.len() > target {
            if let Some(span) = buffer.take() {
                out.push(span);
            }
            if level + 1 < CASCADE.len() {
                cascade_spans(part, start, level + 1, target, out);
            } else {
                // Last resort: an atomic unit with no further split points
                // is emitted as-is, even over the size bound.
                out.push((start, end));
            }
            continue;
        }

        buffer = match buffer {
            Some((buf_start, _)) if end - buf_start <= target => Some((buf_start, end)),
            Some(full) => {
                out.push(full);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }

    if let Some(span) = buffer {
        out.push(span);
    }
}

/// Sliding fixed-size windows snapped back to word boundaries
fn fixed_spans(
    text: &str,
    base: usize,
    target: usize,
    overlap: usize,
    out: &mut Vec<(usize, usize)>,
) {
    let len = text.len();
    let mut start = 0usize;

    while start < len {
        let mut end = (start + target).min(len);
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end < len {
            // Snap back to the nearest word boundary inside the window
            if let Some(pos) = text[start..end].rfind(char::is_whitespace) {
                if pos > 0 {
                    end = start + pos;
                }
            }
        }
        if end <= start {
            // No usable boundary: hard cut at the next char boundary
            end = (start + target).min(len);
            while end < len && !text.is_char_boundary(end) {
                end += 1;
            }
        }
        out.push((base + start, base + end));
        if end >= len {
            break;
        }
        let mut next = end.saturating_sub(overlap).max(start + 1);
        while next < len && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }
}

/// Coalesce adjacent fragments below the minimum size into a neighbor
fn merge_small_spans(
    spans: Vec<(usize, usize)>,
    min_size: usize,
    target: usize,
    max_size: usize,
) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            let last_len = last.1 - last.0;
            let span_len = span.1 - span.0;
            let combined = span.1 - last.0;
            let undersized = span_len < min_size || last_len < min_size;
            // Merging an undersized trailing fragment may exceed the target,
            // but never the hard max.
            if undersized && (combined <= target || (span_len < min_size && combined <= max_size))
            {
                last.1 = span.1;
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

/// Shrink a span to exclude leading/trailing whitespace; None when empty
fn trimmed_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some((start + lead, start + lead + trimmed.len()))
}

/// Materialize spans into stamped chunks
fn emit(
    text: &str,
    spans: Vec<(usize, usize)>,
    strategy: ChunkStrategy,
    opts: &ChunkOptions,
) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        let Some((s, e)) = trimmed_span(text, start, end) else {
            continue;
        };
        let mut chunk = Chunk::new(text[s..e].to_string(), s, e, strategy);
        chunk.category = opts.category.clone();
        chunk.source_id = opts.source_id.clone();
        chunk.metadata = opts.metadata.clone();
        if !opts.document_hash.is_empty() {
            chunk.metadata.insert(
                "document_hash".to_string(),
                serde_json::json!(opts.document_hash),
            );
        }
        chunks.push(chunk);
    }
    chunks
}

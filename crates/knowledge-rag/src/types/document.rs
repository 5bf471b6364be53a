//! Document and chunk types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Chunking strategy, as a closed variant set
///
/// The fallback cascade runs Semantic → Paragraph → Sentence → Phrase on
/// oversized units. `Fixed` is an independent sliding-window strategy,
/// `Single` tags the whole-document shortcut, and `Ai` tags chunks supplied
/// verbatim by an enhancer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    Semantic,
    Paragraph,
    Sentence,
    Phrase,
    Fixed,
    Single,
    Ai,
}

impl ChunkStrategy {
    /// Stable lowercase name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Paragraph => "paragraph",
            Self::Sentence => "sentence",
            Self::Phrase => "phrase",
            Self::Fixed => "fixed",
            Self::Single => "single",
            Self::Ai => "ai",
        }
    }
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format hint for strategy auto-detection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FormatHint {
    /// Ordinary prose
    Prose,
    /// Serialized structured data with no exploitable text structure
    StructuredData,
}

/// A loaded document, ready for chunking
///
/// Produced by the external loader; immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Normalized text content
    pub content: String,
    /// Loader-supplied metadata (title, origin, format, ...)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Content-derived digest, used for dedup and chunk back-reference
    pub content_hash: String,
}

impl Document {
    /// Create a document, deriving the content hash
    pub fn new(content: String, metadata: HashMap<String, serde_json::Value>) -> Self {
        let content_hash = content_digest(&content);
        Self {
            content,
            metadata,
            content_hash,
        }
    }
}

/// Hex SHA-256 of lower-cased, trimmed text
///
/// Identical normalized text always yields the identical digest, independent
/// of the run that produced it.
pub fn content_digest(text: &str) -> String {
    let normalized = text.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// A bounded text fragment produced by segmenting a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,
    /// Digest of the normalized chunk text
    pub hash: String,
    /// Character span in the source document
    pub char_start: usize,
    pub char_end: usize,
    /// Strategy that produced this chunk
    pub strategy: ChunkStrategy,
    /// Category tag (scopes TTL policy and retrieval filtering)
    pub category: String,
    /// Identifier of the source this chunk came from
    pub source_id: String,
    /// Time-to-live in milliseconds; None = indefinite retention
    pub ttl_ms: Option<u64>,
    /// Caller-supplied metadata (document hash, title, ...)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    /// Create a chunk, deriving the text hash
    pub fn new(text: String, char_start: usize, char_end: usize, strategy: ChunkStrategy) -> Self {
        let hash = content_digest(&text);
        Self {
            text,
            hash,
            char_start,
            char_end,
            strategy,
            category: String::new(),
            source_id: String::new(),
            ttl_ms: None,
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_ignores_case_and_outer_whitespace() {
        assert_eq!(content_digest("  Hello World "), content_digest("hello world"));
        assert_ne!(content_digest("hello world"), content_digest("hello worlds"));
    }

    #[test]
    fn strategy_round_trips_through_serde() {
        let json = serde_json::to_string(&ChunkStrategy::Semantic).unwrap();
        assert_eq!(json, "\"semantic\"");
        let back: ChunkStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ChunkStrategy::Semantic);
    }
}

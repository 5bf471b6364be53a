//! Vector index trait: embedding plus storage behind one boundary

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Chunk;

/// Outcome of a batched upsert
///
/// Upserts never raise; per-item failures come back in `errors` and
/// `inserted` counts the items that were accepted.
#[derive(Debug, Clone, Default)]
pub struct UpsertReceipt {
    /// Chunks accepted by the index
    pub inserted: usize,
    /// Per-item error messages
    pub errors: Vec<String>,
}

/// Similarity-search filter
#[derive(Debug, Clone)]
pub struct SearchFilter {
    /// Restrict to one category; None searches the whole index
    pub category: Option<String>,
    /// Maximum rows returned
    pub limit: usize,
    /// Minimum similarity score
    pub threshold: f32,
}

/// One similarity-search row
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (0.0-1.0, higher is more similar)
    pub score: f32,
}

/// Trait for embedding-backed vector storage and similarity search
///
/// Implementations embed chunk and query text themselves; this core never
/// sees an embedding vector.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store a batch of chunks, reporting failures in-band
    async fn upsert_batch(&self, chunks: &[Chunk]) -> UpsertReceipt;

    /// Similarity search over indexed chunks
    async fn search(&self, query: &str, filter: &SearchFilter) -> Result<Vec<ScoredChunk>>;

    /// Drop every chunk tagged with the given source id, returning the count
    async fn invalidate_by_source(&self, source_id: &str) -> Result<usize>;

    /// Whether the index can accept reads and writes
    ///
    /// Gates both ingestion and retrieval entry points.
    async fn is_ready(&self) -> bool;

    /// Index name for logging
    fn name(&self) -> &str;
}

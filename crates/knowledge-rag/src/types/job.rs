//! Ingestion job inputs and reports

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use super::document::{ChunkStrategy, FormatHint};

/// Where a document's bytes come from
#[derive(Debug, Clone)]
pub enum SourcePayload {
    /// Load from a filesystem path
    Path(PathBuf),
    /// Load from an in-memory buffer
    Buffer(Vec<u8>),
}

/// One unit of ingestion work
#[derive(Debug, Clone)]
pub struct DocumentSource {
    /// Display name (file name or caller-chosen label)
    pub name: String,
    /// Document bytes or their location
    pub payload: SourcePayload,
    /// Category override; falls back to ingest options, then path inference
    pub category: Option<String>,
    /// Source identifier override; falls back to the name
    pub source_id: Option<String>,
    /// Submission index, so callers can re-sort completion-ordered results
    pub ordinal: usize,
}

impl DocumentSource {
    /// Source backed by a filesystem path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            name,
            payload: SourcePayload::Path(path),
            category: None,
            source_id: None,
            ordinal: 0,
        }
    }

    /// Source backed by an in-memory buffer
    pub fn from_buffer(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload: SourcePayload::Buffer(data),
            category: None,
            source_id: None,
            ordinal: 0,
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the source identifier
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Set the submission ordinal
    pub fn with_ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = ordinal;
        self
    }
}

/// Per-ingest options
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Chunking strategy; None = auto-detect
    pub strategy: Option<ChunkStrategy>,
    /// Category applied when the source does not carry one
    pub category: Option<String>,
    /// Format hint for strategy auto-detection
    pub format_hint: Option<FormatHint>,
    /// Target chunk size override
    pub target_size: Option<usize>,
    /// Chunk overlap override (fixed-window strategy only)
    pub overlap: Option<usize>,
    /// Run the enhancer when one is configured (default follows config)
    pub enhance: Option<bool>,
    /// Extra metadata stamped onto every chunk
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Chunk counters for one ingested document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChunkCounts {
    /// Chunks produced by segmentation
    pub total: usize,
    /// Chunks accepted by the vector index
    pub inserted: usize,
}

/// Outcome of ingesting one document
///
/// All failure modes fold into this report; ingestion of one document never
/// raises past its own boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// True when at least one chunk was inserted
    pub ok: bool,
    /// Job identifier
    pub job_id: Uuid,
    /// Source display name
    pub source: String,
    /// Submission ordinal of the source
    pub ordinal: usize,
    /// Strategy used for segmentation, when segmentation ran
    pub strategy: Option<ChunkStrategy>,
    /// Chunk counters
    pub chunks: ChunkCounts,
    /// Accumulated per-stage and per-batch errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Wall-clock duration of the document's pipeline
    pub duration_ms: u64,
}

impl IngestReport {
    /// Report for a document that failed before any chunk was inserted
    pub fn failure(
        job_id: Uuid,
        source: &DocumentSource,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            ok: false,
            job_id,
            source: source.name.clone(),
            ordinal: source.ordinal,
            strategy: None,
            chunks: ChunkCounts::default(),
            errors: vec![error.into()],
            duration_ms,
        }
    }
}

/// Outcome of a batch ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// True when no document failed
    pub ok: bool,
    /// Documents with at least one inserted chunk
    pub succeeded: usize,
    /// Documents that produced nothing
    pub failed: usize,
    /// Per-document reports, in completion order
    pub results: Vec<IngestReport>,
}

impl BatchReport {
    /// Aggregate per-document reports into a batch report
    pub fn from_results(results: Vec<IngestReport>) -> Self {
        let succeeded = results.iter().filter(|r| r.ok).count();
        let failed = results.len() - succeeded;
        Self {
            ok: failed == 0,
            succeeded,
            failed,
            results,
        }
    }
}

//! Optional LLM-backed document enhancement

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Document;

/// Options passed through to the enhancer
#[derive(Debug, Clone, Default)]
pub struct EnhanceOptions {
    /// Preferred chunk size for AI-assisted chunking
    pub target_chunk_size: Option<usize>,
}

/// Enhancer output
///
/// All fields are optional; when `chunks` is present the pipeline uses them
/// verbatim instead of running the chunker.
#[derive(Debug, Clone, Default)]
pub struct Enhancement {
    /// Pre-computed chunk texts
    pub chunks: Option<Vec<String>>,
    /// Document summary
    pub summary: Option<String>,
    /// Extracted entities
    pub entities: Vec<String>,
}

/// Trait for AI-assisted document enhancement
///
/// A failing enhancer never aborts ingestion: the pipeline logs the failure
/// and falls back to plain chunking.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Enhance a document (AI chunking, summarization, entity extraction)
    async fn enhance(&self, document: &Document, opts: &EnhanceOptions) -> Result<Enhancement>;

    /// Enhancer name for logging
    fn name(&self) -> &str;
}

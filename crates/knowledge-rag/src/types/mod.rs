//! Core data types

pub mod document;
pub mod job;
pub mod search;

pub use document::{content_digest, Chunk, ChunkStrategy, Document, FormatHint};
pub use job::{
    BatchReport, ChunkCounts, DocumentSource, IngestOptions, IngestReport, SourcePayload,
};
pub use search::{ContextOptions, ContextReason, RetrievedContext, SearchOptions, SearchResult};

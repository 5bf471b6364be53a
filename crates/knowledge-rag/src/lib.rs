//! knowledge-rag: document ingestion and retrieval core for RAG systems
//!
//! Turns heterogeneous source documents into searchable, ranked knowledge
//! fragments, and turns a user query into a bounded, relevance-filtered
//! context string. Chunking runs a cascading strategy fallback with size
//! invariants; batch ingestion runs under a bounded concurrency cap with
//! per-category expiry policy and partial-failure isolation; retrieval fans
//! out across categories and assembles a budget-bounded context.
//!
//! Format parsing, embedding generation and vector storage live behind the
//! traits in [`providers`]; this crate never performs that I/O itself.

pub mod chunking;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{CategoryPolicy, DirectoryOptions, IngestionPipeline};
pub use retrieval::RetrievalEngine;
pub use types::{
    BatchReport, Chunk, ChunkStrategy, ContextReason, Document, DocumentSource, IngestOptions,
    IngestReport, RetrievedContext, SearchResult,
};

//! Ingestion pipeline: load, optional enhancement, chunking, and batched
//! upserts under a bounded concurrency cap

mod pipeline;
mod policy;

pub use pipeline::{DirectoryOptions, Health, IngestionPipeline, StatsSnapshot};
pub use policy::CategoryPolicy;

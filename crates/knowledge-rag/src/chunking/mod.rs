//! Text segmentation: strategy cascade, fixed windows, and auto-detection

mod chunker;
mod splitters;

pub use chunker::{chunk, detect_strategy, ChunkOptions};

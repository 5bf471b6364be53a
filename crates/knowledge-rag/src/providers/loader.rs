//! Document loader trait for turning raw sources into normalized text

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::types::Document;

/// Options passed through to the loader
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Extra metadata merged into the loaded document's metadata
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Trait for loading and normalizing source documents
///
/// Implementations own format detection, parsing and size limits; they raise
/// on unsupported types, oversize input, and parse failures. A load failure
/// is fatal only to that document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load a document from a filesystem path
    async fn load(&self, path: &Path, opts: &LoadOptions) -> Result<Document>;

    /// Load a document from an in-memory buffer
    async fn load_from_buffer(
        &self,
        data: &[u8],
        file_name: &str,
        opts: &LoadOptions,
    ) -> Result<Document>;

    /// Whether this loader can handle the given path
    ///
    /// Drives the file filter during directory ingestion.
    fn supports(&self, path: &Path) -> bool;

    /// Loader name for logging
    fn name(&self) -> &str;
}

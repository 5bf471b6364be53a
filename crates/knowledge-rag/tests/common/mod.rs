//! Mock collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use knowledge_rag::error::{Error, Result};
use knowledge_rag::providers::{
    DocumentLoader, EnhanceOptions, Enhancement, Enhancer, LoadOptions, ScoredChunk, SearchFilter,
    UpsertReceipt, VectorIndex,
};
use knowledge_rag::types::{Chunk, ChunkStrategy, Document};

/// UTF-8 loader with injectable failures and an in-flight counter
#[derive(Default)]
pub struct MockLoader {
    /// Any file name containing one of these substrings fails to load
    pub fail_names: Vec<String>,
    /// Artificial per-load delay, to observe the concurrency cap
    pub delay_ms: u64,
    pub load_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockLoader {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DocumentLoader for MockLoader {
    async fn load(&self, path: &Path, opts: &LoadOptions) -> Result<Document> {
        let data = std::fs::read(path)
            .map_err(|e| Error::load(path.display().to_string(), e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.load_from_buffer(&data, &name, opts).await
    }

    async fn load_from_buffer(
        &self,
        data: &[u8],
        file_name: &str,
        _opts: &LoadOptions,
    ) -> Result<Document> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_names.iter().any(|f| file_name.contains(f)) {
            return Err(Error::load(file_name, "simulated load failure"));
        }

        let content = String::from_utf8(data.to_vec())
            .map_err(|e| Error::load(file_name, e.to_string()))?;
        let mut metadata = HashMap::new();
        metadata.insert("title".to_string(), serde_json::json!(file_name));
        Ok(Document::new(content, metadata))
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("txt")
        )
    }

    fn name(&self) -> &str {
        "mock-loader"
    }
}

/// Enhancer behavior selector
pub enum EnhancerMode {
    /// Always fails; the pipeline must fall back to the chunker
    Fail,
    /// Returns these chunk texts
    Chunks(Vec<String>),
    /// Returns a summary but no chunks
    SummaryOnly,
}

pub struct MockEnhancer {
    pub mode: EnhancerMode,
    pub calls: AtomicUsize,
}

impl MockEnhancer {
    pub fn new(mode: EnhancerMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Enhancer for MockEnhancer {
    async fn enhance(&self, _document: &Document, _opts: &EnhanceOptions) -> Result<Enhancement> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            EnhancerMode::Fail => Err(Error::enhancement("simulated enhancer outage")),
            EnhancerMode::Chunks(texts) => Ok(Enhancement {
                chunks: Some(texts.clone()),
                ..Default::default()
            }),
            EnhancerMode::SummaryOnly => Ok(Enhancement {
                summary: Some("a summary".to_string()),
                ..Default::default()
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-enhancer"
    }
}

/// In-memory vector index scoring by lexical overlap
///
/// Verbatim containment of the query scores 0.95; otherwise the score is the
/// fraction of significant query words present in the chunk, scaled to 0.7.
pub struct MemoryIndex {
    ready: AtomicBool,
    pub chunks: Mutex<Vec<Chunk>>,
    /// Reject the last chunk of every multi-chunk upsert batch
    pub partial_upsert: AtomicBool,
    /// Categories whose searches fail
    pub fail_categories: Mutex<Vec<String>>,
    pub search_calls: AtomicUsize,
    pub searched_categories: Mutex<Vec<Option<String>>>,
}

impl MemoryIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            chunks: Mutex::new(Vec::new()),
            partial_upsert: AtomicBool::new(false),
            fail_categories: Mutex::new(Vec::new()),
            search_calls: AtomicUsize::new(0),
            searched_categories: Mutex::new(Vec::new()),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn fail_category(&self, category: &str) {
        self.fail_categories.lock().push(category.to_string());
    }

    /// Seed a chunk directly, bypassing ingestion
    pub fn seed(&self, text: &str, category: &str, source_id: &str) {
        let mut chunk = Chunk::new(text.to_string(), 0, text.len(), ChunkStrategy::Single);
        chunk.category = category.to_string();
        chunk.source_id = source_id.to_string();
        self.chunks.lock().push(chunk);
    }

    fn score(chunk_text: &str, query: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let text_lower = chunk_text.to_lowercase();
        if text_lower.contains(&query_lower) {
            return 0.95;
        }
        let query_words: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .collect();
        if query_words.is_empty() {
            return 0.0;
        }
        let hits = query_words
            .iter()
            .filter(|w| text_lower.contains(*w))
            .count();
        0.7 * hits as f32 / query_words.len() as f32
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert_batch(&self, chunks: &[Chunk]) -> UpsertReceipt {
        let mut receipt = UpsertReceipt::default();
        let reject_last = self.partial_upsert.load(Ordering::SeqCst) && chunks.len() > 1;
        let mut stored = self.chunks.lock();
        for (i, chunk) in chunks.iter().enumerate() {
            if reject_last && i == chunks.len() - 1 {
                receipt
                    .errors
                    .push(format!("simulated upsert failure for chunk {}", chunk.hash));
            } else {
                stored.push(chunk.clone());
                receipt.inserted += 1;
            }
        }
        receipt
    }

    async fn search(&self, query: &str, filter: &SearchFilter) -> Result<Vec<ScoredChunk>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.searched_categories.lock().push(filter.category.clone());

        if let Some(category) = &filter.category {
            if self.fail_categories.lock().contains(category) {
                return Err(Error::index(format!(
                    "simulated backend outage for '{}'",
                    category
                )));
            }
        }

        let mut rows: Vec<ScoredChunk> = self
            .chunks
            .lock()
            .iter()
            .filter(|c| {
                filter
                    .category
                    .as_ref()
                    .map(|cat| &c.category == cat)
                    .unwrap_or(true)
            })
            .map(|c| ScoredChunk {
                chunk: c.clone(),
                score: Self::score(&c.text, query),
            })
            .filter(|r| r.score >= filter.threshold)
            .collect();
        rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        rows.truncate(filter.limit);
        Ok(rows)
    }

    async fn invalidate_by_source(&self, source_id: &str) -> Result<usize> {
        let mut stored = self.chunks.lock();
        let before = stored.len();
        stored.retain(|c| c.source_id != source_id);
        Ok(before - stored.len())
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "memory-index"
    }
}

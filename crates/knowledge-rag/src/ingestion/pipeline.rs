//! Ingestion orchestrator: per-document pipeline stages and bounded
//! concurrency batch processing

use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunking::{chunk, detect_strategy, ChunkOptions};
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{DocumentLoader, EnhanceOptions, Enhancer, LoadOptions, VectorIndex};
use crate::types::{
    BatchReport, Chunk, ChunkCounts, ChunkStrategy, Document, DocumentSource, IngestOptions,
    IngestReport, SourcePayload,
};

use super::policy::CategoryPolicy;

/// Category applied when neither the source, the options, nor path inference
/// supply one
const DEFAULT_CATEGORY: &str = "general";

/// Options for directory ingestion
#[derive(Debug, Clone)]
pub struct DirectoryOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Category for every file; None infers per file from its path
    pub category: Option<String>,
    /// Source id stamped on every file's chunks
    pub source_id: Option<String>,
    /// Drop previously indexed chunks for `source_id` before ingesting
    pub invalidate_previous: bool,
    /// Per-document ingest options
    pub ingest: IngestOptions,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            category: None,
            source_id: None,
            invalidate_previous: false,
            ingest: IngestOptions::default(),
        }
    }
}

/// Aggregate counters shared across concurrent document tasks
#[derive(Default)]
struct IngestionStats {
    documents: AtomicU64,
    chunks_inserted: AtomicU64,
    errors: AtomicU64,
    by_category: DashMap<String, u64>,
}

/// Point-in-time view of the pipeline counters
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Documents that completed ingestion with at least one inserted chunk
    pub documents: u64,
    /// Chunks accepted by the vector index
    pub chunks_inserted: u64,
    /// Documents that failed outright
    pub errors: u64,
    /// Inserted chunk counts per category
    pub by_category: HashMap<String, u64>,
}

/// Pipeline health summary
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    /// Whether the vector index accepts reads and writes
    pub index_ready: bool,
    pub documents: u64,
    pub chunks_inserted: u64,
    pub errors: u64,
}

/// Document ingestion orchestrator
///
/// Owns its collaborators and its stats; tests can instantiate isolated
/// pipelines with mock providers.
pub struct IngestionPipeline {
    loader: Arc<dyn DocumentLoader>,
    enhancer: Option<Arc<dyn Enhancer>>,
    index: Arc<dyn VectorIndex>,
    policy: CategoryPolicy,
    config: RagConfig,
    max_concurrent: usize,
    stats: IngestionStats,
}

impl IngestionPipeline {
    /// Create a pipeline from a config and its collaborators
    pub fn new(
        config: RagConfig,
        loader: Arc<dyn DocumentLoader>,
        enhancer: Option<Arc<dyn Enhancer>>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let max_concurrent = config.processing.effective_concurrency();
        let policy = CategoryPolicy::new(config.categories.clone());
        tracing::info!(
            "Ingestion pipeline configured: {} documents in flight, batch size {}",
            max_concurrent,
            config.processing.batch_size
        );
        Self {
            loader,
            enhancer,
            index,
            policy,
            config,
            max_concurrent,
            stats: IngestionStats::default(),
        }
    }

    /// The pipeline's category policy
    pub fn policy(&self) -> &CategoryPolicy {
        &self.policy
    }

    /// Ingest a single document
    ///
    /// Every failure mode folds into the returned report; this method never
    /// raises past the document's boundary.
    pub async fn ingest_document(
        &self,
        source: DocumentSource,
        opts: &IngestOptions,
    ) -> IngestReport {
        let started = Instant::now();
        let job_id = Uuid::new_v4();

        if !self.index.is_ready().await {
            tracing::warn!("[{}] Vector index not ready, skipping ingestion", source.name);
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            return IngestReport::failure(
                job_id,
                &source,
                Error::IndexUnavailable.to_string(),
                elapsed_ms(started),
            );
        }

        // Stage 1: load
        let document = match self.load(&source).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("[{}] Load failed: {}", source.name, e);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                return IngestReport::failure(job_id, &source, e.to_string(), elapsed_ms(started));
            }
        };

        let category = source
            .category
            .clone()
            .or_else(|| opts.category.clone())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let source_id = source
            .source_id
            .clone()
            .unwrap_or_else(|| source.name.clone());

        // Stages 2-3: enhancement with chunker fallback, or plain chunking
        let (mut chunks, strategy) = self
            .segment(&document, &source.name, opts, &category, &source_id)
            .await;

        if chunks.is_empty() {
            tracing::warn!("[{}] No chunks generated from document", source.name);
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            let mut report = IngestReport::failure(
                job_id,
                &source,
                "no chunks generated from document",
                elapsed_ms(started),
            );
            report.strategy = Some(strategy);
            return report;
        }
        let total = chunks.len();

        // Stage 4: TTL resolution
        let ttl_ms = self.policy.ttl_ms(&category);
        for chunk in &mut chunks {
            chunk.ttl_ms = ttl_ms;
        }

        // Stage 5: batched upserts, errors collected in-band
        let batch_size = self.config.processing.batch_size;
        let mut inserted = 0usize;
        let mut errors = Vec::new();
        for batch in chunks.chunks(batch_size) {
            let receipt = self.index.upsert_batch(batch).await;
            inserted += receipt.inserted;
            errors.extend(receipt.errors);
        }

        let ok = inserted > 0;
        if ok {
            self.stats.documents.fetch_add(1, Ordering::Relaxed);
            self.stats
                .chunks_inserted
                .fetch_add(inserted as u64, Ordering::Relaxed);
            *self.stats.by_category.entry(category.clone()).or_insert(0) += inserted as u64;
        } else {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
        }

        let duration_ms = elapsed_ms(started);
        tracing::info!(
            "[{}] Ingested: {}/{} chunks ({} strategy, category '{}', {}ms)",
            source.name,
            inserted,
            total,
            strategy,
            category,
            duration_ms
        );

        IngestReport {
            ok,
            job_id,
            source: source.name,
            ordinal: source.ordinal,
            strategy: Some(strategy),
            chunks: ChunkCounts { total, inserted },
            errors,
            duration_ms,
        }
    }

    /// Ingest many documents under the concurrency cap
    ///
    /// At most `max_concurrent` documents are in flight; one document's
    /// failure never cancels its siblings. Results arrive in completion
    /// order; re-sort by `ordinal` when submission order matters.
    pub async fn ingest_batch(
        &self,
        sources: Vec<DocumentSource>,
        opts: &IngestOptions,
    ) -> BatchReport {
        let total = sources.len();
        tracing::info!(
            "Batch ingestion: {} documents, {} in flight",
            total,
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks: FuturesUnordered<_> = sources
            .into_iter()
            .map(|source| {
                let semaphore = semaphore.clone();
                async move {
                    let _permit = semaphore.acquire().await.unwrap();
                    self.ingest_document(source, opts).await
                }
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        while let Some(report) = tasks.next().await {
            if !report.ok {
                tracing::warn!("[{}] Document failed: {:?}", report.source, report.errors);
            }
            results.push(report);
        }

        let batch = BatchReport::from_results(results);
        tracing::info!(
            "Batch complete: {} succeeded, {} failed",
            batch.succeeded,
            batch.failed
        );
        batch
    }

    /// Ingest all supported files under a directory
    pub async fn ingest_directory(
        &self,
        path: &Path,
        opts: &DirectoryOptions,
    ) -> Result<BatchReport> {
        if !path.is_dir() {
            return Err(Error::load(
                path.display().to_string(),
                "not a directory",
            ));
        }

        if opts.invalidate_previous {
            if let Some(source_id) = &opts.source_id {
                let dropped = self.reindex_source(source_id).await?;
                tracing::info!(
                    "Invalidated {} chunks for source '{}' before re-ingestion",
                    dropped,
                    source_id
                );
            }
        }

        let mut walker = WalkDir::new(path);
        if !opts.recursive {
            walker = walker.max_depth(1);
        }

        let mut sources = Vec::new();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_path = entry.path();
            if !self.loader.supports(file_path) {
                tracing::debug!("Skipping unsupported file: {}", file_path.display());
                continue;
            }
            let category = opts
                .category
                .clone()
                .or_else(|| self.policy.infer_from_path(file_path));
            let mut source = DocumentSource::from_path(file_path).with_ordinal(sources.len());
            source.category = category;
            if let Some(id) = &opts.source_id {
                source = source.with_source_id(id.clone());
            }
            sources.push(source);
        }

        if sources.is_empty() {
            tracing::warn!("No supported files under {}", path.display());
        }

        Ok(self.ingest_batch(sources, &opts.ingest).await)
    }

    /// Drop all indexed chunks tagged with a source id
    ///
    /// Invalidate-only: the caller must re-submit source documents.
    pub async fn reindex_source(&self, source_id: &str) -> Result<usize> {
        if !self.index.is_ready().await {
            return Err(Error::IndexUnavailable);
        }
        let invalidated = self.index.invalidate_by_source(source_id).await?;
        tracing::info!(
            "Invalidated {} chunks for source '{}'",
            invalidated,
            source_id
        );
        Ok(invalidated)
    }

    /// Snapshot of the aggregate counters
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            documents: self.stats.documents.load(Ordering::Relaxed),
            chunks_inserted: self.stats.chunks_inserted.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
            by_category: self
                .stats
                .by_category
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
        }
    }

    /// Health summary, including index readiness
    pub async fn health(&self) -> Health {
        let snapshot = self.stats();
        Health {
            index_ready: self.index.is_ready().await,
            documents: snapshot.documents,
            chunks_inserted: snapshot.chunks_inserted,
            errors: snapshot.errors,
        }
    }

    async fn load(&self, source: &DocumentSource) -> Result<Document> {
        let opts = LoadOptions::default();
        match &source.payload {
            SourcePayload::Path(path) => self.loader.load(path, &opts).await,
            SourcePayload::Buffer(data) => {
                self.loader.load_from_buffer(data, &source.name, &opts).await
            }
        }
    }

    /// Produce chunks via the enhancer when configured, falling back to the
    /// chunker; the fallback never aborts the pipeline
    async fn segment(
        &self,
        document: &Document,
        source_name: &str,
        opts: &IngestOptions,
        category: &str,
        source_id: &str,
    ) -> (Vec<Chunk>, ChunkStrategy) {
        let enhance = opts.enhance.unwrap_or(self.config.processing.enhance);
        if enhance {
            if let Some(enhancer) = &self.enhancer {
                let enhance_opts = EnhanceOptions {
                    target_chunk_size: Some(
                        opts.target_size.unwrap_or(self.config.chunking.target_size),
                    ),
                };
                match enhancer.enhance(document, &enhance_opts).await {
                    Ok(enhancement) => {
                        if let Some(texts) = enhancement.chunks {
                            if !texts.is_empty() {
                                tracing::debug!(
                                    "[{}] Using {} enhancer-supplied chunks",
                                    source_name,
                                    texts.len()
                                );
                                let chunks = self.adopt_enhanced_chunks(
                                    texts, document, opts, category, source_id,
                                );
                                return (chunks, ChunkStrategy::Ai);
                            }
                        }
                        // Enhancement without chunks (summary/entities only):
                        // chunking still runs below.
                    }
                    Err(e) => {
                        tracing::warn!(
                            "[{}] Enhancement failed, falling back to chunker: {}",
                            source_name,
                            e
                        );
                    }
                }
            }
        }

        let mut chunk_opts = ChunkOptions::from_config(&self.config.chunking);
        if let Some(target) = opts.target_size {
            chunk_opts.target_size = target;
        }
        if let Some(overlap) = opts.overlap {
            chunk_opts.overlap = overlap;
        }
        chunk_opts.strategy = opts.strategy;
        chunk_opts.format_hint = opts.format_hint;
        chunk_opts.category = category.to_string();
        chunk_opts.source_id = source_id.to_string();
        chunk_opts.document_hash = document.content_hash.clone();
        chunk_opts.metadata = merged_metadata(document, opts);

        let strategy = chunk_opts.strategy.unwrap_or_else(|| {
            detect_strategy(
                &document.content,
                chunk_opts.format_hint,
                chunk_opts.target_size,
            )
        });
        chunk_opts.strategy = Some(strategy);

        let chunks = chunk(&document.content, &chunk_opts);
        // The single-document shortcut overrides the requested strategy tag
        let strategy = chunks
            .first()
            .map(|c| c.strategy)
            .unwrap_or(strategy);
        (chunks, strategy)
    }

    /// Wrap enhancer-supplied chunk texts verbatim
    fn adopt_enhanced_chunks(
        &self,
        texts: Vec<String>,
        document: &Document,
        opts: &IngestOptions,
        category: &str,
        source_id: &str,
    ) -> Vec<Chunk> {
        let metadata = merged_metadata(document, opts);
        let mut offset = 0usize;
        texts
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .map(|text| {
                let start = offset;
                offset += text.len();
                let mut chunk = Chunk::new(text, start, offset, ChunkStrategy::Ai);
                chunk.category = category.to_string();
                chunk.source_id = source_id.to_string();
                chunk.metadata = metadata.clone();
                chunk.metadata.insert(
                    "document_hash".to_string(),
                    serde_json::json!(document.content_hash),
                );
                chunk
            })
            .collect()
    }
}

fn merged_metadata(
    document: &Document,
    opts: &IngestOptions,
) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::new();
    if let Some(title) = document.metadata.get("title") {
        metadata.insert("title".to_string(), title.clone());
    }
    metadata.extend(opts.metadata.clone());
    metadata
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

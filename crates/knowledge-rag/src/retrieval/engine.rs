//! Multi-category retrieval with ranking, thresholding and context assembly

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::config::{RagConfig, RetrievalConfig};
use crate::error::{Error, Result};
use crate::ingestion::CategoryPolicy;
use crate::providers::{ScoredChunk, SearchFilter, VectorIndex};
use crate::types::{ContextOptions, RetrievedContext, SearchOptions, SearchResult};

use super::cache::{CacheStats, ContextCache};

/// Separator between assembled context blocks
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Appended exactly once when the context exceeds its character budget
const TRUNCATION_MARKER: &str = "\n[context truncated]";

/// Greetings, acknowledgements and farewells that never need retrieval
static TRIVIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(hi|hiya|hey|hello|howdy|yo|sup|thanks( a lot)?|thank you( (so|very) much)?|thx|ty|ok|okay|sure|yes|yeah|yep|no|nope|bye|goodbye|good ?night|see (you|ya)( later)?|cool|nice|great|lol)[\s.!?]*$",
    )
    .expect("trivial-query regex")
});

/// Query-facing retrieval engine
///
/// Owns its query cache; tests can instantiate isolated engines. Never
/// raises from `generate_context`: the caller is on a user-facing response
/// path, so failures degrade to a reason-coded empty result.
pub struct RetrievalEngine {
    index: Arc<dyn VectorIndex>,
    policy: CategoryPolicy,
    config: RetrievalConfig,
    cache: ContextCache,
}

impl RetrievalEngine {
    /// Create an engine from a config and a vector index
    pub fn new(config: &RagConfig, index: Arc<dyn VectorIndex>) -> Self {
        let retrieval = config.retrieval.clone();
        let cache = ContextCache::new(retrieval.cache_ttl_secs, retrieval.cache_max_entries);
        Self {
            index,
            policy: CategoryPolicy::new(config.categories.clone()),
            config: retrieval,
            cache,
        }
    }

    /// Single-category similarity search
    pub async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchResult>> {
        if !self.index.is_ready().await {
            return Err(Error::IndexUnavailable);
        }
        let threshold = opts.threshold.unwrap_or(self.config.threshold);
        let filter = SearchFilter {
            category: opts.category.clone(),
            limit: opts.limit.unwrap_or(self.config.search_limit),
            threshold,
        };
        let rows = self
            .index
            .search(query, &filter)
            .await
            .map_err(|e| Error::search(e.to_string()))?;
        Ok(rows
            .into_iter()
            .filter(|r| r.score >= threshold)
            .map(to_search_result)
            .collect())
    }

    /// Retrieve and assemble a length-bounded context for a query
    pub async fn generate_context(&self, query: &str, opts: &ContextOptions) -> RetrievedContext {
        let trimmed = query.trim();

        // Gate trivial inputs before touching the store
        if Self::is_trivial(trimmed) {
            tracing::debug!("Skipping retrieval for trivial input");
            return RetrievedContext::not_needed();
        }

        if let Some(cached) = self.cache.get(trimmed) {
            return cached;
        }

        if !self.index.is_ready().await {
            tracing::warn!("Vector index not ready; retrieval disabled");
            return RetrievedContext::disabled();
        }

        let max_chunks = opts.max_chunks.unwrap_or(self.config.max_chunks).max(1);
        let threshold = opts.threshold.unwrap_or(self.config.threshold);

        // Category selection: keyword routing, else the priority list
        let categories = opts
            .categories
            .clone()
            .unwrap_or_else(|| self.policy.route_query(trimmed));
        let categories = if categories.is_empty() {
            self.config.priority_categories.clone()
        } else {
            categories
        };
        let targets: Vec<Option<String>> = if categories.is_empty() {
            vec![None]
        } else {
            categories.into_iter().map(Some).collect()
        };

        // Over-fetch so the global re-rank can still fill max_chunks
        let per_category = max_chunks.div_ceil(targets.len()) + 1;

        let searches = targets.into_iter().map(|category| {
            let filter = SearchFilter {
                category: category.clone(),
                limit: per_category,
                threshold,
            };
            async move { (category, self.index.search(trimmed, &filter).await) }
        });
        let outcomes = futures::future::join_all(searches).await;

        let mut merged: Vec<ScoredChunk> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        for (category, outcome) in outcomes {
            let label = category.unwrap_or_else(|| "all".to_string());
            match outcome {
                Ok(rows) => merged.extend(rows.into_iter().filter(|r| r.score >= threshold)),
                Err(e) => {
                    tracing::warn!("Search failed for category '{}': {}", label, e);
                    failures.push(format!("{}: {}", label, e));
                }
            }
        }

        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        merged.truncate(max_chunks);

        if merged.is_empty() {
            return if failures.is_empty() {
                RetrievedContext::no_matches()
            } else {
                RetrievedContext::failed(failures.join("; "))
            };
        }

        let max_len = opts
            .max_context_length
            .unwrap_or(self.config.max_context_length);
        let (context, sources) = assemble(&merged, max_len);
        tracing::debug!(
            "Assembled context: {} chunks, {} chars, {} sources",
            merged.len(),
            context.len(),
            sources.len()
        );

        let result = RetrievedContext::assembled(context, sources, merged.len());
        self.cache.put(trimmed, result.clone());
        result
    }

    /// Query cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Whether an input is too trivial to warrant retrieval
    fn is_trivial(query: &str) -> bool {
        query.chars().count() < 5 || TRIVIAL_RE.is_match(query)
    }
}

/// Reshape a store row into a search result
fn to_search_result(row: ScoredChunk) -> SearchResult {
    let source = source_title(&row);
    SearchResult {
        text: row.chunk.text,
        score: row.score,
        category: row.chunk.category,
        source,
        metadata: row.chunk.metadata,
    }
}

fn source_title(row: &ScoredChunk) -> String {
    row.chunk
        .metadata
        .get("title")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| row.chunk.source_id.clone())
}

/// Join results into labeled blocks under a hard character budget
fn assemble(results: &[ScoredChunk], max_len: usize) -> (String, Vec<String>) {
    let mut sources: Vec<String> = Vec::new();
    let mut blocks = Vec::with_capacity(results.len());
    for row in results {
        let title = source_title(row);
        if !sources.contains(&title) {
            sources.push(title.clone());
        }
        blocks.push(format!(
            "[{} | {}]\n{}",
            title, row.chunk.category, row.chunk.text
        ));
    }

    let mut context = blocks.join(CONTEXT_SEPARATOR);
    if context.len() > max_len {
        let budget = max_len.saturating_sub(TRUNCATION_MARKER.len());
        let mut cut = budget;
        while cut > 0 && !context.is_char_boundary(cut) {
            cut -= 1;
        }
        context.truncate(cut);
        context.push_str(TRUNCATION_MARKER);
    }
    (context, sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkStrategy};

    fn row(text: &str, score: f32, category: &str, source_id: &str) -> ScoredChunk {
        let mut chunk = Chunk::new(text.to_string(), 0, text.len(), ChunkStrategy::Single);
        chunk.category = category.to_string();
        chunk.source_id = source_id.to_string();
        ScoredChunk { chunk, score }
    }

    #[test]
    fn trivial_inputs_are_gated() {
        assert!(RetrievalEngine::is_trivial("ok"));
        assert!(RetrievalEngine::is_trivial("hi"));
        assert!(RetrievalEngine::is_trivial("thanks!"));
        assert!(RetrievalEngine::is_trivial("good night"));
        assert!(!RetrievalEngine::is_trivial("what are your opening hours?"));
        assert!(!RetrievalEngine::is_trivial("menu prices"));
    }

    #[test]
    fn assemble_labels_blocks_and_orders_sources() {
        let rows = vec![
            row("Espresso 3.50", 0.9, "menu", "menu.md"),
            row("Refunds within 30 days", 0.8, "policy", "policy.md"),
        ];
        let (context, sources) = assemble(&rows, 10_000);
        assert!(context.starts_with("[menu.md | menu]\nEspresso 3.50"));
        assert!(context.contains(CONTEXT_SEPARATOR));
        assert_eq!(sources, vec!["menu.md", "policy.md"]);
    }

    #[test]
    fn assemble_truncates_once_at_the_budget() {
        let rows = vec![row(&"long text ".repeat(100), 0.9, "menu", "menu.md")];
        let max_len = 200;
        let (context, _) = assemble(&rows, max_len);
        assert!(context.len() <= max_len);
        assert!(context.ends_with(TRUNCATION_MARKER));
        assert_eq!(context.matches(TRUNCATION_MARKER).count(), 1);
    }

    #[test]
    fn assemble_under_budget_is_untouched() {
        let rows = vec![row("short", 0.9, "faq", "faq.md")];
        let (context, _) = assemble(&rows, 500);
        assert!(!context.contains(TRUNCATION_MARKER));
    }
}

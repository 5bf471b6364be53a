//! Configuration for the ingestion and retrieval core

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Ingestion processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Category policy table (TTL + routing keywords per category)
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            processing: ProcessingConfig::default(),
            retrieval: RetrievalConfig::default(),
            categories: default_categories(),
        }
    }
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| Error::config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate bounds and cross-field consistency
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.target_size == 0 {
            return Err(Error::config("chunking.target_size must be > 0"));
        }
        if c.min_chunk_size > c.target_size {
            return Err(Error::config(
                "chunking.min_chunk_size must not exceed chunking.target_size",
            ));
        }
        if c.target_size > c.max_chunk_size {
            return Err(Error::config(
                "chunking.target_size must not exceed chunking.max_chunk_size",
            ));
        }
        if c.overlap >= c.target_size {
            return Err(Error::config(
                "chunking.overlap must be smaller than chunking.target_size",
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(Error::config("processing.batch_size must be > 0"));
        }
        if let Some(0) = self.processing.max_concurrent {
            return Err(Error::config("processing.max_concurrent must be > 0"));
        }
        if self.retrieval.max_chunks == 0 {
            return Err(Error::config("retrieval.max_chunks must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(Error::config("retrieval.threshold must be within 0.0..=1.0"));
        }
        Ok(())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_target_size")]
    pub target_size: usize,
    /// Overlap between chunks in characters (fixed-window strategy only)
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// Minimum chunk size; smaller fragments are merged into neighbors
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
    /// Maximum chunk size; also the single-chunk shortcut threshold
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 1000,
            overlap: 200,
            min_chunk_size: 100,
            max_chunk_size: 2000,
        }
    }
}

/// Ingestion processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum documents in flight during batch ingestion (default: CPU count, max 8)
    pub max_concurrent: Option<usize>,
    /// Number of chunks per upsert batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Invoke the enhancer when one is configured
    #[serde(default = "default_enhance")]
    pub enhance: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent: None, // Auto-detect from CPU count
            batch_size: 32,
            enhance: true,
        }
    }
}

impl ProcessingConfig {
    /// Effective concurrency cap
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum chunks assembled into one context
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
    /// Character budget for the assembled context string
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
    /// Minimum similarity score for a result to be kept
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Default result count for single-category search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Categories searched when the query matches no routing keywords
    #[serde(default = "default_priority_categories")]
    pub priority_categories: Vec<String>,
    /// Query cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Query cache size ceiling; pruned opportunistically when exceeded
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chunks: 6,
            max_context_length: 4000,
            threshold: 0.25,
            search_limit: 5,
            priority_categories: vec!["faq".to_string(), "policy".to_string()],
            cache_ttl_secs: 60,
            cache_max_entries: 200,
        }
    }
}

/// One category's policy: expiry plus routing/inference keywords
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category name (e.g. "menu", "policy", "faq")
    pub name: String,
    /// Time-to-live in seconds for chunks in this category; None = no expiry
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Keywords matched against queries (routing) and paths (inference)
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_target_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}
fn default_min_chunk_size() -> usize {
    100
}
fn default_max_chunk_size() -> usize {
    2000
}
fn default_batch_size() -> usize {
    32
}
fn default_enhance() -> bool {
    true
}
fn default_max_chunks() -> usize {
    6
}
fn default_max_context_length() -> usize {
    4000
}
fn default_threshold() -> f32 {
    0.25
}
fn default_search_limit() -> usize {
    5
}
fn default_priority_categories() -> Vec<String> {
    vec!["faq".to_string(), "policy".to_string()]
}
fn default_cache_ttl_secs() -> u64 {
    60
}
fn default_cache_max_entries() -> usize {
    200
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule {
            name: "menu".to_string(),
            ttl_secs: Some(7 * 24 * 3600),
            keywords: vec![
                "menu".to_string(),
                "dish".to_string(),
                "price".to_string(),
                "order".to_string(),
            ],
        },
        CategoryRule {
            name: "policy".to_string(),
            ttl_secs: None,
            keywords: vec![
                "policy".to_string(),
                "refund".to_string(),
                "hours".to_string(),
                "terms".to_string(),
            ],
        },
        CategoryRule {
            name: "faq".to_string(),
            ttl_secs: Some(30 * 24 * 3600),
            keywords: vec!["faq".to_string(), "question".to_string(), "help".to_string()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.categories.iter().any(|c| c.name == "menu"));
    }

    #[test]
    fn rejects_inverted_chunk_bounds() {
        let mut config = RagConfig::default();
        config.chunking.min_chunk_size = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_overlap_at_target_size() {
        let mut config = RagConfig::default();
        config.chunking.overlap = config.chunking.target_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = RagConfig::default();
        config.processing.batch_size = 0;
        assert!(config.validate().is_err());
    }
}

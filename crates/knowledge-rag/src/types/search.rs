//! Retrieval result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for single-category search
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Restrict to one category; None searches the whole index
    pub category: Option<String>,
    /// Result count cap; None falls back to the configured default
    pub limit: Option<usize>,
    /// Similarity threshold override
    pub threshold: Option<f32>,
}

/// One ranked retrieval hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk text
    pub text: String,
    /// Similarity score (0.0-1.0, higher is more similar)
    pub score: f32,
    /// Category the chunk was indexed under
    pub category: String,
    /// Source title (or source id when no title is known)
    pub source: String,
    /// Chunk metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Options for context generation
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Cap on merged chunks; None falls back to the configured default
    pub max_chunks: Option<usize>,
    /// Character budget override for the assembled context
    pub max_context_length: Option<usize>,
    /// Similarity threshold override
    pub threshold: Option<f32>,
    /// Explicit category list, bypassing keyword routing
    pub categories: Option<Vec<String>>,
}

/// Why a context generation call produced (or skipped) context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContextReason {
    /// Context was assembled
    Ok,
    /// Trivial input; retrieval was skipped without touching the store
    NotNeeded,
    /// Nothing cleared the similarity threshold
    NoMatches,
    /// The vector index is not ready
    Disabled,
    /// Retrieval failed; details in `error`
    Error,
}

/// Outcome of a context generation call
///
/// Never an error: the caller sits on a user-facing response path, so
/// failures degrade to `has_context: false` with a reason code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// True when `context` holds assembled text
    pub has_context: bool,
    /// Reason code
    pub reason: ContextReason,
    /// Assembled, length-bounded context string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Source titles contributing to the context, in rank order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Number of chunks merged into the context
    pub count: usize,
    /// Error detail when `reason` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RetrievedContext {
    fn empty(reason: ContextReason) -> Self {
        Self {
            has_context: false,
            reason,
            context: None,
            sources: Vec::new(),
            count: 0,
            error: None,
        }
    }

    /// Trivial input; the store was never queried
    pub fn not_needed() -> Self {
        Self::empty(ContextReason::NotNeeded)
    }

    /// No result cleared the threshold
    pub fn no_matches() -> Self {
        Self::empty(ContextReason::NoMatches)
    }

    /// The vector index is not ready
    pub fn disabled() -> Self {
        Self::empty(ContextReason::Disabled)
    }

    /// Retrieval failed
    pub fn failed(error: impl Into<String>) -> Self {
        let mut ctx = Self::empty(ContextReason::Error);
        ctx.error = Some(error.into());
        ctx
    }

    /// Assembled context
    pub fn assembled(context: String, sources: Vec<String>, count: usize) -> Self {
        Self {
            has_context: true,
            reason: ContextReason::Ok,
            context: Some(context),
            sources,
            count,
            error: None,
        }
    }
}

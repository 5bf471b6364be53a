//! Category policy: per-category expiry plus keyword routing

use std::path::Path;

use crate::config::CategoryRule;

/// Read-only category policy table
///
/// Resolves a category to its chunk TTL, infers categories from file paths,
/// and routes queries to categories by keyword.
#[derive(Debug, Clone, Default)]
pub struct CategoryPolicy {
    rules: Vec<CategoryRule>,
}

impl CategoryPolicy {
    /// Build a policy from configured category rules
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// TTL in milliseconds for a category; None = indefinite retention
    ///
    /// Unknown categories get no expiry.
    pub fn ttl_ms(&self, category: &str) -> Option<u64> {
        self.rules
            .iter()
            .find(|r| r.name == category)
            .and_then(|r| r.ttl_secs)
            .map(|secs| secs * 1000)
    }

    /// Whether the category is known to the policy table
    pub fn is_known(&self, category: &str) -> bool {
        self.rules.iter().any(|r| r.name == category)
    }

    /// All configured category names
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Infer a category from path components and keywords
    ///
    /// A path containing a category's name (or one of its keywords) as a
    /// substring of any component selects that category.
    pub fn infer_from_path(&self, path: &Path) -> Option<String> {
        let lowered = path.to_string_lossy().to_lowercase();
        self.rules
            .iter()
            .find(|r| {
                lowered.contains(&r.name.to_lowercase())
                    || r.keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
            })
            .map(|r| r.name.clone())
    }

    /// Categories whose keywords match the query, in rule order
    pub fn route_query(&self, query: &str) -> Vec<String> {
        let lowered = query.to_lowercase();
        self.rules
            .iter()
            .filter(|r| {
                r.keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
                    || lowered.contains(&r.name.to_lowercase())
            })
            .map(|r| r.name.clone())
            .collect()
    }
}

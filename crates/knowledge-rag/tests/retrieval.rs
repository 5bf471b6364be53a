//! Retrieval engine integration tests with a mock vector index

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use knowledge_rag::types::{ContextOptions, ContextReason, SearchOptions};
use knowledge_rag::{RagConfig, RetrievalEngine};

use common::MemoryIndex;

fn engine_with(index: Arc<MemoryIndex>) -> RetrievalEngine {
    RetrievalEngine::new(&RagConfig::default(), index)
}

fn seeded_index() -> Arc<MemoryIndex> {
    let index = MemoryIndex::new();
    index.seed(
        "The winter menu features braised leeks with hazelnut butter.",
        "menu",
        "menu.md",
    );
    index.seed(
        "Refunds are processed within five business days of the request.",
        "policy",
        "policy.md",
    );
    index.seed(
        "Large groups should book the private dining room two weeks ahead.",
        "faq",
        "faq.md",
    );
    index
}

#[tokio::test]
async fn scenario_e_trivial_input_skips_the_store() {
    let index = seeded_index();
    let engine = engine_with(index.clone());

    let result = engine.generate_context("ok", &ContextOptions::default()).await;

    assert!(!result.has_context);
    assert_eq!(result.reason, ContextReason::NotNeeded);
    assert_eq!(index.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn greetings_skip_the_store_regardless_of_length() {
    let index = seeded_index();
    let engine = engine_with(index.clone());

    for query in ["thank you so much!", "hello", "good night"] {
        let result = engine.generate_context(query, &ContextOptions::default()).await;
        assert_eq!(result.reason, ContextReason::NotNeeded, "query: {}", query);
    }
    assert_eq!(index.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scenario_d_verbatim_phrase_ranks_first() {
    let index = seeded_index();
    let engine = engine_with(index);

    let results = engine
        .search(
            "braised leeks with hazelnut butter",
            &SearchOptions::default(),
        )
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert!(results[0].text.contains("braised leeks"));
    assert!(results[0].score >= 0.25);

    let engine2 = engine_with(seeded_index());
    let unrelated = engine2
        .search("quantum entanglement basics", &SearchOptions::default())
        .await
        .unwrap();
    assert!(unrelated.is_empty());
}

#[tokio::test]
async fn raising_the_threshold_never_increases_result_count() {
    let index = seeded_index();
    let engine = engine_with(index);

    let mut previous = usize::MAX;
    for threshold in [0.0f32, 0.3, 0.6, 0.96] {
        let results = engine
            .search(
                "refunds processed business days",
                &SearchOptions {
                    threshold: Some(threshold),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(
            results.len() <= previous,
            "threshold {} returned more results",
            threshold
        );
        previous = results.len();
    }
}

#[tokio::test]
async fn context_respects_the_character_budget() {
    let index = MemoryIndex::new();
    for i in 0..8 {
        index.seed(
            &format!(
                "Menu entry {}: {}",
                i,
                "slow-roasted carrots with dukkah and labneh. ".repeat(12)
            ),
            "menu",
            "menu.md",
        );
    }
    let engine = engine_with(index);

    let opts = ContextOptions {
        max_context_length: Some(600),
        categories: Some(vec!["menu".to_string()]),
        ..Default::default()
    };
    let result = engine
        .generate_context("what carrots dishes are on the menu", &opts)
        .await;

    assert!(result.has_context);
    let context = result.context.unwrap();
    assert!(context.len() <= 600, "context length {}", context.len());
    assert_eq!(context.matches("[context truncated]").count(), 1);
    assert!(context.ends_with("[context truncated]"));
}

#[tokio::test]
async fn keyword_routing_scopes_the_fanout() {
    let index = seeded_index();
    let engine = engine_with(index.clone());

    let result = engine
        .generate_context("what is the menu price for braised leeks", &ContextOptions::default())
        .await;
    assert!(result.has_context);

    let searched = index.searched_categories.lock();
    assert!(searched.contains(&Some("menu".to_string())));
    assert!(!searched.contains(&Some("faq".to_string())));
}

#[tokio::test]
async fn unrouted_queries_fall_back_to_priority_categories() {
    let index = seeded_index();
    let engine = engine_with(index.clone());

    let result = engine
        .generate_context(
            "when should large groups book the private dining room",
            &ContextOptions::default(),
        )
        .await;
    // Default priority list is faq + policy
    assert!(result.has_context);
    let searched = index.searched_categories.lock();
    assert!(searched.contains(&Some("faq".to_string())));
    assert!(searched.contains(&Some("policy".to_string())));
}

#[tokio::test]
async fn one_failing_category_does_not_abort_the_fanout() {
    let index = seeded_index();
    index.fail_category("policy");
    let engine = engine_with(index);

    let opts = ContextOptions {
        categories: Some(vec!["menu".to_string(), "policy".to_string()]),
        ..Default::default()
    };
    let result = engine
        .generate_context("winter menu braised leeks hazelnut", &opts)
        .await;

    assert!(result.has_context, "surviving category must still answer");
    assert!(result.sources.contains(&"menu.md".to_string()));
}

#[tokio::test]
async fn all_categories_failing_reports_an_error_reason() {
    let index = seeded_index();
    index.fail_category("menu");
    index.fail_category("policy");
    let engine = engine_with(index);

    let opts = ContextOptions {
        categories: Some(vec!["menu".to_string(), "policy".to_string()]),
        ..Default::default()
    };
    let result = engine
        .generate_context("winter menu braised leeks hazelnut", &opts)
        .await;

    assert!(!result.has_context);
    assert_eq!(result.reason, ContextReason::Error);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn no_matches_is_reported_without_error() {
    let index = seeded_index();
    let engine = engine_with(index);

    let result = engine
        .generate_context("completely unrelated astrophysics lecture notes", &ContextOptions::default())
        .await;

    assert!(!result.has_context);
    assert_eq!(result.reason, ContextReason::NoMatches);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn unready_index_disables_retrieval() {
    let index = seeded_index();
    index.set_ready(false);
    let engine = engine_with(index.clone());

    let result = engine
        .generate_context("what is on the winter menu", &ContextOptions::default())
        .await;
    assert_eq!(result.reason, ContextReason::Disabled);
    assert_eq!(index.search_calls.load(Ordering::SeqCst), 0);

    assert!(engine
        .search("winter menu", &SearchOptions::default())
        .await
        .is_err());
}

#[tokio::test]
async fn duplicate_queries_within_the_ttl_hit_the_cache() {
    let index = seeded_index();
    let engine = engine_with(index.clone());

    let first = engine
        .generate_context("what is the menu price for braised leeks", &ContextOptions::default())
        .await;
    assert!(first.has_context);
    let calls_after_first = index.search_calls.load(Ordering::SeqCst);

    let second = engine
        .generate_context("  What is the MENU price for braised leeks  ", &ContextOptions::default())
        .await;
    assert!(second.has_context);
    assert_eq!(
        index.search_calls.load(Ordering::SeqCst),
        calls_after_first,
        "cached query must not reach the store"
    );
    assert_eq!(engine.cache_stats().total_hits, 1);
}

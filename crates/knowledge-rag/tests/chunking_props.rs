//! Property tests for the chunking engine

use proptest::prelude::*;

use knowledge_rag::chunking::{chunk, ChunkOptions};

fn options() -> ChunkOptions {
    ChunkOptions {
        target_size: 200,
        overlap: 20,
        min_size: 30,
        max_size: 400,
        ..ChunkOptions::default()
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Paragraphs of short sentences: every unit has split points, so no
/// last-resort atomic chunks arise
fn text_strategy() -> impl Strategy<Value = String> {
    let sentence = proptest::collection::vec("[a-z]{2,8}", 3..10)
        .prop_map(|words| format!("{}.", words.join(" ")));
    let paragraph =
        proptest::collection::vec(sentence, 1..6).prop_map(|sentences| sentences.join(" "));
    proptest::collection::vec(paragraph, 1..8).prop_map(|paragraphs| paragraphs.join("\n\n"))
}

proptest! {
    #[test]
    fn chunking_is_deterministic(text in text_strategy()) {
        let opts = options();
        let first: Vec<String> = chunk(&text, &opts).into_iter().map(|c| c.hash).collect();
        let second: Vec<String> = chunk(&text, &opts).into_iter().map(|c| c.hash).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn chunks_cover_the_whitespace_collapsed_source(text in text_strategy()) {
        let chunks = chunk(&text, &options());
        let rebuilt = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(collapse_ws(&rebuilt), collapse_ws(&text));
    }

    #[test]
    fn chunk_sizes_stay_within_the_hard_max(text in text_strategy()) {
        let opts = options();
        for c in chunk(&text, &opts) {
            prop_assert!(
                c.text.len() <= opts.max_size,
                "chunk of {} exceeds max {}",
                c.text.len(),
                opts.max_size
            );
        }
    }

    #[test]
    fn offsets_always_index_into_the_source(text in text_strategy()) {
        for c in chunk(&text, &options()) {
            prop_assert_eq!(&text[c.char_start..c.char_end], c.text.as_str());
        }
    }
}

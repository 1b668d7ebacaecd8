//! Retrieval pipeline: splitting, caching, ranking

use pagelens_core::config::RagSettings;
use pagelens_core::services::{chunk_hash, split_text, RagService};
use pagelens_core::storage::Storage;
use std::sync::Arc;

const PAGE: &str = "Shipping is free on orders above fifty dollars and returns \
are accepted within thirty days of delivery.\n\n\
The company was founded in a garage and still names every release after a \
seabird.\n\n\
Support is reachable around the clock through the help portal.";

#[test]
fn chunks_are_cached_by_content_hash() {
    let storage = Arc::new(Storage::open_in_memory().expect("db"));
    let rag = RagService::new(storage.clone(), RagSettings::default());

    rag.context_for(PAGE, "when can I return an order").expect("context");

    // Every chunk of the page is now cached.
    for chunk in split_text(PAGE, 500, 50) {
        assert!(
            storage.chunk_embedding(&chunk_hash(&chunk)).expect("query").is_some(),
            "chunk not cached: {chunk}"
        );
    }

    // A second pass reuses the cache and returns identical output.
    let first = rag.context_for(PAGE, "when can I return an order").expect("context");
    let second = rag.context_for(PAGE, "when can I return an order").expect("context");
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
}

#[test]
fn sources_are_capped_at_top_k() {
    let storage = Arc::new(Storage::open_in_memory().expect("db"));
    let rag = RagService::new(
        storage,
        RagSettings {
            chunk_size: 80,
            chunk_overlap: 10,
            top_k: 2,
        },
    );

    let (context, sources) = rag
        .context_for(PAGE, "what is the returns policy")
        .expect("context");
    assert_eq!(sources.len(), 2);
    assert_eq!(context, sources.join("\n\n---\n\n"));
}

#[test]
fn overlap_carries_context_between_chunks() {
    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let chunks = split_text(text, 30, 12);
    assert!(chunks.len() > 1);

    // Consecutive chunks share at least one word of trailing context.
    for pair in chunks.windows(2) {
        let tail_word = pair[0].split_whitespace().last().expect("tail");
        assert!(
            pair[1].contains(tail_word),
            "no overlap between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
}

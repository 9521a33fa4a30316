//! Property tests for local index search bounds and ordering.

use std::sync::Arc;

use proptest::prelude::*;

use ragstack_rag::chunking::RecursiveChunker;
use ragstack_rag::document::{Document, SearchResult};
use ragstack_rag::local::LocalVectorIndex;
use ragstack_rag::mock::MockEmbeddingProvider;
use ragstack_rag::vectorstore::VectorIndex;

const DIM: usize = 16;

/// For any set of indexed documents and any `top_k` in `[1, 20]`, search
/// returns at most `top_k` results, never more than the number of indexed
/// chunks, ordered by descending score.
mod prop_search_bounds_and_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn results_bounded_by_top_k_and_ordered(
            texts in proptest::collection::vec("[a-z]{5,20}", 1..15),
            query in "[a-z]{5,20}",
            top_k in 1usize..=20,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, added): (Vec<SearchResult>, usize) = rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let index = LocalVectorIndex::new(
                    dir.path().join("index.json"),
                    Arc::new(RecursiveChunker::new(500, 50)),
                    Arc::new(MockEmbeddingProvider::new(DIM)),
                );
                index.load().await.unwrap();

                let documents: Vec<Document> = texts
                    .iter()
                    .enumerate()
                    .map(|(i, text)| Document::new(format!("doc-{i}"), text.clone()))
                    .collect();
                let added = index.add_documents(&documents).await.unwrap();

                let results = index.search(&query, top_k).await.unwrap();
                (results, added)
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= added);

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score.unwrap() >= window[1].score.unwrap(),
                    "results not in descending order: {:?} < {:?}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

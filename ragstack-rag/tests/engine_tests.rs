//! End-to-end engine tests over the local index with mock providers.

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;

use ragstack_core::types::GenerationParams;
use ragstack_core::RagError;
use ragstack_model::MockLlm;
use ragstack_rag::chunking::RecursiveChunker;
use ragstack_rag::config::RagConfig;
use ragstack_rag::document::Document;
use ragstack_rag::engine::{NO_DOCUMENTS_ANSWER, RagEngine};
use ragstack_rag::local::LocalVectorIndex;
use ragstack_rag::mock::MockEmbeddingProvider;
use ragstack_rag::vectorstore::VectorIndex;

async fn make_engine(path: &Path, response: &str) -> (RagEngine, Arc<MockLlm>) {
    let config = RagConfig::builder().chunk_size(500).chunk_overlap(50).top_k(5).build().unwrap();
    let index = LocalVectorIndex::new(
        path,
        Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)),
        Arc::new(MockEmbeddingProvider::new(64)),
    );
    index.load().await.unwrap();

    let llm = Arc::new(MockLlm::new(response));
    (RagEngine::new(Arc::new(index), llm.clone(), config), llm)
}

#[tokio::test]
async fn refund_query_cites_the_indexed_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, llm) =
        make_engine(&dir.path().join("index.json"), "Refunds are processed within 14 days.").await;

    engine
        .index_documents(&[Document::new("faq", "Refunds are processed within 14 days.")])
        .await
        .unwrap();

    let answer =
        engine.query("What is the refund window?", 5, GenerationParams::default()).await.unwrap();

    assert_eq!(answer.answer, "Refunds are processed within 14 days.");
    assert_eq!(answer.sources.len(), 1);
    assert!(answer.sources[0].content.contains("14 days"));
    assert_eq!(answer.model, "mock-llm");
    assert!(answer.usage.total_tokens > 0);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn empty_index_short_circuits_without_calling_the_generator() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, llm) = make_engine(&dir.path().join("index.json"), "never returned").await;

    let answer = engine.query("Anything?", 5, GenerationParams::default()).await.unwrap();

    assert_eq!(answer.answer, NO_DOCUMENTS_ANSWER);
    assert!(answer.sources.is_empty());
    assert_eq!(answer.model, "none");
    assert_eq!(answer.usage.total_tokens, 0);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn answers_get_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _llm) = make_engine(&dir.path().join("index.json"), "answer").await;
    engine.index_documents(&[Document::new("doc", "Some indexed content.")]).await.unwrap();

    let first = engine.query("q", 5, GenerationParams::default()).await.unwrap();
    let second = engine.query("q", 5, GenerationParams::default()).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn source_excerpts_are_truncated_for_display() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _llm) = make_engine(&dir.path().join("index.json"), "answer").await;

    let long_chunk = "a".repeat(400);
    engine.index_documents(&[Document::new("long", long_chunk)]).await.unwrap();

    let answer = engine.query("query", 5, GenerationParams::default()).await.unwrap();
    let excerpt = &answer.sources[0].content;

    assert!(excerpt.ends_with("..."));
    assert_eq!(excerpt.chars().count(), 303);
}

#[tokio::test]
async fn streaming_deltas_concatenate_to_the_answer() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, llm) =
        make_engine(&dir.path().join("index.json"), "The refund window is 14 days.").await;
    engine
        .index_documents(&[Document::new("faq", "Refunds are processed within 14 days.")])
        .await
        .unwrap();

    let stream =
        engine.query_stream("What is the refund window?", 5, GenerationParams::default())
            .await
            .unwrap();
    let deltas: Vec<String> = stream.map(|delta| delta.unwrap()).collect::<Vec<_>>().await;

    assert!(!deltas.is_empty());
    assert_eq!(deltas.concat(), "The refund window is 14 days.");
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn streaming_on_empty_index_yields_the_fixed_answer() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, llm) = make_engine(&dir.path().join("index.json"), "never returned").await;

    let stream = engine.query_stream("Anything?", 5, GenerationParams::default()).await.unwrap();
    let deltas: Vec<String> = stream.map(|delta| delta.unwrap()).collect::<Vec<_>>().await;

    assert_eq!(deltas, vec![NO_DOCUMENTS_ANSWER.to_string()]);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn cancelling_a_stream_leaves_the_engine_usable() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _llm) =
        make_engine(&dir.path().join("index.json"), "A longer streamed answer here.").await;
    engine.index_documents(&[Document::new("doc", "Some indexed content.")]).await.unwrap();

    let mut stream =
        engine.query_stream("query", 5, GenerationParams::default()).await.unwrap();
    let first = stream.next().await;
    assert!(first.is_some());
    drop(stream);

    let answer = engine.query("query", 5, GenerationParams::default()).await.unwrap();
    assert_eq!(answer.answer, "A longer streamed answer here.");
}

#[tokio::test]
async fn index_documents_reports_chunks_added() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _llm) = make_engine(&dir.path().join("index.json"), "answer").await;

    let before = engine.document_count().await.unwrap();
    let added = engine
        .index_documents(&[
            Document::new("a", "First document."),
            Document::new("b", "Second document."),
        ])
        .await
        .unwrap();

    assert_eq!(added, 2);
    assert_eq!(engine.document_count().await.unwrap(), before + added);
}

#[tokio::test]
async fn delete_on_the_local_backend_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _llm) = make_engine(&dir.path().join("index.json"), "answer").await;

    assert!(matches!(
        engine.delete("some-id").await,
        Err(RagError::Unsupported { .. })
    ));
}

#[tokio::test]
async fn zero_top_k_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, llm) = make_engine(&dir.path().join("index.json"), "answer").await;
    engine.index_documents(&[Document::new("doc", "Some indexed content.")]).await.unwrap();

    assert!(matches!(
        engine.query("query", 0, GenerationParams::default()).await,
        Err(RagError::Config(_))
    ));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn retrieval_respects_top_k() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _llm) = make_engine(&dir.path().join("index.json"), "answer").await;

    let docs: Vec<Document> = (0..8)
        .map(|i| Document::new(format!("doc-{i}"), format!("Document number {i} content.")))
        .collect();
    engine.index_documents(&docs).await.unwrap();

    let answer = engine.query("query", 3, GenerationParams::default()).await.unwrap();
    assert_eq!(answer.sources.len(), 3);
}

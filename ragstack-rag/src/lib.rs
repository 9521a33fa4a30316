//! # ragstack-rag
//!
//! Retrieval-Augmented Generation engine: document chunking, vector
//! indexing, and query orchestration with citations.
//!
//! ## Overview
//!
//! - [`RecursiveChunker`]: boundary-preferring document splitter
//! - [`VectorIndex`]: the index adapter contract, with [`LocalVectorIndex`]
//!   (on-disk snapshot) and [`QdrantVectorIndex`] (hosted service) variants
//! - [`EmbeddingProvider`]: embedding contract with an OpenAI
//!   implementation and a deterministic mock
//! - [`RagEngine`]: composes an index and an LLM into `query` /
//!   `query_stream` flows
//! - [`factory::build_engine`]: settings-to-engine wiring with fail-fast
//!   validation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragstack_core::GenerationParams;
//! use ragstack_rag::{Document, RagSettings, factory};
//!
//! let settings = RagSettings::default();
//! let engine = factory::build_engine(&settings).await?;
//!
//! engine.index_documents(&[Document::new("faq", "Refunds take 14 days.")]).await?;
//! let answer = engine.query("What is the refund window?", 5, GenerationParams::default()).await?;
//! println!("{} (sources: {})", answer.answer, answer.sources.len());
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod factory;
pub mod local;
pub mod mock;
pub mod openai;
pub mod qdrant;
pub mod vectorstore;

pub use answer::{MAX_EXCERPT_CHARS, RagAnswer, SourceExcerpt};
pub use chunking::{Chunker, RecursiveChunker};
pub use config::RagConfig;
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{NO_DOCUMENTS_ANSWER, RagEngine};
pub use factory::{RagSettings, build_engine};
pub use local::LocalVectorIndex;
pub use mock::MockEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
pub use qdrant::QdrantVectorIndex;
pub use vectorstore::VectorIndex;

//! Construction-time wiring: settings to a resolved [`RagEngine`].
//!
//! Backend and provider names are validated exactly once here; an
//! unrecognized value fails fast with a configuration error and the
//! resolved trait objects are held for the process lifetime.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use ragstack_core::error::{RagError, Result};
use ragstack_core::llm::Llm;
use ragstack_model::{AnthropicLlm, OpenAiLlm};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::engine::RagEngine;
use crate::local::LocalVectorIndex;
use crate::openai::OpenAiEmbeddingProvider;
use crate::qdrant::QdrantVectorIndex;
use crate::vectorstore::VectorIndex;

/// Default chat model when `llm_provider` is `openai`.
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default chat model when `llm_provider` is `anthropic`.
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Process configuration for the RAG pipeline.
///
/// Typically deserialized from an environment- or file-based source by
/// the startup layer; [`build_engine`] validates it once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Vector index backend: `"local"` or `"qdrant"`.
    pub vector_store: String,
    /// LLM provider: `"openai"` or `"anthropic"`.
    pub llm_provider: String,
    /// Chat model override; empty selects the provider default.
    pub model: String,
    /// API key for OpenAI (embeddings, and generation when selected).
    pub openai_api_key: String,
    /// API key for Anthropic generation.
    pub anthropic_api_key: String,
    /// Embedding model bound to the index.
    pub embedding_model: String,
    /// Snapshot path for the local backend.
    pub index_path: PathBuf,
    /// Qdrant endpoint for the remote backend.
    pub qdrant_url: String,
    /// Qdrant collection name.
    pub collection: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of results retrieved per query.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            vector_store: "local".into(),
            llm_provider: "openai".into(),
            model: String::new(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            embedding_model: "text-embedding-3-small".into(),
            index_path: PathBuf::from("./data/index.json"),
            qdrant_url: "http://localhost:6334".into(),
            collection: "rag-index".into(),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 5,
        }
    }
}

/// Resolve settings into a ready [`RagEngine`].
///
/// Validates chunk parameters and the backend/provider names, constructs
/// the adapters, and loads the index (deserializing the local snapshot
/// when one exists).
///
/// # Errors
///
/// Returns [`RagError::Config`] for invalid parameters or unknown
/// `vector_store`/`llm_provider` values, and adapter errors when a client
/// cannot be constructed or the snapshot fails to load.
pub async fn build_engine(settings: &RagSettings) -> Result<RagEngine> {
    let config = RagConfig::builder()
        .chunk_size(settings.chunk_size)
        .chunk_overlap(settings.chunk_overlap)
        .top_k(settings.top_k)
        .build()?;

    let chunker: Arc<dyn Chunker> =
        Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap));

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiEmbeddingProvider::new(settings.openai_api_key.clone())?
            .with_model(settings.embedding_model.clone()),
    );

    let index: Arc<dyn VectorIndex> = match settings.vector_store.as_str() {
        "local" => Arc::new(LocalVectorIndex::new(&settings.index_path, chunker, embedder)),
        "qdrant" => Arc::new(QdrantVectorIndex::connect(
            &settings.qdrant_url,
            settings.collection.clone(),
            chunker,
            embedder,
        )?),
        other => {
            return Err(RagError::Config(format!("unknown vector store: {other}")));
        }
    };
    index.load().await?;

    let llm: Arc<dyn Llm> = match settings.llm_provider.as_str() {
        "openai" => {
            let model = if settings.model.is_empty() {
                DEFAULT_OPENAI_MODEL
            } else {
                settings.model.as_str()
            };
            Arc::new(OpenAiLlm::new(settings.openai_api_key.clone(), model)?)
        }
        "anthropic" => {
            let model = if settings.model.is_empty() {
                DEFAULT_ANTHROPIC_MODEL
            } else {
                settings.model.as_str()
            };
            Arc::new(AnthropicLlm::new(settings.anthropic_api_key.clone(), model)?)
        }
        other => {
            return Err(RagError::Config(format!("unknown LLM provider: {other}")));
        }
    };

    info!(
        vector_store = %settings.vector_store,
        llm_provider = %settings.llm_provider,
        model = llm.name(),
        "engine constructed"
    );

    Ok(RagEngine::new(index, llm, config))
}

//! RAG engine: composes a vector index and an LLM into query flows.
//!
//! Each query is a short-lived pipeline (retrieve, assemble context,
//! build the instruction prompt, generate, package) with no state beyond
//! the two shared adapters. The streaming variant runs the same retrieval
//! and prompt steps, then forwards the provider's deltas unmodified.

use std::sync::Arc;

use futures::stream;
use tracing::{error, info};
use uuid::Uuid;

use ragstack_core::error::{RagError, Result};
use ragstack_core::llm::{Llm, TokenStream};
use ragstack_core::types::{ChatMessage, GenerationParams, Usage};

use crate::answer::{RagAnswer, SourceExcerpt};
use crate::config::RagConfig;
use crate::document::{Document, SearchResult};
use crate::vectorstore::VectorIndex;

/// The fixed answer returned when retrieval finds nothing. A normal
/// terminal outcome, not an error; the generator is never invoked.
pub const NO_DOCUMENTS_ANSWER: &str =
    "I don't have any documents to search. Please upload some documents first.";

/// Delimiter between context entries in the assembled prompt.
const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Build the instruction prompt embedding the retrieved context and the
/// original question. The instructions pin the model to the context, ask
/// it to admit insufficiency, and require source citations.
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions based on the provided context.\n\
         If the answer cannot be found in the context, say \"I don't have enough information \
         to answer that question.\"\n\
         Always cite which parts of the context support your answer.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

/// Concatenate retrieved chunks into the prompt context, each prefixed
/// with a 1-based source label, in retrieval order (no re-sorting).
fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("[Source {}]: {}", i + 1, result.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

/// The RAG orchestrator.
///
/// Holds one [`VectorIndex`] and one [`Llm`], both constructed once per
/// process configuration and shared across concurrent requests.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_rag::{RagConfig, RagEngine};
///
/// let engine = RagEngine::new(index, llm, RagConfig::default());
/// engine.index_documents(&documents).await?;
/// let answer = engine.query("What is the refund window?", 5, params).await?;
/// ```
pub struct RagEngine {
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn Llm>,
    config: RagConfig,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("index", &"Arc<dyn VectorIndex>")
            .field("llm", &"Arc<dyn Llm>")
            .field("config", &self.config)
            .finish()
    }
}

impl RagEngine {
    /// Create an engine from its two collaborators and a validated config.
    pub fn new(index: Arc<dyn VectorIndex>, llm: Arc<dyn Llm>, config: RagConfig) -> Self {
        Self { index, llm, config }
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    fn validate_top_k(top_k: usize) -> Result<()> {
        if top_k == 0 {
            return Err(RagError::Config("top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Chunk, embed, and index the given documents.
    ///
    /// Returns the number of chunks added.
    pub async fn index_documents(&self, documents: &[Document]) -> Result<usize> {
        let added = self.index.add_documents(documents).await?;
        info!(documents = documents.len(), chunks = added, "indexed documents");
        Ok(added)
    }

    /// The current number of indexed chunks.
    pub async fn document_count(&self) -> Result<usize> {
        self.index.document_count().await
    }

    /// Delete an indexed vector by ID.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Unsupported`] for backends without delete
    /// support (the local-file variant).
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.index.delete(id).await
    }

    /// Execute a RAG query: retrieve, assemble context, generate, package.
    ///
    /// Zero retrieved chunks short-circuit to the fixed
    /// [`NO_DOCUMENTS_ANSWER`] with zero usage and an empty source list.
    pub async fn query(
        &self,
        question: &str,
        top_k: usize,
        params: GenerationParams,
    ) -> Result<RagAnswer> {
        Self::validate_top_k(top_k)?;

        let retrieved = self.index.search(question, top_k).await?;

        if retrieved.is_empty() {
            info!("query matched no indexed documents");
            return Ok(RagAnswer {
                id: Uuid::new_v4(),
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                sources: Vec::new(),
                model: "none".to_string(),
                usage: Usage::default(),
            });
        }

        let context = build_context(&retrieved);
        let prompt = build_prompt(&context, question);

        // The prompt already carries the instructions; no system message.
        let messages = vec![ChatMessage::user(prompt)];
        let generated = self.llm.generate(&messages, params).await.map_err(|e| {
            error!(error = %e, "generation failed");
            e
        })?;

        let sources = retrieved.iter().map(SourceExcerpt::from_result).collect();

        info!(sources = retrieved.len(), model = %generated.model, "query completed");

        Ok(RagAnswer {
            id: Uuid::new_v4(),
            answer: generated.content,
            sources,
            model: generated.model,
            usage: generated.usage,
        })
    }

    /// Execute a RAG query, streaming the answer as ordered text deltas.
    ///
    /// Retrieval and prompt assembly are identical to [`query`](Self::query);
    /// the provider's deltas are forwarded unmodified. Source packaging is
    /// the caller's responsibility for streamed responses. Dropping the
    /// stream cancels generation without corrupting any adapter state.
    pub async fn query_stream(
        &self,
        question: &str,
        top_k: usize,
        params: GenerationParams,
    ) -> Result<TokenStream> {
        Self::validate_top_k(top_k)?;

        let retrieved = self.index.search(question, top_k).await?;

        if retrieved.is_empty() {
            info!("streaming query matched no indexed documents");
            let answer = NO_DOCUMENTS_ANSWER.to_string();
            return Ok(Box::pin(stream::once(async move { Ok(answer) })));
        }

        let context = build_context(&retrieved);
        let prompt = build_prompt(&context, question);

        let messages = vec![ChatMessage::user(prompt)];
        self.llm.generate_stream(&messages, params).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn result(content: &str) -> SearchResult {
        SearchResult { content: content.to_string(), metadata: HashMap::new(), score: Some(0.9) }
    }

    #[test]
    fn context_labels_sources_in_retrieval_order() {
        let context = build_context(&[result("first chunk"), result("second chunk")]);
        assert_eq!(context, "[Source 1]: first chunk\n\n---\n\n[Source 2]: second chunk");
    }

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = build_prompt("[Source 1]: the context", "the question?");
        assert!(prompt.contains("[Source 1]: the context"));
        assert!(prompt.contains("Question: the question?"));
        assert!(prompt.contains("Always cite"));
        assert!(prompt.ends_with("Answer:"));
    }
}

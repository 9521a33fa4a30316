//! Vector index adapter trait.

use async_trait::async_trait;

use ragstack_core::error::Result;

use crate::document::{Document, SearchResult};

/// A vector index that chunks, embeds, stores, and searches documents.
///
/// Implementations bind an embedding provider and a chunker at
/// construction time, so the model that embeds indexed chunks is by
/// construction the model that embeds queries.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_rag::{Document, LocalVectorIndex, VectorIndex};
///
/// let index = LocalVectorIndex::new("./data/index.json", chunker, embedder);
/// index.load().await?;
/// index.add_documents(&[Document::new("doc-1", "...")]).await?;
/// let results = index.search("refund window", 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short name of the backing store, used in error and log context.
    fn backend(&self) -> &str;

    /// Prepare the index for use.
    ///
    /// The local-file variant deserializes its on-disk snapshot here (a
    /// missing file starts an empty index); remote variants are always
    /// "loaded" and treat this as a no-op.
    async fn load(&self) -> Result<()>;

    /// Chunk, embed, and store the given documents.
    ///
    /// Returns the number of chunks added. Chunks, not whole documents,
    /// are the unit of storage and retrieval.
    async fn add_documents(&self, documents: &[Document]) -> Result<usize>;

    /// Retrieve up to `k` chunks most relevant to the query text, in
    /// descending relevance order.
    ///
    /// An empty index yields an empty `Vec`, not an error. Score scales
    /// are backend-specific and not comparable across variants.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Delete a stored vector by ID.
    ///
    /// Backends without delete support return the distinct
    /// [`RagError::Unsupported`](ragstack_core::RagError::Unsupported)
    /// outcome rather than silently succeeding.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// The current number of indexed chunks.
    ///
    /// Remote variants query this live from the backend, so it may lag
    /// concurrent writes; it is exact across sequential calls.
    async fn document_count(&self) -> Result<usize>;
}

//! Local file-backed vector index using cosine similarity.
//!
//! The whole index lives in memory behind a `tokio::sync::RwLock` and is
//! written through to a single JSON snapshot on every add. The snapshot
//! records the embedding model name; loading it with a different
//! configured model is a configuration error rather than a silent
//! mismatch between index-time and query-time embeddings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ragstack_core::error::{RagError, Result};

use crate::chunking::Chunker;
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::vectorstore::VectorIndex;

const BACKEND: &str = "local";

/// One stored vector: the embedded chunk plus everything needed to cite it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVector {
    /// Opaque storage identifier (UUID v4, assigned on add).
    pub id: String,
    /// The embedding of `content`.
    pub embedding: Vec<f32>,
    /// The chunk text, retrievable for citation.
    pub content: String,
    /// Chunk metadata.
    pub metadata: HashMap<String, String>,
}

/// On-disk snapshot format: the embedding model the index is bound to,
/// plus every stored vector. No separate manifest or versioning.
#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    model: String,
    vectors: Vec<StoredVector>,
}

/// A [`VectorIndex`] persisted as a single on-disk JSON snapshot.
///
/// Writes are serialized: the write lock is held across the in-memory
/// append *and* the snapshot save, so concurrent `add_documents` calls
/// cannot interleave their read-modify-write. There is no write-ahead
/// log; a crash mid-write may corrupt the snapshot, which then surfaces
/// as an index error on the next load.
pub struct LocalVectorIndex {
    path: PathBuf,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: RwLock<Vec<StoredVector>>,
}

impl LocalVectorIndex {
    /// Create an index persisted at `path`, bound to the given chunker and
    /// embedding provider. Call [`load`](VectorIndex::load) before use.
    pub fn new(
        path: impl Into<PathBuf>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self { path: path.into(), chunker, embedder, vectors: RwLock::new(Vec::new()) }
    }

    fn map_io_err(e: std::io::Error) -> RagError {
        RagError::Index { backend: BACKEND.to_string(), message: e.to_string() }
    }

    /// Serialize the full index to disk. Callers must hold the write lock.
    async fn save(&self, vectors: &[StoredVector]) -> Result<()> {
        let snapshot = IndexSnapshot {
            model: self.embedder.model_name().to_string(),
            vectors: vectors.to_vec(),
        };
        let bytes = serde_json::to_vec(&snapshot).map_err(|e| RagError::Index {
            backend: BACKEND.to_string(),
            message: format!("failed to serialize index: {e}"),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(Self::map_io_err)?;
            }
        }
        tokio::fs::write(&self.path, bytes).await.map_err(Self::map_io_err)?;
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn load(&self) -> Result<()> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no existing index snapshot, starting empty");
                return Ok(());
            }
            Err(e) => return Err(Self::map_io_err(e)),
        };

        let snapshot: IndexSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            RagError::Index {
                backend: BACKEND.to_string(),
                message: format!("failed to parse index snapshot: {e}"),
            }
        })?;

        if snapshot.model != self.embedder.model_name() {
            return Err(RagError::Config(format!(
                "index at {} was built with embedding model '{}' but '{}' is configured",
                self.path.display(),
                snapshot.model,
                self.embedder.model_name()
            )));
        }

        let count = snapshot.vectors.len();
        *self.vectors.write().await = snapshot.vectors;
        info!(path = %self.path.display(), count, "loaded index snapshot");
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        let chunks: Vec<_> = documents.iter().flat_map(|doc| self.chunker.chunk(doc)).collect();
        if chunks.is_empty() {
            return Ok(0);
        }

        // Embed before taking the lock: no lock across the network call.
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let added: Vec<StoredVector> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredVector {
                id: Uuid::new_v4().to_string(),
                embedding,
                content: chunk.text,
                metadata: chunk.metadata,
            })
            .collect();
        let added_count = added.len();

        // The write lock is held across the append and the snapshot save so
        // concurrent adds serialize and the write-through stays consistent.
        let mut vectors = self.vectors.write().await;
        vectors.extend(added);
        if let Err(e) = self.save(&vectors).await {
            // In-memory state is now ahead of disk; surface the failure.
            warn!(path = %self.path.display(), error = %e, "index snapshot save failed");
            return Err(e);
        }

        debug!(added = added_count, total = vectors.len(), "added chunks to local index");
        Ok(added_count)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;

        let vectors = self.vectors.read().await;
        let mut scored: Vec<SearchResult> = vectors
            .iter()
            .map(|stored| SearchResult {
                content: stored.content.clone(),
                metadata: stored.metadata.clone(),
                score: Some(cosine_similarity(&stored.embedding, &query_embedding)),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete(&self, _id: &str) -> Result<bool> {
        Err(RagError::Unsupported {
            backend: BACKEND.to_string(),
            operation: "delete".to_string(),
        })
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.vectors.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.5f32, -0.25, 0.75];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}

//! Qdrant-backed remote vector index.
//!
//! Implements [`VectorIndex`] over the
//! [qdrant-client](https://docs.rs/qdrant-client) crate (gRPC). Nothing is
//! persisted locally: the hosted service owns the data, upserts are
//! batched to respect payload limits, and counts come live from the
//! backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, PointStruct, PointsIdsList,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;
use uuid::Uuid;

use ragstack_core::error::{RagError, Result};

use crate::chunking::Chunker;
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::vectorstore::VectorIndex;

const BACKEND: &str = "qdrant";

/// Upsert batch size; batches are sent in order and never reordered.
const UPSERT_BATCH_SIZE: usize = 100;

/// A [`VectorIndex`] backed by a hosted [Qdrant](https://qdrant.tech/)
/// collection with cosine distance.
///
/// The collection is created lazily (and idempotently) on the first add,
/// sized to the bound embedding provider's dimensionality.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QdrantVectorIndex {
    /// Connect to a Qdrant instance at `url`, targeting `collection`.
    pub fn connect(
        url: &str,
        collection: impl Into<String>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client, collection: collection.into(), chunker, embedder })
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::Index { backend: BACKEND.to_string(), message: e.to_string() }
    }

    async fn collection_exists(&self) -> Result<bool> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        Ok(collections.collections.iter().any(|c| c.name == self.collection))
    }

    /// Create the collection if it does not exist yet.
    async fn ensure_collection(&self) -> Result<()> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let dimensions = self.embedder.dimensions();
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(dimensions as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, dimensions, "created qdrant collection");
        Ok(())
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn load(&self) -> Result<()> {
        // The hosted service is always "loaded"; nothing to restore.
        debug!(collection = %self.collection, "remote index requires no load step");
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        let chunks: Vec<_> = documents.iter().flat_map(|doc| self.chunker.chunk(doc)).collect();
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        self.ensure_collection().await?;

        let points: Vec<PointStruct> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut payload_map = serde_json::Map::new();
                payload_map
                    .insert("text".to_string(), serde_json::Value::String(chunk.text.clone()));
                payload_map.insert(
                    "document_id".to_string(),
                    serde_json::Value::String(chunk.document_id.clone()),
                );
                let metadata_obj: serde_json::Map<String, serde_json::Value> = chunk
                    .metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                payload_map.insert("metadata".to_string(), serde_json::Value::Object(metadata_obj));

                let payload =
                    Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

                PointStruct::new(Uuid::new_v4().to_string(), embedding, payload)
            })
            .collect();

        let total = points.len();

        // Ordered batches keep the upsert within backend payload limits
        // without reordering or duplicating vectors.
        for batch in points.chunks(UPSERT_BATCH_SIZE) {
            self.client
                .upsert_points(
                    UpsertPointsBuilder::new(&self.collection, batch.to_vec()).wait(true),
                )
                .await
                .map_err(Self::map_err)?;
        }

        debug!(collection = %self.collection, count = total, "upserted chunks to qdrant");
        Ok(total)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        // Nothing indexed yet: an empty index is not an error.
        if !self.collection_exists().await? {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query_embedding, k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let content = scored
                    .payload
                    .get("text")
                    .and_then(Self::extract_string)
                    .unwrap_or_default();

                let metadata: HashMap<String, String> = scored
                    .payload
                    .get("metadata")
                    .and_then(|v| match &v.kind {
                        Some(Kind::StructValue(s)) => Some(
                            s.fields
                                .iter()
                                .filter_map(|(k, v)| {
                                    Self::extract_string(v).map(|s| (k.clone(), s))
                                })
                                .collect(),
                        ),
                        _ => None,
                    })
                    .unwrap_or_default();

                SearchResult { content, metadata, score: Some(scored.score) }
            })
            .collect();

        Ok(results)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList { ids: vec![id.to_string().into()] })
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, id, "deleted point from qdrant");
        Ok(true)
    }

    async fn document_count(&self) -> Result<usize> {
        if !self.collection_exists().await? {
            return Ok(0);
        }

        let info = self.client.collection_info(&self.collection).await.map_err(Self::map_err)?;
        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0) as usize)
    }
}

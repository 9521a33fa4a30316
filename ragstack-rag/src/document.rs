//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document containing text content and metadata.
///
/// Documents are created by the ingestion path and never mutated by the
/// pipeline; chunking reads them, indexing copies from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A segment of a [`Document`]: the unit that is embedded and indexed.
///
/// Chunk text never exceeds the configured chunk size (in characters) and
/// inherits the parent document's metadata plus a `chunk_index` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier derived from the parent document (`{document_id}_{index}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Key-value metadata inherited from the parent document.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved chunk paired with a relevance score.
///
/// Results are ephemeral: produced per query, never persisted. They are
/// ordered by descending relevance; the score scale depends on the backend
/// and must not be compared across backend variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk text.
    pub content: String,
    /// Metadata stored alongside the chunk.
    pub metadata: HashMap<String, String>,
    /// Backend-specific relevance score, if the backend reports one.
    pub score: Option<f32>,
}

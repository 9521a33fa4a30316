//! Deterministic mock embedding provider for tests and offline development.

use async_trait::async_trait;

use ragstack_core::error::Result;

use crate::embedding::EmbeddingProvider;

/// A deterministic, hash-based [`EmbeddingProvider`].
///
/// Identical text always produces an identical L2-normalised vector, so
/// searching an index with a chunk's own text returns that chunk with a
/// cosine score of 1.0. There is no semantic structure: this exists for
/// tests and zero-API-key demos, not for real retrieval quality.
pub struct MockEmbeddingProvider {
    model: String,
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a provider producing vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { model: "mock-embedding".into(), dimensions }
    }

    /// Override the reported model name (for model-binding tests).
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Hash the bytes, then derive a normalised vector whose direction
        // depends only on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, value) in embedding.iter_mut().enumerate() {
            *value = ((hash.wrapping_add(i as u64)) as f32).sin();
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_same_vector() {
        let provider = MockEmbeddingProvider::new(32);
        let a = provider.embed("hello").await.unwrap();
        let b = provider.embed("hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[tokio::test]
    async fn different_text_different_vector() {
        let provider = MockEmbeddingProvider::new(32);
        let a = provider.embed("hello").await.unwrap();
        let b = provider.embed("goodbye").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_normalised() {
        let provider = MockEmbeddingProvider::new(64);
        let v = provider.embed("normalise me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}

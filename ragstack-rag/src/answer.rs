//! Answer packaging: the response shape returned to callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ragstack_core::types::Usage;

use crate::document::SearchResult;

/// Maximum characters of source content returned in a citation excerpt.
pub const MAX_EXCERPT_CHARS: usize = 300;

/// A citation: a bounded excerpt of a retrieved chunk.
///
/// Truncation is display-only; the full chunk text is what was sent to
/// the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceExcerpt {
    /// Chunk text, truncated to [`MAX_EXCERPT_CHARS`] characters with a
    /// trailing `...` marker when truncation occurred.
    pub content: String,
    /// Metadata stored alongside the chunk.
    pub metadata: HashMap<String, String>,
    /// Backend-specific relevance score, if reported.
    pub score: Option<f32>,
}

impl SourceExcerpt {
    /// Build an excerpt from a search result, truncating its content.
    pub fn from_result(result: &SearchResult) -> Self {
        Self {
            content: truncate_excerpt(&result.content),
            metadata: result.metadata.clone(),
            score: result.score,
        }
    }
}

/// A grounded answer with citations and provider metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Unique identifier for this answer.
    pub id: Uuid,
    /// The generated answer text.
    pub answer: String,
    /// Source excerpts, in retrieval (relevance) order.
    pub sources: Vec<SourceExcerpt>,
    /// The model that generated the answer (`"none"` when retrieval was
    /// empty and generation was skipped).
    pub model: String,
    /// Token accounting for the generation (zero when skipped).
    pub usage: Usage,
}

/// Truncate content to at most [`MAX_EXCERPT_CHARS`] characters, appending
/// an ellipsis marker when anything was cut. Operates on characters, never
/// splitting a UTF-8 code point.
fn truncate_excerpt(content: &str) -> String {
    if content.chars().count() <= MAX_EXCERPT_CHARS {
        return content.to_string();
    }
    let mut excerpt: String = content.chars().take(MAX_EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_excerpt("short"), "short");
    }

    #[test]
    fn content_at_the_limit_is_untouched() {
        let content = "a".repeat(MAX_EXCERPT_CHARS);
        assert_eq!(truncate_excerpt(&content), content);
    }

    #[test]
    fn long_content_is_truncated_with_marker() {
        let content = "a".repeat(MAX_EXCERPT_CHARS + 1);
        let excerpt = truncate_excerpt(&content);
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let content = "é".repeat(MAX_EXCERPT_CHARS + 50);
        let excerpt = truncate_excerpt(&content);
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS + 3);
    }
}

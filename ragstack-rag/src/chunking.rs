//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`],
//! a greedy splitter that prefers natural boundaries (paragraphs, then
//! sentences, then words) and falls back to raw character windows only
//! when no boundary fits the size budget. Retrieval quality depends on
//! chunks not truncating mid-sentence.

use crate::document::{Chunk, Document};

/// Separator cascade, largest natural boundary first.
const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations must be deterministic: the same document with the same
/// parameters always yields the same chunk sequence.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → sentences → words → characters.
///
/// Sizes are measured in characters. Chunk IDs are generated as
/// `{document_id}_{chunk_index}` and each chunk inherits the parent
/// document's metadata plus a `chunk_index` field.
///
/// Parameter validation (`chunk_overlap < chunk_size`, both positive) is
/// the configuration layer's job and happens once at startup, not per call.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — overlapping characters between consecutive
    ///   chunks at the character-window fallback level
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so concatenating the segments reproduces the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Raw character windows with overlap — the last-resort split when no
/// separator fits the budget.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        let step = chunk_size.saturating_sub(chunk_overlap);
        if step == 0 || end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

/// Flush one oversized or completed segment into the chunk list,
/// recursing to the next separator level when it exceeds the budget.
fn flush_segment(
    chunks: &mut Vec<String>,
    segment: String,
    chunk_size: usize,
    chunk_overlap: usize,
    remaining_separators: &[&str],
) {
    if char_len(&segment) > chunk_size {
        chunks.extend(split_and_merge(&segment, chunk_size, chunk_overlap, remaining_separators));
    } else {
        chunks.push(segment);
    }
}

/// Split text by a separator, then greedily merge segments into chunks
/// that respect `chunk_size`. Segments that still exceed the budget are
/// split further using the next-level separator.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size || separators.is_empty() {
        return split_by_size(text, chunk_size, chunk_overlap);
    }

    let separator = separators[0];
    let remaining_separators = &separators[1..];
    let segments = split_keeping_separator(text, separator);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for segment in segments {
        let segment_len = char_len(segment);
        if current.is_empty() {
            current.push_str(segment);
            current_len = segment_len;
        } else if current_len + segment_len <= chunk_size {
            current.push_str(segment);
            current_len += segment_len;
        } else {
            flush_segment(&mut chunks, current, chunk_size, chunk_overlap, remaining_separators);
            current = segment.to_string();
            current_len = segment_len;
        }
    }

    if !current.is_empty() {
        flush_segment(&mut chunks, current, chunk_size, chunk_overlap, remaining_separators);
    }

    chunks
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let raw_chunks =
            split_and_merge(&document.text, self.chunk_size, self.chunk_overlap, &SEPARATORS);

        raw_chunks
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text,
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("doc", text)
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let chunker = RecursiveChunker::new(100, 10);
        assert!(chunker.chunk(&doc("")).is_empty());
    }

    #[test]
    fn small_document_is_a_single_chunk() {
        let chunker = RecursiveChunker::new(500, 50);
        let chunks = chunker.chunk(&doc("Refunds are processed within 14 days."));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc_0");
        assert_eq!(chunks[0].text, "Refunds are processed within 14 days.");
        assert_eq!(chunks[0].metadata.get("chunk_index").map(String::as_str), Some("0"));
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = RecursiveChunker::new(40, 10);
        let text = "First paragraph about apples.\n\nSecond paragraph about pears. \
                    A third sentence! And a fourth one? Plus trailing words here.";
        let first = chunker.chunk(&doc(text));
        let second = chunker.chunk(&doc(text));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn every_chunk_respects_size_budget() {
        let chunker = RecursiveChunker::new(40, 10);
        let text = "First paragraph about apples.\n\nSecond paragraph about pears. \
                    A third sentence! And a fourth one? Plus many more trailing words \
                    that must be split at word boundaries because the sentence is long.";
        for chunk in chunker.chunk(&doc(text)) {
            assert!(
                chunk.text.chars().count() <= 40,
                "chunk exceeds budget: {:?}",
                chunk.text
            );
        }
    }

    #[test]
    fn paragraph_boundaries_are_preferred() {
        let chunker = RecursiveChunker::new(40, 5);
        let text = "Short first paragraph here.\n\nShort second paragraph too.";
        let chunks = chunker.chunk(&doc(text));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Short first paragraph here.\n\n");
        assert_eq!(chunks[1].text, "Short second paragraph too.");
    }

    #[test]
    fn separator_free_text_falls_back_to_overlapping_windows() {
        let chunker = RecursiveChunker::new(5, 2);
        let chunks = chunker.chunk(&doc("abcdefghij"));

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcde", "defgh", "ghij"]);
        // Adjacent windows share exactly chunk_overlap characters.
        for pair in texts.windows(2) {
            let prev_tail: String = pair[0].chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
            assert!(pair[1].starts_with(&prev_tail));
        }
    }

    #[test]
    fn multibyte_text_does_not_panic_and_respects_budget() {
        let chunker = RecursiveChunker::new(4, 1);
        let chunks = chunker.chunk(&doc("àéîõü—αβγδ"));

        assert!(!chunks.is_empty());
        for chunk in chunks {
            assert!(chunk.text.chars().count() <= 4);
        }
    }

    #[test]
    fn chunks_inherit_document_metadata() {
        let chunker = RecursiveChunker::new(100, 10);
        let document = Document::new("doc", "Some text.").with_metadata("source", "upload");
        let chunks = chunker.chunk(&document);

        assert_eq!(chunks[0].metadata.get("source").map(String::as_str), Some("upload"));
        assert_eq!(chunks[0].document_id, "doc");
    }
}

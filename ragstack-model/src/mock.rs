//! Mock LLM for tests and offline development.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream;

use ragstack_core::error::Result;
use ragstack_core::llm::{Llm, TokenStream};
use ragstack_core::types::{
    ChatMessage, FinishReason, GenerationParams, GenerationResult, Usage,
};

/// A deterministic [`Llm`] that returns a canned response.
///
/// Records how many times it was invoked so tests can assert that the
/// orchestrator short-circuits without calling the generator.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_model::MockLlm;
///
/// let llm = MockLlm::new("The refund window is 14 days.");
/// assert_eq!(llm.call_count(), 0);
/// ```
pub struct MockLlm {
    response: String,
    model: String,
    calls: AtomicUsize,
}

impl MockLlm {
    /// Create a mock that always answers with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into(), model: "mock-llm".into(), calls: AtomicUsize::new(0) }
    }

    /// Number of `generate`/`generate_stream` invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Rough token estimate so usage numbers look plausible in tests.
    fn approx_tokens(char_count: usize) -> u32 {
        (char_count as u32 / 4).max(1)
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        _params: GenerationParams,
    ) -> Result<GenerationResult> {
        self.record_call();

        let prompt_len: usize = messages.iter().map(|m| m.content.len()).sum();
        let usage = Usage::new(Self::approx_tokens(prompt_len), Self::approx_tokens(self.response.len()));

        Ok(GenerationResult {
            content: self.response.clone(),
            model: self.model.clone(),
            usage,
            finish_reason: FinishReason::Stop,
        })
    }

    async fn generate_stream(
        &self,
        _messages: &[ChatMessage],
        _params: GenerationParams,
    ) -> Result<TokenStream> {
        self.record_call();

        // Word-level deltas whose concatenation reproduces the response.
        let deltas: Vec<Result<String>> = self
            .response
            .split_inclusive(' ')
            .map(|piece| Ok(piece.to_string()))
            .collect();

        Ok(Box::pin(stream::iter(deltas)))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn generate_returns_canned_response() {
        let llm = MockLlm::new("canned answer");
        let result =
            llm.generate(&[ChatMessage::user("q")], GenerationParams::default()).await.unwrap();

        assert_eq!(result.content, "canned answer");
        assert_eq!(result.finish_reason, FinishReason::Stop);
        assert!(result.usage.total_tokens > 0);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn stream_deltas_concatenate_to_response() {
        let llm = MockLlm::new("one two three");
        let stream =
            llm.generate_stream(&[ChatMessage::user("q")], GenerationParams::default())
                .await
                .unwrap();

        let deltas: Vec<String> =
            stream.map(|delta| delta.unwrap()).collect::<Vec<_>>().await;

        assert!(deltas.len() > 1);
        assert_eq!(deltas.concat(), "one two three");
    }

    #[tokio::test]
    async fn call_count_tracks_invocations() {
        let llm = MockLlm::new("a");
        assert_eq!(llm.call_count(), 0);
        llm.generate(&[ChatMessage::user("q")], GenerationParams::default()).await.unwrap();
        llm.generate_stream(&[ChatMessage::user("q")], GenerationParams::default()).await.unwrap();
        assert_eq!(llm.call_count(), 2);
    }
}

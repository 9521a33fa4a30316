//! The generation adapter contract implemented by every LLM provider.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::types::{ChatMessage, GenerationParams, GenerationResult};

/// A lazy, finite, non-restartable sequence of generated text deltas.
///
/// Deltas arrive in the exact order the provider produced them and the
/// stream terminates when the provider signals completion; there is no
/// separate end-of-stream value. A transport failure mid-stream surfaces
/// as an `Err` item rather than a silently truncated clean ending.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// An LLM provider capable of synchronous and streaming generation.
///
/// Implementations are constructed once per process configuration and are
/// safe to share across concurrent requests. Providers backed by a client
/// that is not natively asynchronous must run their calls on a blocking
/// worker pool so they never stall the async executor.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_core::{ChatMessage, GenerationParams, Llm};
///
/// let messages = vec![ChatMessage::user("Hello")];
/// let result = llm.generate(&messages, GenerationParams::default()).await?;
/// println!("{}", result.content);
/// ```
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model identifier this provider generates with.
    fn name(&self) -> &str;

    /// Generate a complete response in a single round trip.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<GenerationResult>;

    /// Generate a response as an ordered stream of text deltas.
    ///
    /// Dropping the returned stream cancels the generation; the provider
    /// must remain usable for subsequent requests.
    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<TokenStream>;
}

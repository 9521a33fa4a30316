//! Chat and generation data types shared by every LLM provider.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The role of a [`ChatMessage`] author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation. Must precede user messages.
    System,
    /// The querying end of the conversation.
    User,
    /// The model's side of the conversation.
    Assistant,
}

/// A single message in a generation request.
///
/// Message ordering is significant: a system message, if present, must come
/// before the user message it frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored this message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Token accounting reported by a provider for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens produced by the model.
    pub completion_tokens: u32,
    /// Sum of prompt and completion tokens.
    pub total_tokens: u32,
}

impl Usage {
    /// Create a usage record, deriving the total from the two parts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self { prompt_tokens, completion_tokens, total_tokens: prompt_tokens + completion_tokens }
    }
}

/// Why the model stopped generating, normalized across providers.
///
/// Provider-specific vocabularies ("stop", "end_turn", "max_tokens", ...)
/// are mapped to this enum at each provider boundary so callers never see
/// provider wording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model finished its answer naturally.
    Stop,
    /// Generation hit the `max_tokens` budget.
    Length,
    /// Any other provider-specific reason, preserved verbatim.
    Other(String),
}

/// The complete output of a single (non-streaming) generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// The generated text.
    pub content: String,
    /// The model that produced the text, as reported by the provider.
    pub model: String,
    /// Token accounting for this generation.
    pub usage: Usage,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

/// Sampling parameters for a generation request.
///
/// Validated on construction: `temperature` in `[0.0, 2.0]` and
/// `max_tokens` in `[1, 4096]`. Providers may additionally apply their own
/// server-side bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature in `[0.0, 2.0]`.
    pub temperature: f32,
    /// Maximum completion tokens in `[1, 4096]`.
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Largest accepted `max_tokens` value.
    pub const MAX_TOKENS_LIMIT: u32 = 4096;

    /// Create validated generation parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if either parameter is out of range.
    pub fn new(temperature: f32, max_tokens: u32) -> Result<Self> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(RagError::Config(format!(
                "temperature ({temperature}) must be in [0.0, 2.0]"
            )));
        }
        if max_tokens == 0 || max_tokens > Self::MAX_TOKENS_LIMIT {
            return Err(RagError::Config(format!(
                "max_tokens ({max_tokens}) must be in [1, {}]",
                Self::MAX_TOKENS_LIMIT
            )));
        }
        Ok(Self { temperature, max_tokens })
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 1024 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn role_serialization_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn usage_new_derives_total() {
        let usage = Usage::new(10, 32);
        assert_eq!(usage.total_tokens, 42);
    }

    #[test]
    fn params_accept_range_boundaries() {
        assert!(GenerationParams::new(0.0, 1).is_ok());
        assert!(GenerationParams::new(2.0, 4096).is_ok());
    }

    #[test]
    fn params_reject_out_of_range() {
        assert!(matches!(GenerationParams::new(-0.1, 1024), Err(RagError::Config(_))));
        assert!(matches!(GenerationParams::new(2.1, 1024), Err(RagError::Config(_))));
        assert!(matches!(GenerationParams::new(0.7, 0), Err(RagError::Config(_))));
        assert!(matches!(GenerationParams::new(0.7, 4097), Err(RagError::Config(_))));
    }

    #[test]
    fn params_default_matches_service_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.max_tokens, 1024);
    }
}

//! OpenAI chat completion provider.
//!
//! Wraps the [`async-openai`](https://docs.rs/async-openai) client behind
//! the [`Llm`] trait. Also works with OpenAI-compatible APIs via
//! [`OpenAiLlm::compatible`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, FinishReason as OpenAiFinishReason,
};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error};

use ragstack_core::error::{RagError, Result};
use ragstack_core::llm::{Llm, TokenStream};
use ragstack_core::types::{
    ChatMessage, FinishReason, GenerationParams, GenerationResult, Role, Usage,
};

/// An [`Llm`] backed by the OpenAI chat completions API.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_model::OpenAiLlm;
///
/// let llm = OpenAiLlm::new(std::env::var("OPENAI_API_KEY")?, "gpt-4o")?;
/// let result = llm.generate(&messages, GenerationParams::default()).await?;
/// ```
pub struct OpenAiLlm {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLlm {
    /// Create a new OpenAI provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the API key is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Generation {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        let config = OpenAIConfig::new().with_api_key(api_key);
        Ok(Self { client: Client::with_config(config), model: model.into() })
    }

    /// Create a provider for an OpenAI-compatible API at a custom base URL.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Generation {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        let config = OpenAIConfig::new().with_api_key(api_key).with_api_base(base_url.into());
        Ok(Self { client: Client::with_config(config), model: model.into() })
    }

    fn map_err(e: impl std::fmt::Display) -> RagError {
        RagError::Generation { provider: "OpenAI".into(), message: e.to_string() }
    }
}

/// Convert pipeline messages into the OpenAI request vocabulary.
fn convert_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages
        .iter()
        .map(|m| {
            let converted = match m.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(m.content.as_str())
                    .build()
                    .map(ChatCompletionRequestMessage::System),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(m.content.as_str())
                    .build()
                    .map(ChatCompletionRequestMessage::User),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(m.content.as_str())
                    .build()
                    .map(ChatCompletionRequestMessage::Assistant),
            };
            converted.map_err(OpenAiLlm::map_err)
        })
        .collect()
}

/// Map the OpenAI finish-reason vocabulary to the normalized enum.
fn map_finish_reason(reason: Option<OpenAiFinishReason>) -> FinishReason {
    match reason {
        Some(OpenAiFinishReason::Stop) => FinishReason::Stop,
        Some(OpenAiFinishReason::Length) => FinishReason::Length,
        Some(OpenAiFinishReason::ToolCalls) => FinishReason::Other("tool_calls".into()),
        Some(OpenAiFinishReason::ContentFilter) => FinishReason::Other("content_filter".into()),
        Some(OpenAiFinishReason::FunctionCall) => FinishReason::Other("function_call".into()),
        None => FinishReason::Other("unknown".into()),
    }
}

#[async_trait]
impl Llm for OpenAiLlm {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<GenerationResult> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(convert_messages(messages)?)
            .temperature(params.temperature)
            .max_tokens(params.max_tokens)
            .build()
            .map_err(Self::map_err)?;

        debug!(provider = "OpenAI", model = %self.model, "sending generation request");

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "generation request failed");
            Self::map_err(e)
        })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| RagError::Generation {
            provider: "OpenAI".into(),
            message: "API returned no choices".into(),
        })?;

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(GenerationResult {
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            usage,
            finish_reason: map_finish_reason(choice.finish_reason),
        })
    }

    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<TokenStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(convert_messages(messages)?)
            .temperature(params.temperature)
            .max_tokens(params.max_tokens)
            .stream(true)
            .build()
            .map_err(Self::map_err)?;

        let client = self.client.clone();

        let stream = try_stream! {
            let mut inner = client.chat().create_stream(request).await.map_err(|e| {
                error!(provider = "OpenAI", error = %e, "failed to open stream");
                OpenAiLlm::map_err(e)
            })?;

            while let Some(result) = inner.next().await {
                match result {
                    Ok(chunk) => {
                        if let Some(delta) =
                            chunk.choices.first().and_then(|c| c.delta.content.clone())
                        {
                            if !delta.is_empty() {
                                yield delta;
                            }
                        }
                    }
                    Err(e) => {
                        error!(provider = "OpenAI", error = %e, "stream error");
                        Err(OpenAiLlm::map_err(e))?;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_mapping_is_normalized() {
        assert_eq!(map_finish_reason(Some(OpenAiFinishReason::Stop)), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some(OpenAiFinishReason::Length)), FinishReason::Length);
        assert_eq!(
            map_finish_reason(Some(OpenAiFinishReason::ContentFilter)),
            FinishReason::Other("content_filter".into())
        );
        assert_eq!(map_finish_reason(None), FinishReason::Other("unknown".into()));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(OpenAiLlm::new("", "gpt-4o").is_err());
    }

    #[test]
    fn name_reports_model() {
        let llm = OpenAiLlm::new("test-key", "gpt-4o-mini").unwrap();
        assert_eq!(llm.name(), "gpt-4o-mini");
    }

    #[test]
    fn convert_messages_preserves_order() {
        let messages =
            vec![ChatMessage::system("instructions"), ChatMessage::user("question")];
        let converted = convert_messages(&messages).unwrap();
        assert_eq!(converted.len(), 2);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
    }
}

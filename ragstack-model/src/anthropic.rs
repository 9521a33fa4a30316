//! Anthropic messages provider.
//!
//! The Anthropic client here is a synchronous `reqwest::blocking` client,
//! so every call runs under [`tokio::task::spawn_blocking`] and streaming
//! is bridged to the async world through a bounded mpsc channel. The
//! blocking pool keeps slow generations from stalling concurrent request
//! processing.

use std::io::{BufRead, BufReader};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

use ragstack_core::error::{RagError, Result};
use ragstack_core::llm::{Llm, TokenStream};
use ragstack_core::types::{
    ChatMessage, FinishReason, GenerationParams, GenerationResult, Role, Usage,
};

/// The Anthropic messages API endpoint.
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// The API version header value required by the messages API.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Channel capacity for bridging streamed deltas to the async consumer.
const STREAM_CHANNEL_CAPACITY: usize = 32;

/// An [`Llm`] backed by the Anthropic messages API through a blocking
/// HTTP client.
///
/// # Example
///
/// ```rust,ignore
/// use ragstack_model::AnthropicLlm;
///
/// let llm = AnthropicLlm::new(
///     std::env::var("ANTHROPIC_API_KEY")?,
///     "claude-3-5-sonnet-20241022",
/// )?;
/// ```
pub struct AnthropicLlm {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl AnthropicLlm {
    /// Create a new Anthropic provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the API key is empty or the
    /// HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Generation {
                provider: "Anthropic".into(),
                message: "API key must not be empty".into(),
            });
        }

        // No client-side timeout: cancellation policy belongs to the caller.
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(Self::map_err)?;

        Ok(Self { client, api_key, model: model.into() })
    }

    fn map_err(e: impl std::fmt::Display) -> RagError {
        RagError::Generation { provider: "Anthropic".into(), message: e.to_string() }
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
        stream: bool,
    ) -> MessagesRequest {
        // The messages API takes system instructions as a top-level field,
        // not as a message.
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone());

        let wire_messages = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: match m.role {
                    Role::Assistant => "assistant".into(),
                    _ => "user".into(),
                },
                content: m.content.clone(),
            })
            .collect();

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: wire_messages,
            system,
            stream,
        }
    }
}

// ── Anthropic API request/response types ───────────────────────────

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: WireUsage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map the Anthropic stop-reason vocabulary to the normalized enum.
fn map_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::Length,
        Some(other) => FinishReason::Other(other.to_string()),
        None => FinishReason::Other("unknown".into()),
    }
}

/// One decoded server-sent event from the streaming messages API.
#[derive(Debug, PartialEq)]
enum StreamEvent {
    /// A text increment.
    Delta(String),
    /// The provider signalled normal completion.
    Stop,
    /// The provider reported an error mid-stream.
    Error(String),
}

/// Decode the payload of one `data:` SSE line. Events that carry no text
/// and no terminal meaning (`message_start`, `ping`, ...) map to `None`.
fn parse_stream_event(data: &str) -> Option<StreamEvent> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    match value.get("type").and_then(|t| t.as_str())? {
        "content_block_delta" => value
            .pointer("/delta/text")
            .and_then(|t| t.as_str())
            .map(|s| StreamEvent::Delta(s.to_string())),
        "message_stop" => Some(StreamEvent::Stop),
        "error" => Some(StreamEvent::Error(
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("provider error")
                .to_string(),
        )),
        _ => None,
    }
}

/// Turn a non-success HTTP response into a generation error, preserving
/// the provider's error message when the body parses.
fn error_from_response(resp: reqwest::blocking::Response) -> RagError {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    RagError::Generation {
        provider: "Anthropic".into(),
        message: format!("API returned {status}: {detail}"),
    }
}

#[async_trait]
impl Llm for AnthropicLlm {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<GenerationResult> {
        let request = self.build_request(messages, params, false);
        let client = self.client.clone();
        let api_key = self.api_key.clone();

        debug!(provider = "Anthropic", model = %self.model, "sending generation request");

        // The blocking client never runs on the async executor.
        let response = tokio::task::spawn_blocking(move || -> Result<MessagesResponse> {
            let resp = client
                .post(ANTHROPIC_MESSAGES_URL)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
                .map_err(AnthropicLlm::map_err)?;

            if !resp.status().is_success() {
                return Err(error_from_response(resp));
            }

            resp.json::<MessagesResponse>().map_err(AnthropicLlm::map_err)
        })
        .await
        .map_err(|e| {
            error!(provider = "Anthropic", error = %e, "blocking task failed");
            Self::map_err(e)
        })??;

        let content: String = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        Ok(GenerationResult {
            content,
            model: response.model,
            usage: Usage::new(response.usage.input_tokens, response.usage.output_tokens),
            finish_reason: map_stop_reason(response.stop_reason.as_deref()),
        })
    }

    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<TokenStream> {
        let request = self.build_request(messages, params, true);
        let client = self.client.clone();
        let api_key = self.api_key.clone();

        let (tx, rx) = mpsc::channel::<Result<String>>(STREAM_CHANNEL_CAPACITY);

        tokio::task::spawn_blocking(move || {
            let resp = match client
                .post(ANTHROPIC_MESSAGES_URL)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
            {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.blocking_send(Err(AnthropicLlm::map_err(e)));
                    return;
                }
            };

            if !resp.status().is_success() {
                let _ = tx.blocking_send(Err(error_from_response(resp)));
                return;
            }

            let reader = BufReader::new(resp);
            let mut completed = false;

            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!(provider = "Anthropic", error = %e, "stream read failed");
                        let _ = tx.blocking_send(Err(RagError::Generation {
                            provider: "Anthropic".into(),
                            message: format!("stream read failed: {e}"),
                        }));
                        return;
                    }
                };

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };

                match parse_stream_event(data) {
                    Some(StreamEvent::Delta(text)) => {
                        // A send error means the consumer dropped the stream
                        // (cancellation); stop reading and exit cleanly.
                        if tx.blocking_send(Ok(text)).is_err() {
                            return;
                        }
                    }
                    Some(StreamEvent::Stop) => {
                        completed = true;
                        break;
                    }
                    Some(StreamEvent::Error(message)) => {
                        let _ = tx.blocking_send(Err(RagError::Generation {
                            provider: "Anthropic".into(),
                            message,
                        }));
                        return;
                    }
                    None => {}
                }
            }

            if !completed {
                let _ = tx.blocking_send(Err(RagError::Generation {
                    provider: "Anthropic".into(),
                    message: "stream ended before the provider signalled completion".into(),
                }));
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

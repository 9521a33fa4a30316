//! # ragstack-model
//!
//! LLM provider integrations for the ragstack RAG pipeline.
//!
//! ## Overview
//!
//! This crate provides [`ragstack_core::Llm`] implementations:
//!
//! - [`OpenAiLlm`] — OpenAI chat completions (GPT-4o, GPT-4o-mini, ...),
//!   natively async via `async-openai`
//! - [`AnthropicLlm`] — Anthropic messages API (Claude models) through a
//!   blocking client offloaded to the Tokio blocking pool
//! - [`MockLlm`] — deterministic mock for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragstack_core::{ChatMessage, GenerationParams, Llm};
//! use ragstack_model::OpenAiLlm;
//!
//! let llm = OpenAiLlm::new(std::env::var("OPENAI_API_KEY")?, "gpt-4o")?;
//! let messages = vec![ChatMessage::user("Why is the sky blue?")];
//! let result = llm.generate(&messages, GenerationParams::default()).await?;
//! ```
//!
//! Both real providers support token streaming with the same contract:
//! ordered deltas, natural termination, and `Err` items on transport
//! failure rather than silent truncation.

pub mod anthropic;
pub mod mock;
pub mod openai;

pub use anthropic::AnthropicLlm;
pub use mock::MockLlm;
pub use openai::OpenAiLlm;

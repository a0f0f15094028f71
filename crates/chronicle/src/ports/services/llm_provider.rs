//! LLM Provider Port
//!
//! Abstract interface for chat-completion calls used to write summaries and
//! recommendations over retrieved memories.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::services::reasoning::GenerationSettings;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Options for LLM completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl From<GenerationSettings> for CompletionOptions {
    fn from(settings: GenerationSettings) -> Self {
        Self {
            max_tokens: Some(settings.max_tokens),
            temperature: Some(settings.temperature),
        }
    }
}

/// Response from LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Token usage statistics
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat-completion provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError>;

    /// Single user prompt in, generated text out
    async fn complete_prompt(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, DomainError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self.complete(&messages, options).await?;
        Ok(response.content)
    }

    /// Provider name (e.g. "openrouter")
    fn provider_name(&self) -> &str;

    /// Model ID being used
    fn model_id(&self) -> &str;
}

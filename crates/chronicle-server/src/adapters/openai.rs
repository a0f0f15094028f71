//! OpenAI-compatible Chat Provider
//!
//! `/chat/completions` over reqwest. Works against OpenRouter (the default
//! base URL) and any other OpenAI-compatible gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use chronicle::{
    ChatMessage, CompletionOptions, CompletionResponse, DomainError, LlmProvider, RetryPolicy,
    TokenUsage,
};

const SERVICE: &str = "llm";

/// Connection settings for [`OpenAiChatProvider`]
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

/// [`LlmProvider`] for OpenAI-compatible chat completion APIs
pub struct OpenAiChatProvider {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiChatProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::upstream("init", SERVICE, e))?;

        Ok(Self { client, config })
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::upstream("complete", SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::upstream(
                "complete",
                SERVICE,
                format!("{}: {}", status, body),
            ));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::upstream("complete", SERVICE, e))?;

        into_completion(result, &self.config.model)
    }
}

fn into_completion(result: ChatResponse, requested_model: &str) -> Result<CompletionResponse, DomainError> {
    let choice = result
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::upstream("complete", SERVICE, "response has no choices"))?;

    let content = choice
        .message
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| DomainError::upstream("complete", SERVICE, "response has no content"))?;

    let usage = result
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        model: result.model.unwrap_or_else(|| requested_model.to_string()),
        usage,
        finish_reason: choice.finish_reason,
    })
}

#[async_trait]
impl LlmProvider for OpenAiChatProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        let response = self
            .config
            .retry
            .run("complete", || self.send(messages, options))
            .await?;

        tracing::debug!(
            "LLM completion: model={}, tokens={}",
            response.model,
            response.usage.total_tokens
        );
        Ok(response)
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle::ErrorKind;

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::user("What happened in 2019?")];
        let body = serde_json::to_value(ChatRequest {
            model: "openai/gpt-4o",
            messages: &messages,
            max_tokens: Some(800),
            temperature: Some(0.0),
        })
        .unwrap();

        assert_eq!(body["model"], "openai/gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "What happened in 2019?");
        assert_eq!(body["max_tokens"], 800);
    }

    #[test]
    fn test_response_parsing() {
        let raw = serde_json::json!({
            "model": "openai/gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "  Use the 2019 route. "}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        let completion = into_completion(parsed, "fallback").unwrap();

        assert_eq!(completion.content, "Use the 2019 route.");
        assert_eq!(completion.usage.total_tokens, 15);
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_empty_choices_is_upstream_failure() {
        let parsed: ChatResponse = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        let err = into_completion(parsed, "m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}

//! Shared fakes for service and route tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chronicle::{
    ChatMessage, CompletionOptions, CompletionResponse, DomainError, Embedder, LlmProvider,
    TokenUsage,
};

use crate::adapters::InMemoryVectorStore;
use crate::application::MemoryService;

pub const TEST_DIMENSION: usize = 16;

/// Deterministic bag-of-words embedder
#[derive(Default)]
pub struct WordEmbedder {
    pub text_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl WordEmbedder {
    pub fn vector(content: &str) -> Vec<f32> {
        let mut vector = vec![0.0; TEST_DIMENSION];
        for word in content
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % TEST_DIMENSION] += 1.0;
        }
        vector
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for WordEmbedder {
    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_image(&self, path: &Path) -> Result<Vec<f32>, DomainError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let path = path.to_string_lossy();
        if path.contains("missing") {
            return Err(DomainError::not_found("embed_image", "image", path));
        }
        Ok(Self::vector(&path))
    }
}

/// Canned LLM that records the prompts it receives
pub struct ScriptedLlm {
    pub reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
    pub delay: Option<std::time::Duration>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            reply: Err(cause.to_string()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn slow(reply: &str, delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(reply)
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.extend(messages.iter().map(|m| m.content.clone()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(content) => Ok(CompletionResponse {
                content: content.clone(),
                model: "scripted".to_string(),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            }),
            Err(cause) => Err(DomainError::upstream("complete", "llm", cause)),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Memory service over an in-memory store and a [`WordEmbedder`]
pub async fn memory_service() -> (MemoryService, Arc<WordEmbedder>) {
    let embedder = Arc::new(WordEmbedder::default());
    let service = MemoryService::new(
        Arc::new(InMemoryVectorStore::new("memories")),
        embedder.clone(),
    );
    service
        .bootstrap()
        .await
        .unwrap_or_else(|e| panic!("bootstrap failed: {}", e));
    (service, embedder)
}

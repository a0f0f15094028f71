//! Reasoning Application Service (Use Case)
//!
//! Summaries and recommendations over retrieved memories. The strategy is
//! fixed when the service is built: an LLM when a provider is configured,
//! deterministic templates otherwise. LLM failures are returned to the
//! caller, never papered over with a template answer.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use chronicle::reasoning::{
    self, GenerationSettings, RECOMMEND_SETTINGS, SUMMARY_SETTINGS,
};
use chronicle::{CompletionOptions, DomainError, LlmProvider, MemoryRecord};

/// How answers are produced
#[derive(Clone)]
pub enum ReasoningStrategy {
    Llm(Arc<dyn LlmProvider>),
    Template,
}

/// Application service for summarization and recommendation
pub struct ReasoningService {
    strategy: ReasoningStrategy,
}

impl ReasoningService {
    pub fn new(strategy: ReasoningStrategy) -> Self {
        Self { strategy }
    }

    /// LLM strategy when a provider is given, templates otherwise
    pub fn from_provider(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        match provider {
            Some(provider) => {
                tracing::info!(
                    "Reasoning via {} ({})",
                    provider.provider_name(),
                    provider.model_id()
                );
                Self::new(ReasoningStrategy::Llm(provider))
            }
            None => {
                tracing::warn!("No LLM configured - reasoning will use basic templates");
                Self::new(ReasoningStrategy::Template)
            }
        }
    }

    pub fn uses_llm(&self) -> bool {
        matches!(self.strategy, ReasoningStrategy::Llm(_))
    }

    /// Analysis and recommendation for `query`, with a sources footer
    pub async fn recommend(
        &self,
        query: &str,
        records: &[MemoryRecord],
        cancel: &CancellationToken,
    ) -> Result<String, DomainError> {
        match &self.strategy {
            ReasoningStrategy::Template => Ok(reasoning::fallback_recommendation(query, records)),
            ReasoningStrategy::Llm(provider) => {
                let prompt = reasoning::recommendation_prompt(query, records);
                let generated =
                    generate(provider.as_ref(), "recommend", &prompt, RECOMMEND_SETTINGS, cancel)
                        .await?;
                Ok(reasoning::with_sources(
                    &generated,
                    &reasoning::recommendation_sources(records),
                ))
            }
        }
    }

    /// Concise summary for `query`, with a sources footer
    pub async fn summarize(
        &self,
        query: &str,
        records: &[MemoryRecord],
        cancel: &CancellationToken,
    ) -> Result<String, DomainError> {
        match &self.strategy {
            ReasoningStrategy::Template => Ok(reasoning::fallback_summary(query, records)),
            ReasoningStrategy::Llm(provider) => {
                let prompt = reasoning::summary_prompt(query, records);
                let generated =
                    generate(provider.as_ref(), "summarize", &prompt, SUMMARY_SETTINGS, cancel)
                        .await?;
                Ok(reasoning::with_sources(
                    &generated,
                    &reasoning::summary_sources(records),
                ))
            }
        }
    }

    /// Deterministic comparison, independent of the strategy
    pub fn compare(&self, records: &[MemoryRecord]) -> String {
        reasoning::comparison(records)
    }
}

async fn generate(
    provider: &dyn LlmProvider,
    operation: &str,
    prompt: &str,
    settings: GenerationSettings,
    cancel: &CancellationToken,
) -> Result<String, DomainError> {
    let options = CompletionOptions::from(settings);

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::warn!("{} cancelled before the LLM answered", operation);
            Err(DomainError::cancelled(operation))
        }
        result = provider.complete_prompt(prompt, &options) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLlm;
    use chronicle::{ErrorKind, Payload, RecordId};
    use std::time::Duration;

    fn record(department: &str) -> MemoryRecord {
        MemoryRecord {
            id: RecordId::new(1),
            text: Some("Budget review completed on time.".into()),
            image_reference: None,
            department: department.into(),
            date: "2024-01-01".into(),
            outcome: "success".into(),
            content_type: "text".into(),
            location: None,
            tags: None,
            attributes: Payload::new(),
        }
    }

    #[tokio::test]
    async fn test_template_strategy_without_provider() {
        let service = ReasoningService::from_provider(None);
        assert!(!service.uses_llm());

        let summary = service
            .summarize("budget", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(summary.contains("0 memories"));
    }

    #[tokio::test]
    async fn test_llm_answer_gets_sources_footer() {
        let llm = Arc::new(ScriptedLlm::replying("Keep the review cadence."));
        let service = ReasoningService::from_provider(Some(llm.clone()));

        let answer = service
            .recommend("budget", &[record("Finance")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            answer,
            "Keep the review cadence.\n\nSources:\n- Finance (2024-01-01) - Outcome: success - Type: text"
        );
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Department: Finance"));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let service =
            ReasoningService::from_provider(Some(Arc::new(ScriptedLlm::failing("503 from gateway"))));

        let err = service
            .summarize("budget", &[record("Finance")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_cancellation_stops_waiting_for_llm() {
        let service = ReasoningService::from_provider(Some(Arc::new(ScriptedLlm::slow(
            "too late",
            Duration::from_secs(30),
        ))));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = service
            .recommend("budget", &[record("Finance")], &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_compare_ignores_strategy() {
        let service = ReasoningService::new(ReasoningStrategy::Template);
        assert!(service
            .compare(&[record("Finance")])
            .starts_with("Comparing retrieved memories: 1 items found."));
    }
}

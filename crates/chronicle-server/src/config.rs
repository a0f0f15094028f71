//! Server Configuration
//!
//! Keys are read from the Shuttle secret store first and from the process
//! environment (after loading `.env`) second.

use std::time::Duration;

use chronicle::RetryPolicy;

/// Value of `QDRANT_URL` selecting the in-process store
pub const IN_MEMORY_STORE: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    Http,
    FastEmbed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection_name: String,
    pub vector_size: usize,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_timeout: Duration,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Build the configuration from a key lookup, falling back to the
    /// environment for keys the lookup does not know
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .or_else(|| std::env::var(key).ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self::from_source(get)
    }

    /// Build the configuration from `lookup` alone
    pub fn from_source<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| -> u64 {
            match get(key) {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    tracing::warn!("Ignoring invalid {}={}, using {}", key, raw, default);
                    default
                }),
                None => default,
            }
        };

        let embedding_provider = match get("EMBEDDING_PROVIDER").as_deref() {
            Some(p) if p.eq_ignore_ascii_case("fastembed") => EmbeddingProvider::FastEmbed,
            Some(p) if !p.eq_ignore_ascii_case("http") => {
                tracing::warn!("Unknown EMBEDDING_PROVIDER={}, using http", p);
                EmbeddingProvider::Http
            }
            _ => EmbeddingProvider::Http,
        };

        let retry = RetryPolicy::default()
            .with_max_retries(number("UPSTREAM_MAX_RETRIES", 2) as u32)
            .with_base_delay(Duration::from_millis(number("UPSTREAM_RETRY_BASE_MS", 200)));

        Self {
            api_key: get("CHRONICLE_API_KEY"),
            qdrant_url: get("QDRANT_URL").unwrap_or_else(|| IN_MEMORY_STORE.to_string()),
            qdrant_api_key: get("QDRANT_API_KEY"),
            collection_name: get("COLLECTION_NAME").unwrap_or_else(|| "memories".to_string()),
            vector_size: number("VECTOR_SIZE", 512) as usize,
            embedding_provider,
            embedding_url: get("EMBEDDING_URL")
                .unwrap_or_else(|| "http://localhost:8080/v1".to_string()),
            embedding_api_key: get("EMBEDDING_API_KEY"),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "clip-ViT-B-32".to_string()),
            embedding_timeout: Duration::from_secs(number("EMBEDDING_TIMEOUT_SECS", 30)),
            llm_api_key: get("OPENAI_API_KEY"),
            llm_base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| "openai/gpt-4o".to_string()),
            llm_timeout: Duration::from_secs(number("LLM_TIMEOUT_SECS", 60)),
            retry,
        }
    }

    pub fn uses_in_memory_store(&self) -> bool {
        self.qdrant_url == IN_MEMORY_STORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert!(config.api_key.is_none());
        assert!(config.uses_in_memory_store());
        assert_eq!(config.collection_name, "memories");
        assert_eq!(config.vector_size, 512);
        assert_eq!(config.embedding_provider, EmbeddingProvider::Http);
        assert_eq!(config.llm_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.llm_model, "openai/gpt-4o");
        assert!(config.llm_api_key.is_none());
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("QDRANT_URL", "http://qdrant:6334"),
            ("COLLECTION_NAME", "archive"),
            ("EMBEDDING_PROVIDER", "FastEmbed"),
            ("OPENAI_API_KEY", "sk-test"),
            ("UPSTREAM_MAX_RETRIES", "0"),
            ("LLM_TIMEOUT_SECS", "5"),
        ]);
        assert!(!config.uses_in_memory_store());
        assert_eq!(config.collection_name, "archive");
        assert_eq!(config.embedding_provider, EmbeddingProvider::FastEmbed);
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.llm_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let config = config(&[("VECTOR_SIZE", "large")]);
        assert_eq!(config.vector_size, 512);
    }

    #[test]
    fn test_lookup_wins_over_environment() {
        let config = AppConfig::from_lookup(|key| {
            (key == "COLLECTION_NAME").then(|| "from-secrets".to_string())
        });
        assert_eq!(config.collection_name, "from-secrets");
    }
}

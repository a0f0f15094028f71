use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use chronicle::{Embedder, LlmProvider, VectorStore};

mod adapters;
mod application;
mod auth;
mod config;
mod models;
mod routes;

#[cfg(test)]
mod test_support;

use adapters::{
    HttpEmbedder, HttpEmbedderConfig, InMemoryVectorStore, OpenAiChatProvider, OpenAiConfig,
    QdrantStore,
};
use application::{MemoryService, ReasoningService};
use config::{AppConfig, EmbeddingProvider};

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub memory: Arc<MemoryService>,
    pub reasoning: Arc<ReasoningService>,
    /// Bearer token for protected routes; `None` disables auth
    pub api_key: Option<Arc<str>>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chronicle_server=debug"));
    // Shuttle may already have installed a subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn vector_store(config: &AppConfig) -> anyhow::Result<Arc<dyn VectorStore>> {
    if config.uses_in_memory_store() {
        tracing::warn!("No QDRANT_URL set - memories are kept in process only");
        return Ok(Arc::new(InMemoryVectorStore::new(&config.collection_name)));
    }
    let store = QdrantStore::connect(
        &config.qdrant_url,
        config.qdrant_api_key.clone(),
        &config.collection_name,
        config.retry,
    )
    .context("Failed to connect to Qdrant")?;
    Ok(Arc::new(store))
}

fn http_embedder(config: &AppConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder = HttpEmbedder::new(HttpEmbedderConfig {
        base_url: config.embedding_url.clone(),
        model: config.embedding_model.clone(),
        api_key: config.embedding_api_key.clone(),
        timeout: config.embedding_timeout,
        dimension: config.vector_size,
        retry: config.retry,
    })
    .context("Failed to build embedding client")?;
    tracing::info!(
        "Embedding via {} ({}, dim {})",
        config.embedding_url,
        config.embedding_model,
        config.vector_size
    );
    Ok(Arc::new(embedder))
}

#[cfg(feature = "fastembed")]
async fn embedder(config: &AppConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.embedding_provider {
        EmbeddingProvider::FastEmbed => {
            let embedder = adapters::FastEmbedEmbedder::load()
                .await
                .context("Failed to load local CLIP model")?;
            tracing::info!("Embedding via local CLIP ViT-B/32");
            Ok(Arc::new(embedder))
        }
        EmbeddingProvider::Http => http_embedder(config),
    }
}

#[cfg(not(feature = "fastembed"))]
async fn embedder(config: &AppConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    if config.embedding_provider == EmbeddingProvider::FastEmbed {
        tracing::warn!("Built without the fastembed feature - using the HTTP embedder");
    }
    http_embedder(config)
}

fn llm_provider(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn LlmProvider>>> {
    let Some(api_key) = config.llm_api_key.clone() else {
        return Ok(None);
    };
    let provider = OpenAiChatProvider::new(OpenAiConfig {
        base_url: config.llm_base_url.clone(),
        api_key,
        model: config.llm_model.clone(),
        timeout: config.llm_timeout,
        retry: config.retry,
    })
    .context("Failed to build LLM client")?;
    Ok(Some(Arc::new(provider)))
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = vector_store(config)?;
    let embedder = embedder(config).await?;

    let memory = MemoryService::new(store, embedder);
    memory
        .bootstrap()
        .await
        .with_context(|| format!("Failed to prepare collection '{}'", memory.collection_name()))?;

    let reasoning = ReasoningService::from_provider(llm_provider(config)?);

    if config.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!("No CHRONICLE_API_KEY set - authentication disabled");
    }

    Ok(AppState {
        memory: Arc::new(memory),
        reasoning: Arc::new(reasoning),
        api_key: config.api_key.as_deref().map(Arc::from),
    })
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    init_tracing();
    dotenvy::dotenv().ok();
    tracing::info!("Chronicle API initializing...");

    let config = AppConfig::from_lookup(|key| secrets.get(key));
    let state = build_state(&config).await?;

    let router = routes::app(state);

    tracing::info!("Swagger UI: /swagger-ui");
    tracing::info!("Chronicle API ready");

    Ok(router.into())
}

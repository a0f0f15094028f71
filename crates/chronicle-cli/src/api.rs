//! Chronicle API Client

use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// API Client for Chronicle
pub struct ChronicleClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

// ============================================
// API Request / Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
    pub limit: usize,
    pub data_type: String,
    pub reasoning_mode: String,
}

#[derive(Debug, Deserialize)]
pub struct MemoryResponse {
    pub id: String,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub department: String,
    pub date: String,
    pub outcome: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub memories: Vec<MemoryResponse>,
    pub reasoning: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct IngestBatchRequest<'a> {
    pub items: &'a [Map<String, Value>],
}

#[derive(Debug, Deserialize)]
pub struct IngestBatchResponse {
    pub ingested: usize,
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemoryResponse {
    pub message: String,
    pub id: String,
    pub reembedded: bool,
}

impl ChronicleClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|k| k.to_string()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        };
        let resp = request
            .send()
            .await
            .context("Failed to connect to Chronicle API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("API error ({}): {}", status, error_message(&body));
        }

        resp.json().await.context("Failed to parse response")
    }

    /// Health check (unauthenticated)
    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .context("Failed to connect to Chronicle API")?;

        if !resp.status().is_success() {
            bail!("Health check failed ({})", resp.status());
        }

        resp.json().await.context("Failed to parse response")
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.send(self.client.post(self.url("/query")).json(request))
            .await
    }

    pub async fn ingest(&self, item: &Map<String, Value>) -> Result<IngestResponse> {
        self.send(self.client.post(self.url("/ingest")).json(item))
            .await
    }

    pub async fn ingest_batch(&self, items: &[Map<String, Value>]) -> Result<IngestBatchResponse> {
        let request = IngestBatchRequest { items };
        self.send(self.client.post(self.url("/ingest/batch")).json(&request))
            .await
    }

    pub async fn update(
        &self,
        memory_id: &str,
        changes: &Map<String, Value>,
    ) -> Result<UpdateMemoryResponse> {
        let url = self.url(&format!("/update/{}", memory_id));
        self.send(self.client.put(url).json(changes)).await
    }

    pub async fn get(&self, memory_id: &str) -> Result<MemoryResponse> {
        let url = self.url(&format!("/memories/{}", memory_id));
        self.send(self.client.get(url)).await
    }
}

/// Pull `message` out of a `{kind, message}` error body, or return the body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let kind = v.get("kind")?.as_str()?.to_string();
            let message = v.get("message")?.as_str()?.to_string();
            Some(format!("[{}] {}", kind, message))
        })
        .unwrap_or_else(|| body.to_string())
}

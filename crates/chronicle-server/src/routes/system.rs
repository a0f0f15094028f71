//! System Routes - Service info and health check

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;

const ENDPOINTS: [&str; 7] = [
    "GET /health",
    "POST /query",
    "POST /ingest",
    "POST /ingest/batch",
    "PUT /update/{memory_id}",
    "GET /memories/{memory_id}",
    "GET /swagger-ui",
];

/// Service info
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub collection: String,
    /// `llm` or `template`
    pub reasoning: String,
    pub endpoints: Vec<String>,
}

/// Health check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// Service info and endpoint list
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service info", body = ServiceInfo)),
    tag = "Health"
)]
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let reasoning = if state.reasoning.uses_llm() {
        "llm"
    } else {
        "template"
    };
    Json(ServiceInfo {
        name: "Chronicle API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        collection: state.memory.collection_name().to_string(),
        reasoning: reasoning.to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is running", body = HealthCheck)),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Chronicle API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
}

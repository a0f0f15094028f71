//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    ErrorResponse, IngestBatchRequest, IngestBatchResponse, IngestRequest, IngestResponse,
    MemoryResponse, QueryRequest, QueryResponse, UpdateMemoryRequest, UpdateMemoryResponse,
};

use super::system::{HealthCheck, ServiceInfo};

#[derive(OpenApi)]
#[openapi(
    paths(
        // System endpoints
        super::system::service_info,
        super::system::health_check,
        // Memory endpoints
        super::memory::query_memories,
        super::memory::ingest_memory,
        super::memory::ingest_batch,
        super::memory::update_memory,
        super::memory::get_memory,
    ),
    info(
        title = "Chronicle API",
        version = "0.1.0",
        description = "Institutional memory retrieval over text and image records.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Service info and health check"),
        (name = "Memory", description = "Memory - Query, ingest and update records"),
    ),
    components(
        schemas(
            ServiceInfo,
            HealthCheck,
            ErrorResponse,
            QueryRequest,
            QueryResponse,
            MemoryResponse,
            IngestRequest,
            IngestResponse,
            IngestBatchRequest,
            IngestBatchResponse,
            UpdateMemoryRequest,
            UpdateMemoryResponse,
        )
    ),
)]
pub struct ApiDoc;

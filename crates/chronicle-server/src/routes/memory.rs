//! Memory Routes - Query, ingest and update institutional memory

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tokio_util::sync::CancellationToken;

use chronicle::{ContentType, DomainError, NewMemory, ReasoningMode, RecordId};

use crate::models::{
    api_error, ApiError, ApiJson, ErrorResponse, IngestBatchRequest, IngestBatchResponse,
    IngestRequest, IngestResponse, MemoryResponse, QueryRequest, QueryResponse,
    UpdateMemoryRequest, UpdateMemoryResponse,
};
use crate::AppState;

fn parse_id(operation: &str, raw: &str) -> Result<RecordId, ApiError> {
    raw.parse::<RecordId>()
        .map_err(|e: String| api_error(DomainError::invalid_input(operation, "memory_id", e)))
}

/// Query institutional memory
#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Retrieved memories with reasoning", body = QueryResponse),
        (status = 400, description = "Invalid query or filters", body = ErrorResponse),
        (status = 408, description = "Request cancelled", body = ErrorResponse),
        (status = 502, description = "Embedding, vector store or LLM failure", body = ErrorResponse)
    ),
    tag = "Memory"
)]
pub async fn query_memories(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    // Cancelled when the client goes away and the handler future is dropped.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let filters = request.effective_filters();
    let memories = state
        .memory
        .retrieve(&request.query, filters.as_ref(), request.limit)
        .await
        .map_err(api_error)?;

    let reasoning = match request.reasoning_mode {
        ReasoningMode::Recommendation => state
            .reasoning
            .recommend(&request.query, &memories, &cancel)
            .await
            .map_err(api_error)?,
        ReasoningMode::Comparison => state.reasoning.compare(&memories),
        ReasoningMode::Summary => format!("Summary of {} relevant memories.", memories.len()),
    };

    let summary = state
        .reasoning
        .summarize(&request.query, &memories, &cancel)
        .await
        .map_err(api_error)?;

    Ok(Json(QueryResponse {
        query: request.query,
        memories: memories.into_iter().map(MemoryResponse::from).collect(),
        reasoning,
        summary,
    }))
}

/// Ingest a new document or image
#[utoipa::path(
    post,
    path = "/ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Memory ingested", body = IngestResponse),
        (status = 400, description = "Missing metadata or content", body = ErrorResponse),
        (status = 404, description = "Image file not found", body = ErrorResponse),
        (status = 502, description = "Embedding or vector store failure", body = ErrorResponse)
    ),
    tag = "Memory"
)]
pub async fn ingest_memory(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let memory = NewMemory::from(request);
    let content_type = memory.type_tag().and_then(|t| t.parse::<ContentType>().ok());

    let id = state.memory.ingest(memory).await.map_err(api_error)?;

    Ok(Json(IngestResponse::new(content_type, id)))
}

/// Ingest several documents or images at once
#[utoipa::path(
    post,
    path = "/ingest/batch",
    request_body = IngestBatchRequest,
    responses(
        (status = 200, description = "Memories ingested", body = IngestBatchResponse),
        (status = 400, description = "An item is missing metadata or content", body = ErrorResponse),
        (status = 404, description = "Image file not found", body = ErrorResponse),
        (status = 502, description = "Embedding or vector store failure", body = ErrorResponse)
    ),
    tag = "Memory"
)]
pub async fn ingest_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IngestBatchRequest>,
) -> Result<Json<IngestBatchResponse>, ApiError> {
    let memories = request.items.into_iter().map(NewMemory::from).collect();

    let ids = state.memory.ingest_batch(memories).await.map_err(api_error)?;

    Ok(Json(IngestBatchResponse {
        ingested: ids.len(),
        ids: ids.iter().map(ToString::to_string).collect(),
    }))
}

/// Update an existing memory
#[utoipa::path(
    put,
    path = "/update/{memory_id}",
    params(("memory_id" = String, Path, description = "Memory ID")),
    request_body = UpdateMemoryRequest,
    responses(
        (status = 200, description = "Memory updated", body = UpdateMemoryResponse),
        (status = 400, description = "Invalid id or fields", body = ErrorResponse),
        (status = 404, description = "Memory not found", body = ErrorResponse),
        (status = 502, description = "Embedding or vector store failure", body = ErrorResponse)
    ),
    tag = "Memory"
)]
pub async fn update_memory(
    State(state): State<AppState>,
    Path(memory_id): Path<String>,
    ApiJson(request): ApiJson<UpdateMemoryRequest>,
) -> Result<Json<UpdateMemoryResponse>, ApiError> {
    let id = parse_id("update", &memory_id)?;

    let outcome = state
        .memory
        .update(id, request.into_changes())
        .await
        .map_err(api_error)?;

    Ok(Json(UpdateMemoryResponse {
        message: format!("Memory {} updated successfully", outcome.id),
        id: outcome.id.to_string(),
        reembedded: outcome.reembedded,
    }))
}

/// Get one memory
#[utoipa::path(
    get,
    path = "/memories/{memory_id}",
    params(("memory_id" = String, Path, description = "Memory ID")),
    responses(
        (status = 200, description = "Memory", body = MemoryResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Memory not found", body = ErrorResponse)
    ),
    tag = "Memory"
)]
pub async fn get_memory(
    State(state): State<AppState>,
    Path(memory_id): Path<String>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let id = parse_id("get", &memory_id)?;

    let record = state.memory.get(id).await.map_err(api_error)?;

    Ok(Json(record.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/query", post(query_memories))
        .route("/ingest", post(ingest_memory))
        .route("/ingest/batch", post(ingest_batch))
        .route("/update/:memory_id", put(update_memory))
        .route("/memories/:memory_id", get(get_memory))
}

//! Memory - Query, ingest and update DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use chronicle::{
    payload_keys, ContentType, DataScope, MemoryRecord, NewMemory, Payload, QueryFilters,
    ReasoningMode,
};

fn default_limit() -> usize {
    5
}

/// Query request
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub query: String,
    /// department, outcome, type, location, tags, date_from, date_to
    #[schema(value_type = Option<Object>)]
    pub filters: Option<QueryFilters>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// text | image | both
    #[serde(default)]
    #[schema(value_type = String, example = "both")]
    pub data_type: DataScope,
    /// summary | recommendation | comparison
    #[serde(default)]
    #[schema(value_type = String, example = "summary")]
    pub reasoning_mode: ReasoningMode,
}

impl QueryRequest {
    /// Filters with `data_type` applied; `text`/`image` override `filters.type`
    pub fn effective_filters(&self) -> Option<QueryFilters> {
        match (self.data_type.content_type(), &self.filters) {
            (Some(content_type), Some(filters)) => {
                Some(filters.clone().with_content_type(content_type))
            }
            (Some(content_type), None) => {
                Some(QueryFilters::default().with_content_type(content_type))
            }
            (None, filters) => filters.clone(),
        }
    }
}

/// Retrieved memory
#[derive(Debug, Serialize, ToSchema)]
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
    /// Every other stored field
    #[schema(value_type = Object)]
    pub attributes: Payload,
}

impl From<MemoryRecord> for MemoryResponse {
    fn from(record: MemoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            text: record.text,
            image_url: record.image_reference,
            department: record.department,
            date: record.date,
            outcome: record.outcome,
            content_type: record.content_type,
            location: record.location,
            tags: record.tags,
            attributes: record.attributes,
        }
    }
}

/// Query response
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    pub query: String,
    pub memories: Vec<MemoryResponse>,
    pub reasoning: String,
    pub summary: String,
}

/// Ingest request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngestRequest {
    pub text: Option<String>,
    pub image_path: Option<String>,
    /// Used as `text` when `text` is absent
    pub description: Option<String>,
    /// Required; checked when the memory is ingested
    pub department: Option<String>,
    /// Required, YYYY-MM-DD
    pub date: Option<String>,
    /// Required
    pub outcome: Option<String>,
    /// Required: text | image
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub document_type: Option<String>,
    pub confidence: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub image_category: Option<String>,
    pub related_event: Option<String>,
    /// Any further metadata, stored verbatim
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Payload,
}

impl From<IngestRequest> for NewMemory {
    fn from(request: IngestRequest) -> Self {
        let mut metadata = request.extra;
        let fields = [
            (payload_keys::DEPARTMENT, request.department),
            (payload_keys::DATE, request.date),
            (payload_keys::OUTCOME, request.outcome),
            (payload_keys::TYPE, request.content_type),
            (payload_keys::LOCATION, request.location),
            ("document_type", request.document_type),
            ("confidence", request.confidence),
            ("source", request.source),
            ("notes", request.notes),
            ("image_category", request.image_category),
            ("related_event", request.related_event),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                metadata.insert(key.to_string(), Value::String(value));
            }
        }
        if let Some(tags) = request.tags {
            metadata.insert(
                payload_keys::TAGS.to_string(),
                Value::Array(tags.into_iter().map(Value::String).collect()),
            );
        }

        NewMemory {
            text: request.text.or(request.description),
            image_path: request.image_path,
            metadata,
        }
    }
}

/// Ingest response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    pub id: String,
}

impl IngestResponse {
    pub fn new(content_type: Option<ContentType>, id: impl ToString) -> Self {
        let label = match content_type {
            Some(ContentType::Image) => "Image",
            _ => "Text",
        };
        Self {
            message: format!("{} ingested successfully", label),
            id: id.to_string(),
        }
    }
}

/// Batch ingest request
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestBatchRequest {
    pub items: Vec<IngestRequest>,
}

/// Batch ingest response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestBatchResponse {
    pub ingested: usize,
    pub ids: Vec<String>,
}

/// Update request; only the fields present are changed
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMemoryRequest {
    pub text: Option<String>,
    pub image_path: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub date: Option<String>,
    pub outcome: Option<String>,
    /// text | image
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub confidence: Option<String>,
    pub notes: Option<String>,
    /// Any further metadata
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Payload,
}

impl UpdateMemoryRequest {
    pub fn into_changes(self) -> Payload {
        let mut changes = self.extra;
        let fields = [
            (payload_keys::TEXT, self.text),
            (payload_keys::IMAGE_PATH, self.image_path),
            ("description", self.description),
            (payload_keys::DEPARTMENT, self.department),
            (payload_keys::DATE, self.date),
            (payload_keys::OUTCOME, self.outcome),
            (payload_keys::TYPE, self.content_type),
            (payload_keys::LOCATION, self.location),
            ("confidence", self.confidence),
            ("notes", self.notes),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                changes.insert(key.to_string(), Value::String(value));
            }
        }
        if let Some(tags) = self.tags {
            changes.insert(
                payload_keys::TAGS.to_string(),
                Value::Array(tags.into_iter().map(Value::String).collect()),
            );
        }
        changes
    }
}

/// Update response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateMemoryResponse {
    pub message: String,
    pub id: String,
    pub reembedded: bool,
}

//! Chronicle Domain Library
//!
//! Core domain types and interfaces for the Chronicle institutional memory
//! service: multimodal records retrieved by vector similarity and summarized
//! by an LLM.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: MemoryRecord, NewMemory, RecordId
//!   - `value_objects/`: ContentType, DataScope, QueryFilters, ReasoningMode
//!   - `services/`: filter builder, id derivation, hydration, ingest/update
//!     planning, reasoning text, retry policy
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: VectorStore
//!   - `services/`: Embedder, LlmProvider
//!
//! # Usage
//!
//! ```rust,ignore
//! use chronicle::{build_filter, QueryFilters, VectorStore, Embedder};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    build_filter, derive_record_id, hydrate, plan_ingest, plan_update, reasoning, Condition,
    ContentType, DataScope, DomainError, EmbedTarget, ErrorKind, IngestPlan, MemoryRecord,
    NewMemory, Payload, Predicate, QueryFilters, ReasoningMode, RecordId, RetryPolicy,
    UpdatePlan,
};
pub use domain::entities::payload_keys;
pub use ports::{
    check_dimension, read_image, ChatMessage, CompletionOptions, CompletionResponse, Embedder,
    LlmProvider, MessageRole, ScoredPoint, StoredPoint, TokenUsage, VectorStore,
};

//! Vector Store Port
//!
//! Abstract interface over one collection of a vector database.
//! The production adapter talks to Qdrant; an in-process store backs local
//! runs and tests.

use async_trait::async_trait;

use crate::domain::entities::{Payload, RecordId};
use crate::domain::errors::DomainError;
use crate::domain::services::Predicate;

/// A vector with its payload, as written to or read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub id: RecordId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// One search hit; lives for a single call
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: RecordId,
    pub score: f32,
    pub payload: Payload,
}

/// Collection-scoped vector store
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this store is bound to
    fn collection_name(&self) -> &str;

    /// Create the collection with cosine distance if it does not exist yet
    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError>;

    /// Insert or replace points by id
    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<(), DomainError>;

    /// Fetch a point with its vector, `None` when absent
    async fn retrieve(&self, id: RecordId) -> Result<Option<StoredPoint>, DomainError>;

    /// Nearest neighbours by descending cosine similarity, at most `limit`
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<ScoredPoint>, DomainError>;
}

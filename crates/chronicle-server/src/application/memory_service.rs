//! Memory Application Service (Use Case)
//!
//! Retrieval, ingest and update pipelines over the embedder and vector store
//! ports.

use std::path::Path;
use std::sync::Arc;

use chronicle::{
    build_filter, check_dimension, hydrate, plan_ingest, plan_update, DomainError, EmbedTarget,
    Embedder, MemoryRecord, NewMemory, Payload, QueryFilters, RecordId, StoredPoint, VectorStore,
};

/// Result of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub id: RecordId,
    /// Whether a new vector was computed
    pub reembedded: bool,
}

/// Application service for memory operations
pub struct MemoryService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl MemoryService {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn collection_name(&self) -> &str {
        self.store.collection_name()
    }

    /// Create the collection sized for the embedder if it is missing
    pub async fn bootstrap(&self) -> Result<(), DomainError> {
        self.store.ensure_collection(self.embedder.dimension()).await
    }

    /// Embed `query`, search with the filters, and hydrate the hits in
    /// store order
    pub async fn retrieve(
        &self,
        query: &str,
        filters: Option<&QueryFilters>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::invalid_input("query", "query", "must not be blank"));
        }
        if limit == 0 {
            return Err(DomainError::invalid_input("query", "limit", "must be at least 1"));
        }

        let predicate = match filters {
            Some(filters) => {
                filters.validate()?;
                build_filter(filters)
            }
            None => None,
        };

        let vector = self.embedder.embed_text(query).await?;
        check_dimension("query", "embedding", self.embedder.dimension(), &vector)?;

        let hits = self.store.search(vector, limit, predicate.as_ref()).await?;

        for hit in &hits {
            tracing::debug!("Hit {} (score {:.4})", hit.id, hit.score);
        }
        tracing::info!(
            "Retrieved {} memories for query (limit {}, filtered: {})",
            hits.len(),
            limit,
            predicate.is_some()
        );

        Ok(hits
            .into_iter()
            .map(|hit| hydrate(hit.id, hit.payload))
            .collect())
    }

    /// Validate, embed and store one memory
    pub async fn ingest(&self, memory: NewMemory) -> Result<RecordId, DomainError> {
        let plan = plan_ingest(memory)?;
        let vector = self.embed("ingest", &plan.target).await?;

        self.store
            .upsert(vec![StoredPoint {
                id: plan.id,
                vector,
                payload: plan.payload,
            }])
            .await?;

        tracing::info!("Ingested memory {}", plan.id);
        Ok(plan.id)
    }

    /// Validate every memory up front, embed texts and images in two batch
    /// calls, then store everything with one upsert. Ids come back in input
    /// order.
    pub async fn ingest_batch(&self, memories: Vec<NewMemory>) -> Result<Vec<RecordId>, DomainError> {
        if memories.is_empty() {
            return Ok(Vec::new());
        }

        let plans = memories
            .into_iter()
            .map(plan_ingest)
            .collect::<Result<Vec<_>, _>>()?;

        let mut texts = Vec::new();
        let mut images = Vec::new();
        for plan in &plans {
            match &plan.target {
                EmbedTarget::Text(text) => texts.push(text.clone()),
                EmbedTarget::Image(path) => images.push(path.clone()),
            }
        }

        let text_vectors = self.embedder.embed_texts(&texts).await?;
        let image_vectors = self.embedder.embed_images(&images).await?;
        if text_vectors.len() != texts.len() || image_vectors.len() != images.len() {
            return Err(DomainError::upstream(
                "ingest_batch",
                "embedding",
                "batch embedding returned a different number of vectors",
            ));
        }

        let mut text_vectors = text_vectors.into_iter();
        let mut image_vectors = image_vectors.into_iter();
        let mut ids = Vec::with_capacity(plans.len());
        let mut points = Vec::with_capacity(plans.len());

        for plan in plans {
            let vector = match plan.target {
                EmbedTarget::Text(_) => text_vectors.next(),
                EmbedTarget::Image(_) => image_vectors.next(),
            }
            .ok_or_else(|| DomainError::upstream("ingest_batch", "embedding", "missing vector"))?;
            check_dimension("ingest_batch", "embedding", self.embedder.dimension(), &vector)?;

            ids.push(plan.id);
            points.push(StoredPoint {
                id: plan.id,
                vector,
                payload: plan.payload,
            });
        }

        self.store.upsert(points).await?;

        tracing::info!(
            "Ingested {} memories ({} text, {} images)",
            ids.len(),
            texts.len(),
            images.len()
        );
        Ok(ids)
    }

    /// Merge `changes` into a stored memory.
    ///
    /// Fetch and upsert are separate store calls, so concurrent updates of
    /// one id are last-write-wins.
    pub async fn update(&self, id: RecordId, changes: Payload) -> Result<UpdateOutcome, DomainError> {
        let current = self
            .store
            .retrieve(id)
            .await?
            .ok_or_else(|| DomainError::not_found("update", "memory", id))?;

        let plan = plan_update(id, &current.payload, changes)?;

        let (vector, reembedded) = match &plan.reembed {
            Some(target) => (self.embed("update", target).await?, true),
            None => (current.vector, false),
        };

        self.store
            .upsert(vec![StoredPoint {
                id,
                vector,
                payload: plan.payload,
            }])
            .await?;

        tracing::info!("Updated memory {} (reembedded: {})", id, reembedded);
        Ok(UpdateOutcome { id, reembedded })
    }

    /// One hydrated memory by id
    pub async fn get(&self, id: RecordId) -> Result<MemoryRecord, DomainError> {
        let point = self
            .store
            .retrieve(id)
            .await?
            .ok_or_else(|| DomainError::not_found("get", "memory", id))?;
        Ok(hydrate(point.id, point.payload))
    }

    async fn embed(&self, operation: &str, target: &EmbedTarget) -> Result<Vec<f32>, DomainError> {
        let vector = match target {
            EmbedTarget::Text(text) => self.embedder.embed_text(text).await?,
            EmbedTarget::Image(path) => self.embedder.embed_image(Path::new(path)).await?,
        };
        check_dimension(operation, "embedding", self.embedder.dimension(), &vector)?;
        Ok(vector)
    }
}

//! In-process Vector Store
//!
//! Brute-force cosine search over a map of points. Selected with
//! `QDRANT_URL=:memory:` for local runs and used by the test suites.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use chronicle::{DomainError, Predicate, RecordId, ScoredPoint, StoredPoint, VectorStore};

const SERVICE: &str = "in-memory store";

#[derive(Default)]
struct Collection {
    dimension: Option<usize>,
    points: HashMap<RecordId, StoredPoint>,
}

/// [`VectorStore`] kept entirely in memory
pub struct InMemoryVectorStore {
    name: String,
    inner: RwLock<Collection>,
}

impl InMemoryVectorStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Collection::default()),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.points.len()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        match inner.dimension {
            Some(existing) if existing != dimension => Err(DomainError::upstream(
                "ensure_collection",
                SERVICE,
                format!(
                    "collection {} has {} dimensions, requested {}",
                    self.name, existing, dimension
                ),
            )),
            Some(_) => Ok(()),
            None => {
                inner.dimension = Some(dimension);
                tracing::info!("Created in-memory collection: {} ({} dims)", self.name, dimension);
                Ok(())
            }
        }
    }

    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        if let Some(dimension) = inner.dimension {
            if let Some(bad) = points.iter().find(|p| p.vector.len() != dimension) {
                return Err(DomainError::upstream(
                    "upsert",
                    SERVICE,
                    format!(
                        "point {} has {} dimensions, collection expects {}",
                        bad.id,
                        bad.vector.len(),
                        dimension
                    ),
                ));
            }
        }
        for point in points {
            inner.points.insert(point.id, point);
        }
        Ok(())
    }

    async fn retrieve(&self, id: RecordId) -> Result<Option<StoredPoint>, DomainError> {
        Ok(self.inner.read().await.points.get(&id).cloned())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let inner = self.inner.read().await;

        let mut hits: Vec<ScoredPoint> = inner
            .points
            .values()
            .filter(|p| predicate.map_or(true, |pred| pred.matches(&p.payload)))
            .map(|p| ScoredPoint {
                id: p.id,
                score: cosine_similarity(&vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

//! Qdrant Vector Store
//!
//! Collection-scoped adapter over `qdrant-client`. Predicates from the
//! filter builder become a `must` filter of keyword, keywords and datetime
//! range conditions.

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::vectors::VectorsOptions;
use qdrant_client::qdrant::{
    Condition as QdrantCondition, CreateCollectionBuilder, DatetimeRange, Distance, Filter,
    GetPointsBuilder, PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder, Vectors,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant};
use std::collections::HashMap;

use chronicle::domain::parse_record_date;
use chronicle::{
    Condition, DomainError, Payload, Predicate, RecordId, RetryPolicy, ScoredPoint, StoredPoint,
    VectorStore,
};

const SERVICE: &str = "qdrant";

/// Qdrant-backed [`VectorStore`] bound to one collection
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    retry: RetryPolicy,
}

impl QdrantStore {
    /// Connect to Qdrant at `url`
    pub fn connect(
        url: &str,
        api_key: Option<String>,
        collection: impl Into<String>,
        retry: RetryPolicy,
    ) -> Result<Self, DomainError> {
        let client = match api_key {
            Some(key) => Qdrant::from_url(url).api_key(key).build(),
            None => Qdrant::from_url(url).build(),
        }
        .map_err(|e| DomainError::upstream("connect", SERVICE, e))?;

        let collection = collection.into();
        tracing::info!("Connected to Qdrant at {} (collection: {})", url, collection);

        Ok(Self {
            client,
            collection,
            retry,
        })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError> {
        let exists = self
            .retry
            .run("ensure_collection", || async {
                self.client
                    .collection_exists(&self.collection)
                    .await
                    .map_err(|e| DomainError::upstream("ensure_collection", SERVICE, e))
            })
            .await?;

        if exists {
            tracing::info!("Collection {} already exists", self.collection);
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| DomainError::upstream("ensure_collection", SERVICE, e))?;

        tracing::info!(
            "Created collection: {} ({} dims, cosine)",
            self.collection,
            dimension
        );
        Ok(())
    }

    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<(), DomainError> {
        if points.is_empty() {
            return Ok(());
        }

        let count = points.len();
        let points = points
            .into_iter()
            .map(to_point_struct)
            .collect::<Result<Vec<_>, _>>()?;

        self.retry
            .run("upsert", || async {
                self.client
                    .upsert_points(UpsertPointsBuilder::new(&self.collection, points.clone()).wait(true))
                    .await
                    .map_err(|e| DomainError::upstream("upsert", SERVICE, e))
            })
            .await?;

        tracing::debug!("Upserted {} points into {}", count, self.collection);
        Ok(())
    }

    async fn retrieve(&self, id: RecordId) -> Result<Option<StoredPoint>, DomainError> {
        let response = self
            .retry
            .run("retrieve", || async {
                self.client
                    .get_points(
                        GetPointsBuilder::new(&self.collection, vec![PointId::from(id.as_u64())])
                            .with_payload(true)
                            .with_vectors(true),
                    )
                    .await
                    .map_err(|e| DomainError::upstream("retrieve", SERVICE, e))
            })
            .await?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let vector = point
            .vectors
            .and_then(|v| v.vectors_options)
            .and_then(|options| match options {
                VectorsOptions::Vector(v) => Some(v.data),
                _ => None,
            })
            .ok_or_else(|| {
                DomainError::upstream("retrieve", SERVICE, format!("point {} has no dense vector", id))
            })?;

        Ok(Some(StoredPoint {
            id,
            vector,
            payload: from_qdrant_payload(&point.payload)?,
        }))
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let filter = predicate.map(to_filter).transpose()?;

        let response = self
            .retry
            .run("search", || async {
                let mut request =
                    SearchPointsBuilder::new(&self.collection, vector.clone(), limit as u64)
                        .with_payload(true);
                if let Some(filter) = filter.clone() {
                    request = request.filter(filter);
                }
                self.client
                    .search_points(request)
                    .await
                    .map_err(|e| DomainError::upstream("search", SERVICE, e))
            })
            .await?;

        let mut hits = Vec::with_capacity(response.result.len());
        for point in response.result {
            let Some(id) = point.id.as_ref().and_then(numeric_id) else {
                tracing::warn!("Skipping search hit without a numeric id");
                continue;
            };
            hits.push(ScoredPoint {
                id,
                score: point.score,
                payload: from_qdrant_payload(&point.payload)?,
            });
        }

        tracing::info!("Found {} points in {}", hits.len(), self.collection);
        Ok(hits)
    }
}

fn to_point_struct(point: StoredPoint) -> Result<PointStruct, DomainError> {
    let payload = QdrantPayload::try_from(serde_json::Value::Object(point.payload))
        .map_err(|e| DomainError::invalid_input("upsert", "payload", e.to_string()))?;
    Ok(PointStruct::new(
        point.id.as_u64(),
        Vectors::from(point.vector),
        payload,
    ))
}

fn from_qdrant_payload(payload: &HashMap<String, QdrantValue>) -> Result<Payload, DomainError> {
    match serde_json::to_value(payload) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(DomainError::upstream(
            "hydrate",
            SERVICE,
            format!("payload is not an object: {}", other),
        )),
        Err(e) => Err(DomainError::upstream("hydrate", SERVICE, e)),
    }
}

fn numeric_id(id: &PointId) -> Option<RecordId> {
    match id.point_id_options {
        Some(PointIdOptions::Num(n)) => Some(RecordId::new(n)),
        _ => None,
    }
}

/// Translate a predicate into a Qdrant `must` filter
pub fn to_filter(predicate: &Predicate) -> Result<Filter, DomainError> {
    let conditions = predicate
        .conditions()
        .iter()
        .map(to_condition)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Filter::must(conditions))
}

fn to_condition(condition: &Condition) -> Result<QdrantCondition, DomainError> {
    Ok(match condition {
        Condition::Equals { key, value } => QdrantCondition::matches(key.as_str(), value.clone()),
        Condition::AnyOf { key, values } => QdrantCondition::matches(key.as_str(), values.clone()),
        Condition::DateRange { key, gte, lte } => QdrantCondition::datetime_range(
            key.as_str(),
            DatetimeRange {
                gte: gte.as_deref().map(timestamp).transpose()?,
                lte: lte.as_deref().map(timestamp).transpose()?,
                gt: None,
                lt: None,
            },
        ),
    })
}

fn timestamp(bound: &str) -> Result<prost_types::Timestamp, DomainError> {
    let instant = parse_record_date(bound).ok_or_else(|| {
        DomainError::validation("query", "date", format!("'{}' is not an ISO-8601 date", bound))
    })?;
    Ok(prost_types::Timestamp {
        seconds: instant.timestamp(),
        nanos: instant.timestamp_subsec_nanos() as i32,
    })
}

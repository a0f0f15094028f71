//! Content plans for ingest and update
//!
//! Pure decisions about what gets embedded and stored. The application layer
//! executes a plan by calling the embedder and the vector store.

use serde_json::Value;

use super::record_id::derive_record_id;
use crate::domain::entities::{payload_keys, NewMemory, Payload, RecordId};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{parse_record_date, ContentType};

/// Content that must be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedTarget {
    Text(String),
    /// Path or URL of the image file
    Image(String),
}

/// Validated ingest: id, content to embed, payload to store
#[derive(Debug, Clone, PartialEq)]
pub struct IngestPlan {
    pub id: RecordId,
    pub target: EmbedTarget,
    pub payload: Payload,
}

/// Merged payload and, when the embedded content changed, what to re-embed
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub payload: Payload,
    pub reembed: Option<EmbedTarget>,
}

const REQUIRED_FIELDS: [&str; 4] = [
    payload_keys::DEPARTMENT,
    payload_keys::DATE,
    payload_keys::OUTCOME,
    payload_keys::TYPE,
];

/// Validate a new memory and decide its id and payload
pub fn plan_ingest(memory: NewMemory) -> Result<IngestPlan, DomainError> {
    const OP: &str = "ingest";

    let mut metadata = drop_nulls(memory.metadata);

    for field in REQUIRED_FIELDS {
        match metadata.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) | None => {
                return Err(DomainError::validation(OP, field, "field is required"));
            }
            Some(_) => {
                return Err(DomainError::validation(OP, field, "must be a string"));
            }
        }
    }

    check_fields(OP, &metadata)?;
    let content_type = parse_type(OP, &metadata)?;

    // Caller-supplied ids never become point ids.
    if let Some(source_id) = metadata.remove(payload_keys::ID) {
        metadata.insert(payload_keys::SOURCE_ID.to_string(), source_id);
    }

    let text = memory.text.filter(|t| !t.trim().is_empty());
    let image_path = memory.image_path.filter(|p| !p.trim().is_empty());

    let (target, content) = match content_type {
        ContentType::Text => {
            let text = text.clone().ok_or_else(|| {
                DomainError::invalid_input(OP, payload_keys::TEXT, "text memories need text content")
            })?;
            (EmbedTarget::Text(text.clone()), text)
        }
        ContentType::Image => {
            let path = image_path.ok_or_else(|| {
                DomainError::invalid_input(
                    OP,
                    payload_keys::IMAGE_PATH,
                    "image memories need an image path",
                )
            })?;
            (EmbedTarget::Image(path.clone()), path)
        }
    };

    let id = derive_record_id(&content, &metadata);

    let mut payload = metadata;
    match &target {
        EmbedTarget::Text(text) => {
            payload.insert(payload_keys::TEXT.into(), Value::String(text.clone()));
        }
        EmbedTarget::Image(path) => {
            payload.insert(payload_keys::IMAGE_URL.into(), Value::String(path.clone()));
            if let Some(description) = text {
                payload.insert(payload_keys::TEXT.into(), Value::String(description));
            }
        }
    }

    Ok(IngestPlan {
        id,
        target,
        payload,
    })
}

/// Merge `changes` into the stored payload of record `id`.
///
/// New keys are added, existing keys overwritten and absent keys left alone.
/// Re-embedding is requested only when the content that drives the vector
/// changed: the text of a text record, the image reference of an image
/// record, or the record's type itself.
pub fn plan_update(id: RecordId, current: &Payload, changes: Payload) -> Result<UpdatePlan, DomainError> {
    const OP: &str = "update";

    let mut changes = drop_nulls(changes);

    if changes.contains_key(payload_keys::ID) {
        return Err(DomainError::invalid_input(
            OP,
            payload_keys::ID,
            format!("id of memory {} is immutable", id),
        ));
    }

    if let Some(path) = changes.remove(payload_keys::IMAGE_PATH) {
        changes.insert(payload_keys::IMAGE_URL.to_string(), path);
    }

    if changes.is_empty() {
        return Err(DomainError::invalid_input(OP, "fields", "no fields to update"));
    }

    for field in REQUIRED_FIELDS {
        match changes.get(field) {
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(DomainError::validation(OP, field, "cannot be blank"));
            }
            Some(Value::String(_)) | None => {}
            Some(_) => return Err(DomainError::validation(OP, field, "must be a string")),
        }
    }
    check_fields(OP, &changes)?;
    if changes.contains_key(payload_keys::TYPE) {
        parse_type(OP, &changes)?;
    }

    let mut payload = current.clone();
    payload.extend(changes);

    let before = parse_type(OP, current).ok();
    let after = parse_type(OP, &payload).ok();
    let type_changed = before != after;

    let reembed = match after {
        Some(ContentType::Text) => {
            let text = non_blank_str(&payload, payload_keys::TEXT);
            let changed = type_changed || text != non_blank_str(current, payload_keys::TEXT);
            match (changed, text) {
                (false, _) => None,
                (true, Some(text)) => Some(EmbedTarget::Text(text.to_string())),
                (true, None) => {
                    return Err(DomainError::invalid_input(
                        OP,
                        payload_keys::TEXT,
                        "text memories need text content",
                    ))
                }
            }
        }
        Some(ContentType::Image) => {
            let image = non_blank_str(&payload, payload_keys::IMAGE_URL);
            let changed = type_changed || image != non_blank_str(current, payload_keys::IMAGE_URL);
            match (changed, image) {
                (false, _) => None,
                (true, Some(image)) => Some(EmbedTarget::Image(image.to_string())),
                (true, None) => {
                    return Err(DomainError::invalid_input(
                        OP,
                        payload_keys::IMAGE_PATH,
                        "image memories need an image path",
                    ))
                }
            }
        }
        None => None,
    };

    Ok(UpdatePlan { payload, reembed })
}

fn drop_nulls(mut payload: Payload) -> Payload {
    payload.retain(|_, v| !v.is_null());
    payload
}

fn non_blank_str<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_type(operation: &str, payload: &Payload) -> Result<ContentType, DomainError> {
    let tag = payload
        .get(payload_keys::TYPE)
        .and_then(Value::as_str)
        .unwrap_or_default();
    tag.parse::<ContentType>()
        .map_err(|e| DomainError::invalid_input(operation, payload_keys::TYPE, e))
}

/// Shape checks shared by ingest and update
fn check_fields(operation: &str, payload: &Payload) -> Result<(), DomainError> {
    if let Some(date) = payload.get(payload_keys::DATE).and_then(Value::as_str) {
        if parse_record_date(date).is_none() {
            return Err(DomainError::validation(
                operation,
                payload_keys::DATE,
                format!("'{}' is not an ISO-8601 date", date),
            ));
        }
    }

    if let Some(tags) = payload.get(payload_keys::TAGS) {
        let valid = tags
            .as_array()
            .map(|items| items.iter().all(Value::is_string))
            .unwrap_or(false);
        if !valid {
            return Err(DomainError::validation(
                operation,
                payload_keys::TAGS,
                "must be a list of strings",
            ));
        }
    }

    Ok(())
}

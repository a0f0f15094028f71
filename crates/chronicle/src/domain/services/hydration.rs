//! Hydration - raw store payloads into typed records

use serde_json::Value;

use crate::domain::entities::{payload_keys, MemoryRecord, Payload, RecordId};

/// Map a stored payload into a [`MemoryRecord`].
///
/// `department`, `date`, `outcome` and `type` default to an empty string,
/// optional fields to `None`. Keys the record has no field for are kept in
/// `attributes`.
pub fn hydrate(id: RecordId, mut payload: Payload) -> MemoryRecord {
    let text = take_string(&mut payload, payload_keys::TEXT);
    let image_reference = take_string(&mut payload, payload_keys::IMAGE_URL);
    let department = take_string(&mut payload, payload_keys::DEPARTMENT).unwrap_or_default();
    let date = take_string(&mut payload, payload_keys::DATE).unwrap_or_default();
    let outcome = take_string(&mut payload, payload_keys::OUTCOME).unwrap_or_default();
    let content_type = take_string(&mut payload, payload_keys::TYPE).unwrap_or_default();
    let location = take_string(&mut payload, payload_keys::LOCATION);
    let tags = take_tags(&mut payload);

    MemoryRecord {
        id,
        text,
        image_reference,
        department,
        date,
        outcome,
        content_type,
        location,
        tags,
        attributes: payload,
    }
}

fn take_string(payload: &mut Payload, key: &str) -> Option<String> {
    match payload.remove(key)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn take_tags(payload: &mut Payload) -> Option<Vec<String>> {
    match payload.remove(payload_keys::TAGS)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(tag) => Some(vec![tag]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_copies_known_fields() {
        let payload = json!({
            "text": "Budget review completed on time.",
            "department": "Finance",
            "date": "2024-01-01",
            "outcome": "success",
            "type": "text",
            "location": "HQ",
            "tags": ["budget"]
        });
        let record = hydrate(RecordId::new(1), payload.as_object().cloned().unwrap());

        assert_eq!(record.text.as_deref(), Some("Budget review completed on time."));
        assert_eq!(record.department, "Finance");
        assert_eq!(record.content_type, "text");
        assert_eq!(record.location.as_deref(), Some("HQ"));
        assert_eq!(record.tags, Some(vec!["budget".to_string()]));
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn test_missing_fields_get_safe_defaults() {
        let record = hydrate(RecordId::new(2), Payload::new());

        assert_eq!(record.department, "");
        assert_eq!(record.date, "");
        assert_eq!(record.outcome, "");
        assert_eq!(record.content_type, "");
        assert!(record.text.is_none());
        assert!(record.image_reference.is_none());
        assert!(record.location.is_none());
        assert!(record.tags.is_none());
    }

    #[test]
    fn test_unknown_keys_are_kept_as_attributes() {
        let payload = json!({"department": "Parks", "notes": "reviewed again", "confidence": "high"});
        let record = hydrate(RecordId::new(3), payload.as_object().cloned().unwrap());

        assert_eq!(record.attribute("notes"), Some(&json!("reviewed again")));
        assert_eq!(record.attribute("confidence"), Some(&json!("high")));
        assert!(record.attribute("department").is_none());
    }
}

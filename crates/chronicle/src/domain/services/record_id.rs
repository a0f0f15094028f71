//! Record id derivation
//!
//! Every ingest path derives its point id the same way: the first eight bytes
//! (big-endian) of SHA-256 over the embedded content followed by the metadata
//! serialized as canonical JSON. Identical content and metadata always land
//! on the same point, while any metadata change produces a new one. Updates
//! that must keep an id go through the update path instead of re-ingesting.

use sha2::{Digest, Sha256};

use crate::domain::entities::{Payload, RecordId};

/// Derive the stable id for `content` ingested with `metadata`.
///
/// `serde_json::Map` keeps keys sorted, so the serialized metadata does not
/// depend on insertion order.
pub fn derive_record_id(content: &str, metadata: &Payload) -> RecordId {
    let canonical = serde_json::Value::Object(metadata.clone()).to_string();

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    RecordId::new(u64::from_be_bytes(head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_identical_input_yields_identical_id() {
        let meta = metadata(json!({"department": "Finance", "date": "2024-01-01"}));
        assert_eq!(
            derive_record_id("Budget review completed on time.", &meta),
            derive_record_id("Budget review completed on time.", &meta)
        );
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let mut a = Payload::new();
        a.insert("department".into(), json!("Finance"));
        a.insert("outcome".into(), json!("success"));

        let mut b = Payload::new();
        b.insert("outcome".into(), json!("success"));
        b.insert("department".into(), json!("Finance"));

        assert_eq!(derive_record_id("x", &a), derive_record_id("x", &b));
    }

    #[test]
    fn test_metadata_change_yields_new_id() {
        let before = metadata(json!({"department": "Finance", "outcome": "success"}));
        let after = metadata(json!({"department": "Finance", "outcome": "failure"}));
        assert_ne!(
            derive_record_id("same text", &before),
            derive_record_id("same text", &after)
        );
    }

    #[test]
    fn test_content_change_yields_new_id() {
        let meta = metadata(json!({"department": "Finance"}));
        assert_ne!(derive_record_id("a", &meta), derive_record_id("b", &meta));
    }
}

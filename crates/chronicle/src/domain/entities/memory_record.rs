//! MemoryRecord - The persisted unit of institutional memory
//!
//! Pure domain entity without infrastructure dependencies.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ContentType;

/// JSON object stored next to each vector
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Payload keys with meaning to the pipeline
pub mod payload_keys {
    pub const TEXT: &str = "text";
    pub const IMAGE_URL: &str = "image_url";
    pub const IMAGE_PATH: &str = "image_path";
    pub const DEPARTMENT: &str = "department";
    pub const DATE: &str = "date";
    pub const OUTCOME: &str = "outcome";
    pub const TYPE: &str = "type";
    pub const LOCATION: &str = "location";
    pub const TAGS: &str = "tags";
    pub const ID: &str = "id";
    pub const SOURCE_ID: &str = "source_id";

    /// Keys hydrated into dedicated `MemoryRecord` fields
    pub const KNOWN: [&str; 8] = [
        TEXT, IMAGE_URL, DEPARTMENT, DATE, OUTCOME, TYPE, LOCATION, TAGS,
    ];
}

/// Stable point identifier (Qdrant numeric id space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(RecordId)
            .map_err(|_| format!("Invalid memory id: {}", s))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// MemoryRecord - one retrieved piece of institutional memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Path or URL of the image, stored under `image_url`
    #[serde(rename = "image_url", default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub outcome: String,
    /// Raw `type` tag; empty when the payload had none
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Every other payload key (notes, confidence, source, ...)
    #[serde(flatten)]
    pub attributes: Payload,
}

impl MemoryRecord {
    /// Parsed content type, if the tag is recognized
    pub fn kind(&self) -> Option<ContentType> {
        self.content_type.parse().ok()
    }

    pub fn is_image(&self) -> bool {
        self.kind() == Some(ContentType::Image)
    }

    /// Text content, or an `Image: <ref>` line when the record has no text
    pub fn content_line(&self) -> String {
        match (&self.text, &self.image_reference) {
            (Some(text), _) => text.clone(),
            (None, Some(image)) => format!("Image: {}", image),
            (None, None) => "(no content)".to_string(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_round_trips_through_string() {
        let id: RecordId = "18446744073709551615".parse().unwrap();
        assert_eq!(id.as_u64(), u64::MAX);
        assert_eq!(String::from(id), "18446744073709551615");
        assert!("abc".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_serializes_image_reference_as_image_url() {
        let record = MemoryRecord {
            id: RecordId::new(7),
            text: None,
            image_reference: Some("data/raw/images/map.png".into()),
            department: "Planning".into(),
            date: "2019-06-01".into(),
            outcome: "success".into(),
            content_type: "image".into(),
            location: None,
            tags: None,
            attributes: Payload::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["image_url"], "data/raw/images/map.png");
        assert_eq!(json["type"], "image");
        assert!(record.is_image());
        assert_eq!(record.content_line(), "Image: data/raw/images/map.png");
    }
}
